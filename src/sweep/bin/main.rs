use std::time::Duration;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};
use cdl::core::command::Command;
use cdl::core::domain::Configuration;
use cdl::sweep::command::process_holds_cmd::{ProcessHoldsCommand, ProcessHoldsCommandRequest};
use cdl::sweep::factory::create_sweep_service;
use cdl::utils::logs::setup_tracing;

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_tracing();

    let config = Configuration::load()?;
    info!(branch_id = config.branch_id.as_str(), store = ?config.store, "starting hold sweep");
    let command = ProcessHoldsCommand::new(create_sweep_service(&config, config.store).await?);

    if config.local_loop {
        let mut interval = tokio::time::interval(Duration::from_secs(config.sweep_interval_secs.max(1)));
        loop {
            interval.tick().await;
            if let Err(err) = command.execute(ProcessHoldsCommandRequest::new()).await {
                error!("hold sweep failed {:?}", err);
            }
        }
    }

    // a scheduled rule invokes the function; the event payload is ignored
    let command = &command;
    run(service_fn(move |_event: LambdaEvent<Value>| async move {
        let res = command.execute(ProcessHoldsCommandRequest::new()).await
            .map_err(|err| Error::from(format!("hold sweep failed {:?}", err)))?;
        Ok::<Value, Error>(serde_json::to_value(res.report)?)
    })).await
}
