use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::charges::domain::model::ChargedItem;
use crate::charges::factory::ChargeManagerFactory;
use crate::core::command::{Command, CommandError};

pub struct CreateChargeCommand {
    factory: ChargeManagerFactory,
}

impl CreateChargeCommand {
    pub fn new(factory: ChargeManagerFactory) -> Self {
        Self {
            factory,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateChargeCommandRequest {
    resource_id: String,
    netid: String,
}

impl CreateChargeCommandRequest {
    pub fn new(resource_id: &str, netid: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            netid: netid.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateChargeCommandResponse {
    pub charge: ChargedItem,
}

impl CreateChargeCommandResponse {
    pub fn new(charge: ChargedItem) -> Self {
        Self {
            charge,
        }
    }
}

#[async_trait]
impl Command<CreateChargeCommandRequest, CreateChargeCommandResponse> for CreateChargeCommand {
    async fn execute(&self, req: CreateChargeCommandRequest) -> Result<CreateChargeCommandResponse, CommandError> {
        if req.resource_id.is_empty() || req.netid.is_empty() {
            return Err(CommandError::validation("resource_id and netid are required"));
        }
        info!(resource_id = req.resource_id.as_str(), netid = req.netid.as_str(), "create charge");
        self.factory.create_charge_manager(req.resource_id.as_str())
            .create_charge(req.netid.as_str())
            .await.map_err(CommandError::from).map(CreateChargeCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use crate::charges::command::create_charge_cmd::{CreateChargeCommand, CreateChargeCommandRequest};
    use crate::charges::factory::memory_charge_manager_factory;
    use crate::core::command::{Command, CommandError};

    #[tokio::test]
    async fn test_should_run_create_charge() {
        let (factory, publisher) = memory_charge_manager_factory("work1", &["i1"]);
        let cmd = CreateChargeCommand::new(factory);
        let res = cmd.execute(CreateChargeCommandRequest::new("work1", "alice")).await.expect("should charge");
        assert_eq!("alice", res.charge.netid.as_str());
        assert_eq!("i1", res.charge.item_id.as_str());
        assert_eq!(1, publisher.events_named("charge").await.len());

        let res = cmd.execute(CreateChargeCommandRequest::new("work1", "bob")).await;
        assert!(matches!(res, Err(CommandError::UnavailableForCharge { .. })));
    }

    #[tokio::test]
    async fn test_should_validate_create_charge() {
        let (factory, _) = memory_charge_manager_factory("work1", &["i1"]);
        let cmd = CreateChargeCommand::new(factory);
        let res = cmd.execute(CreateChargeCommandRequest::new("work1", "")).await;
        assert!(matches!(res, Err(CommandError::Validation { .. })));
    }
}
