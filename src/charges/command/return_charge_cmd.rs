use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::charges::domain::model::ChargedItem;
use crate::charges::factory::ChargeManagerFactory;
use crate::core::command::{Command, CommandError};

pub struct ReturnChargeCommand {
    factory: ChargeManagerFactory,
}

impl ReturnChargeCommand {
    pub fn new(factory: ChargeManagerFactory) -> Self {
        Self {
            factory,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReturnChargeCommandRequest {
    resource_id: String,
    netid: String,
}

impl ReturnChargeCommandRequest {
    pub fn new(resource_id: &str, netid: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            netid: netid.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReturnChargeCommandResponse {
    pub returned: ChargedItem,
}

impl ReturnChargeCommandResponse {
    pub fn new(returned: ChargedItem) -> Self {
        Self {
            returned,
        }
    }
}

#[async_trait]
impl Command<ReturnChargeCommandRequest, ReturnChargeCommandResponse> for ReturnChargeCommand {
    async fn execute(&self, req: ReturnChargeCommandRequest) -> Result<ReturnChargeCommandResponse, CommandError> {
        if req.resource_id.is_empty() || req.netid.is_empty() {
            return Err(CommandError::validation("resource_id and netid are required"));
        }
        info!(resource_id = req.resource_id.as_str(), netid = req.netid.as_str(), "return charge");
        self.factory.create_charge_manager(req.resource_id.as_str())
            .return_charge(req.netid.as_str())
            .await.map_err(CommandError::from).map(ReturnChargeCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use crate::charges::command::create_charge_cmd::{CreateChargeCommand, CreateChargeCommandRequest};
    use crate::charges::command::return_charge_cmd::{ReturnChargeCommand, ReturnChargeCommandRequest};
    use crate::charges::factory::memory_charge_manager_factory;
    use crate::core::command::{Command, CommandError};

    #[tokio::test]
    async fn test_should_run_return_charge() {
        let (factory, publisher) = memory_charge_manager_factory("work1", &["i1"]);
        let charge_cmd = CreateChargeCommand::new(factory.clone());
        let return_cmd = ReturnChargeCommand::new(factory);

        let res = return_cmd.execute(ReturnChargeCommandRequest::new("work1", "bob")).await;
        assert!(matches!(res, Err(CommandError::NotCharged { .. })));

        charge_cmd.execute(CreateChargeCommandRequest::new("work1", "bob")).await.expect("should charge");
        let res = return_cmd.execute(ReturnChargeCommandRequest::new("work1", "bob")).await.expect("should return");
        assert_eq!("bob", res.returned.netid.as_str());
        assert_eq!(1, publisher.events_named("charge_returned").await.len());
    }
}
