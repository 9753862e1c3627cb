use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::charges::domain::ledger::HoldOutcome;
use crate::charges::domain::model::{ChargedItem, Hold};
use crate::charges::factory::ChargeManagerFactory;
use crate::core::command::{Command, CommandError};

pub struct CreateHoldCommand {
    factory: ChargeManagerFactory,
}

impl CreateHoldCommand {
    pub fn new(factory: ChargeManagerFactory) -> Self {
        Self {
            factory,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateHoldCommandRequest {
    resource_id: String,
    netid: String,
}

impl CreateHoldCommandRequest {
    pub fn new(resource_id: &str, netid: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            netid: netid.to_string(),
        }
    }
}

// either the loan granted straight away or the queued hold with its position
#[derive(Debug, Serialize)]
pub struct CreateHoldCommandResponse {
    pub charge: Option<ChargedItem>,
    pub hold: Option<Hold>,
    pub position: Option<usize>,
}

impl From<HoldOutcome> for CreateHoldCommandResponse {
    fn from(outcome: HoldOutcome) -> Self {
        match outcome {
            HoldOutcome::Charged(charge) => Self { charge: Some(charge), hold: None, position: None },
            HoldOutcome::Queued { hold, position } => Self { charge: None, hold: Some(hold), position: Some(position) },
        }
    }
}

#[async_trait]
impl Command<CreateHoldCommandRequest, CreateHoldCommandResponse> for CreateHoldCommand {
    async fn execute(&self, req: CreateHoldCommandRequest) -> Result<CreateHoldCommandResponse, CommandError> {
        if req.resource_id.is_empty() || req.netid.is_empty() {
            return Err(CommandError::validation("resource_id and netid are required"));
        }
        info!(resource_id = req.resource_id.as_str(), netid = req.netid.as_str(), "create hold");
        self.factory.create_charge_manager(req.resource_id.as_str())
            .create_hold(req.netid.as_str())
            .await.map_err(CommandError::from).map(CreateHoldCommandResponse::from)
    }
}
