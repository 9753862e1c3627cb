use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::sweep::domain::{SweepReport, SweepService};

pub struct ProcessHoldsCommand {
    sweep_service: Box<dyn SweepService>,
}

impl ProcessHoldsCommand {
    pub fn new(sweep_service: Box<dyn SweepService>) -> Self {
        Self {
            sweep_service,
        }
    }
}

// the scheduled trigger carries no parameters
#[derive(Debug, Default, Deserialize)]
pub struct ProcessHoldsCommandRequest {}

impl ProcessHoldsCommandRequest {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessHoldsCommandResponse {
    pub report: SweepReport,
}

impl ProcessHoldsCommandResponse {
    pub fn new(report: SweepReport) -> Self {
        Self {
            report,
        }
    }
}

#[async_trait]
impl Command<ProcessHoldsCommandRequest, ProcessHoldsCommandResponse> for ProcessHoldsCommand {
    async fn execute(&self, _req: ProcessHoldsCommandRequest) -> Result<ProcessHoldsCommandResponse, CommandError> {
        self.sweep_service.process()
            .await.map_err(CommandError::from).map(ProcessHoldsCommandResponse::new)
    }
}
