use std::collections::HashMap;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::charges::domain::model::ResourceChargeList;
use crate::charges::factory::ChargeManagerFactory;
use crate::core::command::{Command, CommandError};
use crate::core::repository::Repository;

// PatronChargesCommand lists the charge lists a patron takes part in, one page at a time
pub struct PatronChargesCommand {
    factory: ChargeManagerFactory,
}

impl PatronChargesCommand {
    pub fn new(factory: ChargeManagerFactory) -> Self {
        Self {
            factory,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PatronChargesCommandRequest {
    netid: String,
    page: Option<String>,
}

impl PatronChargesCommandRequest {
    pub fn new(netid: &str, page: Option<&str>) -> Self {
        Self {
            netid: netid.to_string(),
            page: page.map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PatronChargesCommandResponse {
    pub charge_lists: Vec<ResourceChargeList>,
    pub next_page: Option<String>,
}

#[async_trait]
impl Command<PatronChargesCommandRequest, PatronChargesCommandResponse> for PatronChargesCommand {
    async fn execute(&self, req: PatronChargesCommandRequest) -> Result<PatronChargesCommandResponse, CommandError> {
        if req.netid.is_empty() {
            return Err(CommandError::validation("netid is required"));
        }
        info!(netid = req.netid.as_str(), page = req.page.as_deref(), "patron charges");
        let predicate = HashMap::from([("netid".to_string(), req.netid.to_string())]);
        let res = self.factory.charge_list_repository()
            .query(&predicate, req.page.as_deref(), self.factory.config().sweep_page_size)
            .await.map_err(CommandError::from)?;
        let now = Utc::now().naive_utc();
        // a hold that lapsed since the last write no longer ties the patron to the work
        let charge_lists = res.records.iter()
            .map(|c| c.lazily_expired(now))
            .filter(|c| c.involves(req.netid.as_str()))
            .collect();
        Ok(PatronChargesCommandResponse {
            charge_lists,
            next_page: res.next_page,
        })
    }
}
