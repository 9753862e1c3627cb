use async_trait::async_trait;
use crate::charges::domain::ledger::{HoldOutcome, LedgerSummary};
use crate::charges::domain::model::{ChargedItem, ResourceChargeList};
use crate::core::library::LibraryResult;

pub mod ledger;
pub mod model;
pub mod service;

// ChargeService coordinates the loans and holds of a single work
#[async_trait]
pub trait ChargeService: Sync + Send {
    fn resource_id(&self) -> &str;

    async fn eligible(&self) -> LibraryResult<bool>;

    async fn available_for_charge(&self, netid: &str) -> LibraryResult<bool>;

    async fn create_charge(&self, netid: &str) -> LibraryResult<ChargedItem>;

    async fn create_hold(&self, netid: &str) -> LibraryResult<HoldOutcome>;

    async fn activate_holds(&self) -> LibraryResult<LedgerSummary>;

    async fn expire_charges(&self) -> LibraryResult<LedgerSummary>;

    async fn return_charge(&self, netid: &str) -> LibraryResult<ChargedItem>;

    async fn charge_list(&self) -> LibraryResult<ResourceChargeList>;
}
