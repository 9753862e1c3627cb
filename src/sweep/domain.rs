use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::charges::domain::ledger::LedgerSummary;
use crate::core::library::LibraryResult;

pub mod service;

// SweepReport tallies one pass over every ledger with pending work
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub expired_charges: usize,
    pub expired_holds: usize,
    pub activated_holds: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn record(&mut self, summary: &LedgerSummary) {
        self.expired_charges += summary.expired_charges;
        self.expired_holds += summary.expired_holds;
        self.activated_holds += summary.activated_holds;
    }
}

#[async_trait]
pub trait SweepService: Sync + Send {
    async fn process(&self) -> LibraryResult<SweepReport>;
}
