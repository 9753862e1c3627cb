use chrono::Duration;
use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use crate::core::library::LibraryResult;
use crate::core::repository::RepositoryStore;

// Identifiable defines common traits that can be shared by persistent objects
pub trait Identifiable : Sync + Send {
    fn id(&self) -> String;
    fn version(&self) -> i64;
}

// Configuration abstracts config options for the lending system
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Configuration {
    pub branch_id: String,
    pub store: RepositoryStore,
    pub charge_minutes: i64,
    pub hold_activation_minutes: i64,
    pub max_conflict_retries: usize,
    pub sweep_page_size: usize,
    pub sweep_interval_secs: u64,
    pub local_loop: bool,
    pub catalog_url: Option<String>,
    pub catalog_timeout_secs: u64,
    pub charge_list_table: String,
    pub events_table: String,
    pub topic_arn: Option<String>,
}

impl Configuration {
    pub fn new(branch_id: &str) -> Self {
        Configuration {
            branch_id: branch_id.to_string(),
            store: RepositoryStore::DynamoDB,
            charge_minutes: 180,
            hold_activation_minutes: 60,
            max_conflict_retries: 5,
            sweep_page_size: 100,
            sweep_interval_secs: 300,
            local_loop: false,
            catalog_url: None,
            catalog_timeout_secs: 10,
            charge_list_table: "resource_charge_list".to_string(),
            events_table: "events".to_string(),
            topic_arn: None,
        }
    }

    // defaults overlaid with CDL_* environment variables, e.g. CDL_CHARGE_MINUTES=120
    pub fn load() -> LibraryResult<Self> {
        let config = Config::builder()
            .add_source(Config::try_from(&Configuration::new("default"))?)
            .add_source(Environment::with_prefix("CDL").try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn loan_policy(&self) -> LoanPolicy {
        LoanPolicy {
            charge_duration: Duration::minutes(self.charge_minutes),
            hold_duration: Duration::minutes(self.hold_activation_minutes),
        }
    }
}

// LoanPolicy carries the windows granted to a new charge and a newly activated hold
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct LoanPolicy {
    pub charge_duration: Duration,
    pub hold_duration: Duration,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Configuration::new("default").loan_policy()
    }
}
