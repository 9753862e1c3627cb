use std::collections::HashMap;
use async_trait::async_trait;
use crate::core::library::LibraryResult;
use crate::items::{dedupe_item_ids, EligibleItemService};

// StaticItemService serves a fixed map of work -> item ids, for local runs and tests
#[derive(Debug, Default)]
pub struct StaticItemService {
    items: HashMap<String, Vec<String>>,
}

impl StaticItemService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(resource_id: &str, item_ids: &[&str]) -> Self {
        let items = HashMap::from([(resource_id.to_string(),
                                    item_ids.iter().map(|id| id.to_string()).collect())]);
        Self {
            items,
        }
    }
}

#[async_trait]
impl EligibleItemService for StaticItemService {
    async fn item_ids(&self, resource_id: &str) -> LibraryResult<Vec<String>> {
        let ids = self.items.get(resource_id).cloned().unwrap_or_default();
        Ok(dedupe_item_ids(ids))
    }
}
