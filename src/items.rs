use async_trait::async_trait;
use crate::core::library::LibraryResult;

pub mod factory;
pub mod http_item_service;
pub mod static_item_service;

// EligibleItemService answers which item ids of a work are licensed for digital lending.
// An empty answer means "not eligible"; a lookup failure must surface as an error.
#[async_trait]
pub trait EligibleItemService: Sync + Send {
    async fn item_ids(&self, resource_id: &str) -> LibraryResult<Vec<String>>;
}

// keeps the first occurrence of every id, in catalog order
pub(crate) fn dedupe_item_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
