use std::collections::HashMap;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tokio::sync::RwLock;
use crate::charges::domain::model::ResourceChargeList;
use crate::charges::repository::ChargeListRepository;
use crate::core::domain::Identifiable;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;

// MemoryChargeListRepository keeps charge lists in process with the same version checks as DynamoDB
#[derive(Debug, Default)]
pub struct MemoryChargeListRepository {
    charge_lists: RwLock<HashMap<String, ResourceChargeList>>,
}

impl MemoryChargeListRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // resource ids sorted so that the last id of a page is the token of the next one
    fn paginate(mut records: Vec<ResourceChargeList>, page: Option<&str>,
                page_size: usize) -> PaginatedResult<ResourceChargeList> {
        records.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));
        let mut records: Vec<ResourceChargeList> = records.into_iter()
            .filter(|r| page.map_or(true, |last| r.resource_id.as_str() > last))
            .collect();
        let page_size = page_size.max(1);
        let next_page = if records.len() > page_size {
            records.truncate(page_size);
            records.last().map(|r| r.resource_id.to_string())
        } else {
            None
        };
        PaginatedResult::new(page, page_size, next_page, records)
    }
}

#[async_trait]
impl Repository<ResourceChargeList> for MemoryChargeListRepository {
    async fn create(&self, entity: &ResourceChargeList) -> LibraryResult<usize> {
        let mut charge_lists = self.charge_lists.write().await;
        if charge_lists.contains_key(&entity.id()) {
            return Err(LibraryError::version_conflict(
                format!("charge list {} already exists", entity.id()).as_str()));
        }
        charge_lists.insert(entity.id(), entity.clone());
        Ok(1)
    }

    async fn update(&self, entity: &ResourceChargeList) -> LibraryResult<usize> {
        let mut charge_lists = self.charge_lists.write().await;
        let stored_version = charge_lists.get(&entity.id()).map(Identifiable::version);
        if stored_version != Some(entity.version()) {
            return Err(LibraryError::version_conflict(
                format!("charge list {} version {} is stale, stored {:?}",
                        entity.id(), entity.version(), stored_version).as_str()));
        }
        let mut updated = entity.clone();
        updated.version = entity.version() + 1;
        updated.updated_at = Utc::now().naive_utc();
        charge_lists.insert(entity.id(), updated);
        Ok(1)
    }

    async fn get(&self, id: &str) -> LibraryResult<ResourceChargeList> {
        self.charge_lists.read().await.get(id).cloned().ok_or_else(||
            LibraryError::not_found(format!("charge list not found for {}", id).as_str()))
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<ResourceChargeList>> {
        let records = self.charge_lists.read().await.values()
            .filter(|c| predicate.get("netid").map_or(true, |netid| c.involves(netid)))
            .cloned()
            .collect();
        Ok(Self::paginate(records, page, page_size))
    }
}

#[async_trait]
impl ChargeListRepository for MemoryChargeListRepository {
    async fn query_sweepable(&self, now: NaiveDateTime,
                             page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<ResourceChargeList>> {
        let records = self.charge_lists.read().await.values()
            .filter(|c| c.needs_sweep(now))
            .cloned()
            .collect();
        Ok(Self::paginate(records, page, page_size))
    }
}
