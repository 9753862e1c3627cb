use async_trait::async_trait;
use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::gateway::GatewayPublisherVia;

#[async_trait]
pub trait Repository<Entity>: Sync + Send {
    // create an entity, failing with a version conflict when it already exists
    async fn create(&self, entity: &Entity) -> LibraryResult<usize>;

    // updates an entity when the stored version still matches the entity version
    async fn update(&self, entity: &Entity) -> LibraryResult<usize>;

    // get an entity
    async fn get(&self, id: &str) -> LibraryResult<Entity>;

    // find by predicate
    async fn query(&self, predicate: &HashMap::<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<Entity>>;
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy)]
pub enum RepositoryStore {
    DynamoDB,
    LocalDynamoDB,
    Memory,
}

impl RepositoryStore {
    pub fn gateway_publisher(&self) -> GatewayPublisherVia {
        match self {
            RepositoryStore::DynamoDB => { GatewayPublisherVia::Sns }
            RepositoryStore::LocalDynamoDB => { GatewayPublisherVia::LocalDynamoDB }
            RepositoryStore::Memory => { GatewayPublisherVia::Memory }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::repository::RepositoryStore;
    use crate::gateway::GatewayPublisherVia;

    #[tokio::test]
    async fn test_should_map_store_to_publisher() {
        assert_eq!(GatewayPublisherVia::Sns, RepositoryStore::DynamoDB.gateway_publisher());
        assert_eq!(GatewayPublisherVia::LocalDynamoDB, RepositoryStore::LocalDynamoDB.gateway_publisher());
        assert_eq!(GatewayPublisherVia::Memory, RepositoryStore::Memory.gateway_publisher());
    }
}
