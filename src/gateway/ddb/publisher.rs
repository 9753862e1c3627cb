use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use crate::core::events::DomainEvent;
use crate::core::library::LibraryError;
use crate::gateway::events::EventPublisher;
use crate::utils::ddb::parse_item;

// DDBPublisher appends events to a table that downstream analytics and mail jobs read
#[derive(Debug)]
pub struct DDBPublisher {
    client: Client,
    table_name: String,
}

impl DDBPublisher {
    pub fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }
}

#[async_trait]
impl EventPublisher for DDBPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), LibraryError> {
        let table_name: &str = self.table_name.as_ref();
        let val = serde_json::to_value(event)?;
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(event_id)")
            .set_item(Some(parse_item(val)?))
            .send()
            .await.map(|_| ()).map_err(LibraryError::from)
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use async_once::AsyncOnce;
    use aws_sdk_dynamodb::Client;
    use lazy_static::lazy_static;
    use crate::core::events::DomainEvent;
    use crate::core::repository::RepositoryStore;

    use crate::gateway::ddb::publisher::DDBPublisher;
    use crate::gateway::events::EventPublisher;
    use crate::utils::ddb::{build_db_client, create_table, delete_table};

    lazy_static! {
        static ref CLIENT: AsyncOnce<Client> = AsyncOnce::new(async {
                let client = build_db_client(RepositoryStore::LocalDynamoDB).await;
                let _ = delete_table(&client, "events").await;
                let _ = create_table(&client, "events", "event_id").await;
                client
            });
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB Local on localhost:8000"]
    async fn test_should_publish_to_ddb() {
        let event = DomainEvent::added("charge", "cdl", "work1",
                                       &HashMap::from([("netid".to_string(), "alice".to_string())]), &"item1").expect("build event");
        let publisher = DDBPublisher::new(CLIENT.get().await.clone(), "events");
        publisher.publish(&event).await.expect("should publish");
        assert!(publisher.publish(&event).await.is_err());
    }
}
