use std::sync::Arc;
use tracing::warn;
use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;
use crate::gateway::ddb::publisher::DDBPublisher;
use crate::gateway::events::EventPublisher;
use crate::gateway::GatewayPublisherVia;
use crate::gateway::memory::publisher::MemoryPublisher;
use crate::gateway::notifier::{EventNotifier, Notifier};
use crate::gateway::sns::publisher::SNSPublisher;
use crate::utils::ddb::{build_db_client, build_sns_client, create_table};

pub async fn create_publisher(config: &Configuration, via: GatewayPublisherVia) -> Arc<dyn EventPublisher> {
    match via {
        GatewayPublisherVia::Sns => {
            if let Some(topic_arn) = config.topic_arn.as_deref() {
                let client = build_sns_client().await;
                return Arc::new(SNSPublisher::new(client, topic_arn));
            }
            warn!("no topic configured, publishing events to {}", config.events_table);
            let client = build_db_client(RepositoryStore::DynamoDB).await;
            Arc::new(DDBPublisher::new(client, config.events_table.as_str()))
        }
        GatewayPublisherVia::LocalDynamoDB => {
            let client = build_db_client(RepositoryStore::LocalDynamoDB).await;
            let _ = create_table(&client, config.events_table.as_str(), "event_id").await;
            Arc::new(DDBPublisher::new(client, config.events_table.as_str()))
        }
        GatewayPublisherVia::Memory => {
            Arc::new(MemoryPublisher::new())
        }
    }
}

pub fn create_notifier(events_publisher: Arc<dyn EventPublisher>) -> Arc<dyn Notifier> {
    Arc::new(EventNotifier::new(events_publisher))
}
