use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::core::events::DomainEvent;
use crate::core::library::LibraryError;
use crate::gateway::events::EventPublisher;

// MemoryPublisher keeps published events in process, for local runs and tests
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    events: RwLock<Vec<DomainEvent>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<DomainEvent> {
        self.events.read().await.clone()
    }

    pub async fn events_named(&self, name: &str) -> Vec<DomainEvent> {
        self.events.read().await.iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventPublisher for MemoryPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), LibraryError> {
        self.events.write().await.push(event.clone());
        Ok(())
    }
}
