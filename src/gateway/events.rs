use async_trait::async_trait;
use crate::core::events::DomainEvent;
use crate::core::library::LibraryError;

// group used for every lending analytics event
pub const CDL_EVENT_GROUP: &str = "cdl";

#[async_trait]
pub trait EventPublisher: Sync + Send {
    async fn publish(&self, event: &DomainEvent) -> Result<(), LibraryError>;
}
