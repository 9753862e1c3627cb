use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::events::DomainEvent;
use crate::core::library::{LibraryError, LibraryResult};
use crate::gateway::events::{CDL_EVENT_GROUP, EventPublisher};

pub const NOTIFICATION_EVENT: &str = "patron_notification";

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    HoldActivated,
    HoldExpired,
}

impl Display for NotificationTemplate {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            NotificationTemplate::HoldActivated => write!(f, "hold_activated"),
            NotificationTemplate::HoldExpired => write!(f, "hold_expired"),
        }
    }
}

// Notifier delivers patron-facing messages; failures are reported but never undo a ledger change
#[async_trait]
pub trait Notifier: Sync + Send {
    async fn deliver(&self, netid: &str, template: NotificationTemplate, resource_id: &str) -> LibraryResult<()>;
}

// EventNotifier hands notifications to the mail system as published events
pub struct EventNotifier {
    events_publisher: Arc<dyn EventPublisher>,
}

impl EventNotifier {
    pub fn new(events_publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            events_publisher,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub netid: String,
    pub template: NotificationTemplate,
    pub resource_id: String,
}

#[async_trait]
impl Notifier for EventNotifier {
    async fn deliver(&self, netid: &str, template: NotificationTemplate, resource_id: &str) -> LibraryResult<()> {
        if netid.is_empty() {
            return Err(LibraryError::validation("cannot notify an empty netid", None));
        }
        let notification = Notification {
            netid: netid.to_string(),
            template,
            resource_id: resource_id.to_string(),
        };
        let metadata = HashMap::from([
            ("netid".to_string(), netid.to_string()),
            ("template".to_string(), template.to_string()),
        ]);
        let event = DomainEvent::added(NOTIFICATION_EVENT, CDL_EVENT_GROUP, resource_id, &metadata, &notification)?;
        self.events_publisher.publish(&event).await
    }
}
