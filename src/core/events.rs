use std::collections::HashMap;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::utils::date::serializer;

// DomainEventType defines type of event for ledger changes
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum DomainEventType {
    Added,
    Updated,
    Deleted,
}

// DomainEvent abstracts an analytics or notification event emitted after a ledger change
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub event_id: String,
    pub name: String,
    pub group: String,
    pub key: String,
    pub kind: DomainEventType,
    pub metadata: HashMap<String, String>,
    pub json_data: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
}

impl DomainEvent {
    pub fn added<T: Serialize>(name: &str, group: &str, key: &str, metadata: &HashMap<String, String>, data: &T) -> serde_json::Result<Self> {
        Self::new(name, group, key, DomainEventType::Added, metadata, data)
    }

    pub fn updated<T: Serialize>(name: &str, group: &str, key: &str, metadata: &HashMap<String, String>, data: &T) -> serde_json::Result<Self> {
        Self::new(name, group, key, DomainEventType::Updated, metadata, data)
    }

    pub fn deleted<T: Serialize>(name: &str, group: &str, key: &str, metadata: &HashMap<String, String>, data: &T) -> serde_json::Result<Self> {
        Self::new(name, group, key, DomainEventType::Deleted, metadata, data)
    }

    pub fn new<T: Serialize>(name: &str, group: &str, key: &str, kind: DomainEventType,
                             metadata: &HashMap<String, String>, data: &T) -> serde_json::Result<Self> {
        let json = serde_json::to_string(&data)?;
        Ok(DomainEvent {
            event_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            group: group.to_string(),
            key: key.to_string(),
            kind,
            metadata: metadata.clone(),
            json_data: json,
            created_at: Utc::now().naive_utc(),
        })
    }

    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use crate::core::events::{DomainEvent, DomainEventType};

    #[tokio::test]
    async fn test_should_build_added() {
        let data = HashMap::from([("a", 1), ("b", 2)]);
        let event = DomainEvent::added("charge", "cdl", "work1", &HashMap::from([("netid".to_string(), "alice".to_string())]), &data).expect("build event");
        assert_eq!("charge", event.name.as_str());
        assert_eq!("work1", event.key.as_str());
        assert_eq!(Some("alice"), event.metadata_value("netid"));
        assert_eq!(DomainEventType::Added, event.kind);
    }

    #[tokio::test]
    async fn test_should_build_updated() {
        let event = DomainEvent::updated("hold_activated", "cdl", "work1", &HashMap::new(), &"alice").expect("build event");
        assert_eq!(DomainEventType::Updated, event.kind);
        assert_eq!("\"alice\"", event.json_data.as_str());
    }

    #[tokio::test]
    async fn test_should_round_trip_event_json() {
        let event = DomainEvent::deleted("charge_returned", "cdl", "work1", &HashMap::new(), &vec![1, 2]).expect("build event");
        let json = serde_json::to_string(&event).expect("should serialize");
        let parsed: DomainEvent = serde_json::from_str(&json).expect("should parse");
        assert_eq!(event, parsed);
    }
}
