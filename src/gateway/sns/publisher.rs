use async_trait::async_trait;
use aws_sdk_sns::Client;
use aws_sdk_sns::error::SdkError;
use aws_sdk_sns::operation::publish::PublishError;
use aws_sdk_sns::types::MessageAttributeValue;
use tracing::debug;
use crate::core::events::DomainEvent;
use crate::core::library::LibraryError;
use crate::gateway::events::EventPublisher;

// SNSPublisher fans every event out through one topic; subscribers filter on the `name` attribute
#[derive(Debug)]
pub struct SNSPublisher {
    client: Client,
    topic_arn: String,
}

impl SNSPublisher {
    pub fn new(client: Client, topic_arn: &str) -> Self {
        Self {
            client,
            topic_arn: topic_arn.to_string(),
        }
    }
}

#[async_trait]
impl EventPublisher for SNSPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), LibraryError> {
        let json = serde_json::to_string(event)?;
        let name = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(event.name.as_str())
            .build();
        self.client.publish()
            .topic_arn(self.topic_arn.as_str())
            .message(json)
            .message_attributes("name", name)
            .send().await?;
        debug!(event_id = event.event_id.as_str(), name = event.name.as_str(), "published event");
        Ok(())
    }
}

impl From<SdkError<PublishError>> for LibraryError {
    fn from(err: SdkError<PublishError>) -> Self {
        LibraryError::runtime(format!("{:?}", err).as_str(), None)
    }
}
