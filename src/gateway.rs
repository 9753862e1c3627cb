pub mod ddb;
pub mod events;
pub mod factory;
pub mod memory;
pub mod notifier;
pub mod sns;

#[derive(Debug, PartialEq)]
pub enum GatewayPublisherVia {
    Sns,
    LocalDynamoDB,
    Memory,
}
