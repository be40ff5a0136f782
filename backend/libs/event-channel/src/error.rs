//! Error types for the event channel

use thiserror::Error;

/// Result type for event channel operations
pub type EventResult<T> = Result<T, EventChannelError>;

#[derive(Error, Debug)]
pub enum EventChannelError {
    /// Payload could not be encoded to JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Broker client failure (connect, produce, fetch)
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// Broker refused or could not accept the operation
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    /// The underlying stream ended and will never yield again
    #[error("Subscription closed")]
    Closed,
}
