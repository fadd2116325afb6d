// src/rabbitmq/errors.rs

use thiserror::Error;

/// Fatal failures while talking to the broker.
///
/// None of these are retried: the producer has no reconnect policy, so the
/// first broker-level failure terminates the run after resources are
/// released.
#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("broker connection error: {0}")]
    Connection(String),

    #[error("exchange declaration error: {0}")]
    Declaration(String),

    #[error("publisher confirms unavailable: {0}")]
    Capability(String),

    #[error("publish error: {0}")]
    Publish(String),
}

// Custom Result type for producer operations
pub type Result<T> = std::result::Result<T, ProducerError>;
