//! Log client integration
//!
//! The service talks to the log only through [`LogClient`] and
//! [`LogCursor`]:
//! - `append`: write one opaque record to a topic
//! - `open_cursor`: tail a topic under a consumer group whose position is
//!   owned by the log, so a restart resumes from the last stored offset
//!
//! [`KafkaLogClient`] is the production implementation on top of rdkafka.

use async_trait::async_trait;
use thiserror::Error;

pub mod consumer;
pub mod producer;

pub use crate::models::Record;
pub use consumer::KafkaCursor;
pub use producer::KafkaLogClient;

/// Log client error types
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Kafka client setup failed: {0}")]
    Connection(String),

    #[error("append to topic {topic} failed: {reason}")]
    Append { topic: String, reason: String },

    #[error("read failed: {0}")]
    Read(String),

    #[error("offset store failed: {0}")]
    Commit(String),
}

/// Append-only, partitioned log shared by producers and consumers
#[async_trait]
pub trait LogClient: Send + Sync {
    /// Append one record; resolves once the log acknowledged it
    ///
    /// Dropping the returned future abandons the delivery wait.
    async fn append(&self, topic: &str, payload: &[u8]) -> Result<(), LogError>;

    /// Open a cursor on `topic` positioned at the group's stored offset
    async fn open_cursor(&self, topic: &str, group: &str)
        -> Result<Box<dyn LogCursor>, LogError>;
}

/// Read position of one consumer group in one topic
#[async_trait]
pub trait LogCursor: Send {
    /// Wait for the next record
    async fn next_record(&mut self) -> Result<Record, LogError>;

    /// Mark `record` processed so the group resumes after it
    fn commit(&mut self, record: &Record) -> Result<(), LogError>;
}
