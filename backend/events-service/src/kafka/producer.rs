//! Kafka-backed log client
//!
//! One long-lived `FutureProducer` serves every request handler; cursors are
//! created on demand as `StreamConsumer`s.

use super::consumer::KafkaCursor;
use super::{LogClient, LogCursor, LogError};
use crate::config::Config;
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::{debug, info};

/// Kafka log client
pub struct KafkaLogClient {
    producer: FutureProducer,
    brokers: String,
    queue_timeout: Duration,
}

impl KafkaLogClient {
    /// Create the producer side of the client
    ///
    /// Configuration:
    /// - `enable.idempotence = true` and `acks = all`: a retried batch is not
    ///   duplicated by librdkafka's own resends
    /// - `message.timeout.ms` bounds how long an append may wait for the
    ///   broker before it is reported as failed
    pub fn new(config: &Config) -> Result<Self, LogError> {
        let message_timeout_ms = config.kafka_message_timeout_ms.to_string();

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_brokers)
            .set("message.timeout.ms", &message_timeout_ms)
            .set("request.timeout.ms", &message_timeout_ms)
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("max.in.flight.requests.per.connection", "5")
            .set("compression.type", "lz4")
            .set("linger.ms", "10")
            .create()
            .map_err(|e| LogError::Connection(e.to_string()))?;

        info!(
            brokers = %config.kafka_brokers,
            "Kafka producer created with idempotency enabled"
        );

        Ok(Self {
            producer,
            brokers: config.kafka_brokers.clone(),
            queue_timeout: config.message_timeout(),
        })
    }

    pub fn brokers(&self) -> &str {
        &self.brokers
    }
}

#[async_trait]
impl LogClient for KafkaLogClient {
    async fn append(&self, topic: &str, payload: &[u8]) -> Result<(), LogError> {
        // No key: the default partitioner spreads events across partitions.
        let record: FutureRecord<'_, (), [u8]> = FutureRecord::to(topic).payload(payload);

        match self.producer.send(record, self.queue_timeout).await {
            Ok((partition, offset)) => {
                debug!(
                    topic = %topic,
                    partition = partition,
                    offset = offset,
                    "Appended record"
                );
                Ok(())
            }
            Err((err, _)) => Err(LogError::Append {
                topic: topic.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    async fn open_cursor(
        &self,
        topic: &str,
        group: &str,
    ) -> Result<Box<dyn LogCursor>, LogError> {
        let cursor = KafkaCursor::subscribe(&self.brokers, topic, group)?;
        Ok(Box::new(cursor))
    }
}
