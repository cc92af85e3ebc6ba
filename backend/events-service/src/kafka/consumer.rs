use super::{LogCursor, LogError, Record};
use async_trait::async_trait;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::ClientConfig;
use tracing::info;

/// Consumer-group cursor over one Kafka topic
///
/// Offsets are stored only through [`LogCursor::commit`] and flushed by the
/// auto-commit timer, so a record handed out but never committed is read
/// again after a restart.
pub struct KafkaCursor {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaCursor {
    pub fn subscribe(brokers: &str, topic: &str, group: &str) -> Result<Self, LogError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group)
            .set("enable.auto.commit", "true")
            .set("auto.commit.interval.ms", "5000")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "30000")
            .set("enable.partition.eof", "false")
            .set("fetch.min.bytes", "1000")
            .set("fetch.max.bytes", "1000000")
            .create()
            .map_err(|e| LogError::Connection(e.to_string()))?;

        consumer
            .subscribe(&[topic])
            .map_err(|e| LogError::Connection(e.to_string()))?;

        info!(
            topic = %topic,
            group = %group,
            "Kafka consumer subscribed"
        );

        Ok(Self {
            consumer,
            topic: topic.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl LogCursor for KafkaCursor {
    async fn next_record(&mut self) -> Result<Record, LogError> {
        let message = self
            .consumer
            .recv()
            .await
            .map_err(|e| LogError::Read(e.to_string()))?;

        Ok(Record {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        })
    }

    fn commit(&mut self, record: &Record) -> Result<(), LogError> {
        // Kafka stores the next offset to read, not the last one processed.
        self.consumer
            .store_offset(&record.topic, record.partition, record.offset + 1)
            .map_err(|e| LogError::Commit(e.to_string()))
    }
}
