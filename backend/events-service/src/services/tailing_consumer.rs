use crate::config::Config;
use crate::kafka::{LogClient, LogCursor, Record};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Downstream processing step for consumed records
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn process(&self, record: &Record) -> anyhow::Result<()>;
}

/// Sink that writes every consumed record to the log output
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

#[async_trait]
impl RecordSink for LoggingSink {
    async fn process(&self, record: &Record) -> anyhow::Result<()> {
        info!(
            topic = %record.topic,
            partition = record.partition,
            offset = record.offset,
            payload = %record.payload_str(),
            "consumed"
        );
        Ok(())
    }
}

/// Settings for the tailing consumer
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub topic: String,
    pub group: String,
    /// Fixed delay after a failed read or cursor open
    pub backoff: Duration,
}

impl ConsumerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            topic: config.kafka_topic.clone(),
            group: config.kafka_consumer_group.clone(),
            backoff: config.consumer_backoff(),
        }
    }
}

/// Counters reported when the consumer stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerStats {
    pub records: u64,
    pub read_errors: u64,
    pub open_failures: u64,
    pub backoffs: u64,
    pub sink_failures: u64,
    pub commit_failures: u64,
}

/// Background loop tailing the events topic under a consumer group
///
/// **States**:
/// - RUNNING: waiting for the next record, handing it to the sink
/// - BACKOFF: after a failed read, sleeping the fixed backoff before
///   reading again
///
/// Failures never end the loop; only the shutdown signal does. The signal
/// is observed while waiting for a record and while sleeping.
///
/// **Usage**:
/// ```rust,ignore
/// let consumer = TailingConsumer::new(&config, log, Arc::new(LoggingSink));
/// let (shutdown_tx, handle) = consumer.spawn();
///
/// // Later: shutdown
/// shutdown_tx.send(())?;
/// let stats = handle.await?;
/// ```
pub struct TailingConsumer {
    log: Arc<dyn LogClient>,
    sink: Arc<dyn RecordSink>,
    settings: ConsumerSettings,
}

impl TailingConsumer {
    pub fn new(config: &Config, log: Arc<dyn LogClient>, sink: Arc<dyn RecordSink>) -> Self {
        Self::with_settings(ConsumerSettings::from_config(config), log, sink)
    }

    pub fn with_settings(
        settings: ConsumerSettings,
        log: Arc<dyn LogClient>,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self {
            log,
            sink,
            settings,
        }
    }

    /// Spawn the consumer loop on the current runtime
    ///
    /// Sending on (or dropping) the returned sender stops the loop.
    pub fn spawn(self) -> (watch::Sender<()>, JoinHandle<ConsumerStats>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let handle = tokio::spawn(async move { self.run(shutdown_rx).await });
        (shutdown_tx, handle)
    }

    /// Run until `shutdown` fires
    pub async fn run(&self, mut shutdown: watch::Receiver<()>) -> ConsumerStats {
        let mut stats = ConsumerStats::default();

        info!(
            topic = %self.settings.topic,
            group = %self.settings.group,
            backoff_ms = self.settings.backoff.as_millis() as u64,
            "Tailing consumer started"
        );

        if let Some(mut cursor) = self.open_cursor(&mut shutdown, &mut stats).await {
            loop {
                let next = tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    next = cursor.next_record() => next,
                };

                match next {
                    Ok(record) => {
                        self.handle_record(cursor.as_mut(), &record, &mut stats)
                            .await;
                    }
                    Err(e) => {
                        stats.read_errors += 1;
                        error!(
                            topic = %self.settings.topic,
                            group = %self.settings.group,
                            error = %e,
                            "kafka read failed"
                        );
                        if !self.backoff(&mut shutdown, &mut stats).await {
                            break;
                        }
                    }
                }
            }
        }

        info!(?stats, "Tailing consumer stopped");
        stats
    }

    async fn open_cursor(
        &self,
        shutdown: &mut watch::Receiver<()>,
        stats: &mut ConsumerStats,
    ) -> Option<Box<dyn LogCursor>> {
        loop {
            match self
                .log
                .open_cursor(&self.settings.topic, &self.settings.group)
                .await
            {
                Ok(cursor) => return Some(cursor),
                Err(e) => {
                    stats.open_failures += 1;
                    error!(
                        topic = %self.settings.topic,
                        group = %self.settings.group,
                        error = %e,
                        "Failed to open consumer cursor"
                    );
                    if !self.backoff(shutdown, stats).await {
                        return None;
                    }
                }
            }
        }
    }

    async fn handle_record(
        &self,
        cursor: &mut dyn LogCursor,
        record: &Record,
        stats: &mut ConsumerStats,
    ) {
        stats.records += 1;

        if let Err(e) = self.sink.process(record).await {
            stats.sink_failures += 1;
            error!(
                topic = %record.topic,
                partition = record.partition,
                offset = record.offset,
                error = %e,
                "Record sink failed"
            );
        }

        match cursor.commit(record) {
            Ok(()) => debug!(
                partition = record.partition,
                offset = record.offset,
                "Stored consumer offset"
            ),
            Err(e) => {
                stats.commit_failures += 1;
                warn!(
                    partition = record.partition,
                    offset = record.offset,
                    error = %e,
                    "Failed to store consumer offset"
                );
            }
        }
    }

    /// Sleep the fixed backoff; `false` when shutdown fired meanwhile
    async fn backoff(&self, shutdown: &mut watch::Receiver<()>, stats: &mut ConsumerStats) -> bool {
        stats.backoffs += 1;
        tokio::select! {
            biased;
            _ = shutdown.changed() => false,
            _ = tokio::time::sleep(self.settings.backoff) => true,
        }
    }
}
