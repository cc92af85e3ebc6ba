//! Test doubles for the log client
//!
//! - `MemoryLog`: in-process log with per-group stored offsets
//! - `ScriptedLog`: hands out one scripted cursor, optionally after failed opens
//! - `ChannelSink` / `FailingSink`: record sinks for the tailing consumer

#![allow(dead_code)]

use async_trait::async_trait;
use events_service::kafka::{LogClient, LogCursor, LogError, Record};
use events_service::services::{Clock, RecordSink};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

#[derive(Default)]
struct MemoryLogInner {
    topics: HashMap<String, Vec<Vec<u8>>>,
    stored_offsets: HashMap<(String, String), i64>,
    append_calls: usize,
    fail_appends: bool,
}

/// In-memory single-partition log
#[derive(Clone, Default)]
pub struct MemoryLog {
    inner: Arc<Mutex<MemoryLogInner>>,
    appended: Arc<Notify>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log whose appends always fail
    pub fn unavailable() -> Self {
        let log = Self::default();
        log.inner.lock().unwrap().fail_appends = true;
        log
    }

    pub fn append_calls(&self) -> usize {
        self.inner.lock().unwrap().append_calls
    }

    pub fn records(&self, topic: &str) -> Vec<Vec<u8>> {
        self.inner
            .lock()
            .unwrap()
            .topics
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    pub fn stored_offset(&self, topic: &str, group: &str) -> Option<i64> {
        self.inner
            .lock()
            .unwrap()
            .stored_offsets
            .get(&(topic.to_string(), group.to_string()))
            .copied()
    }
}

#[async_trait]
impl LogClient for MemoryLog {
    async fn append(&self, topic: &str, payload: &[u8]) -> Result<(), LogError> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.append_calls += 1;
            if inner.fail_appends {
                return Err(LogError::Append {
                    topic: topic.to_string(),
                    reason: "Local: Broker transport failure".to_string(),
                });
            }
            inner
                .topics
                .entry(topic.to_string())
                .or_default()
                .push(payload.to_vec());
        }
        self.appended.notify_waiters();
        Ok(())
    }

    async fn open_cursor(
        &self,
        topic: &str,
        group: &str,
    ) -> Result<Box<dyn LogCursor>, LogError> {
        let next = self.stored_offset(topic, group).unwrap_or(0);
        Ok(Box::new(MemoryCursor {
            log: self.clone(),
            topic: topic.to_string(),
            group: group.to_string(),
            next,
        }))
    }
}

pub struct MemoryCursor {
    log: MemoryLog,
    topic: String,
    group: String,
    next: i64,
}

#[async_trait]
impl LogCursor for MemoryCursor {
    async fn next_record(&mut self) -> Result<Record, LogError> {
        let appended = Arc::clone(&self.log.appended);
        loop {
            // Registered before the check so an append in between is not missed.
            let notified = appended.notified();
            {
                let inner = self.log.inner.lock().unwrap();
                let found = inner
                    .topics
                    .get(&self.topic)
                    .and_then(|records| records.get(self.next as usize));
                if let Some(payload) = found {
                    let record = Record {
                        topic: self.topic.clone(),
                        partition: 0,
                        offset: self.next,
                        payload: payload.clone(),
                    };
                    self.next += 1;
                    return Ok(record);
                }
            }
            notified.await;
        }
    }

    fn commit(&mut self, record: &Record) -> Result<(), LogError> {
        self.log
            .inner
            .lock()
            .unwrap()
            .stored_offsets
            .insert((self.topic.clone(), self.group.clone()), record.offset + 1);
        Ok(())
    }
}

/// Cursor failing its first `failures` reads, then yielding `records`
///
/// Once the records run out it waits forever, like an idle topic.
pub struct ScriptedCursor {
    failures: usize,
    records: VecDeque<Record>,
    commits: Arc<Mutex<Vec<i64>>>,
}

#[async_trait]
impl LogCursor for ScriptedCursor {
    async fn next_record(&mut self) -> Result<Record, LogError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(LogError::Read("Local: All broker connections are down".into()));
        }
        match self.records.pop_front() {
            Some(record) => Ok(record),
            None => std::future::pending().await,
        }
    }

    fn commit(&mut self, record: &Record) -> Result<(), LogError> {
        self.commits.lock().unwrap().push(record.offset);
        Ok(())
    }
}

/// Log client handing out one [`ScriptedCursor`]
pub struct ScriptedLog {
    open_failures: AtomicUsize,
    cursor: Mutex<Option<ScriptedCursor>>,
    pub commits: Arc<Mutex<Vec<i64>>>,
}

impl ScriptedLog {
    pub fn new(read_failures: usize, records: Vec<Record>) -> Self {
        let commits = Arc::new(Mutex::new(Vec::new()));
        Self {
            open_failures: AtomicUsize::new(0),
            cursor: Mutex::new(Some(ScriptedCursor {
                failures: read_failures,
                records: records.into(),
                commits: Arc::clone(&commits),
            })),
            commits,
        }
    }

    /// Cursor whose reads never succeed
    pub fn always_failing() -> Self {
        Self::new(usize::MAX, Vec::new())
    }

    pub fn with_open_failures(self, failures: usize) -> Self {
        self.open_failures.store(failures, Ordering::SeqCst);
        self
    }

    pub fn committed(&self) -> Vec<i64> {
        self.commits.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogClient for ScriptedLog {
    async fn append(&self, topic: &str, _payload: &[u8]) -> Result<(), LogError> {
        Err(LogError::Append {
            topic: topic.to_string(),
            reason: "scripted log is read-only".into(),
        })
    }

    async fn open_cursor(
        &self,
        _topic: &str,
        _group: &str,
    ) -> Result<Box<dyn LogCursor>, LogError> {
        let remaining = self.open_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.open_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(LogError::Connection("Failed to resolve 'kafka:9092'".into()));
        }
        match self.cursor.lock().unwrap().take() {
            Some(cursor) => Ok(Box::new(cursor)),
            None => Err(LogError::Connection("cursor already opened".into())),
        }
    }
}

pub fn record(offset: i64, payload: &str) -> Record {
    Record {
        topic: "events".to_string(),
        partition: 0,
        offset,
        payload: payload.as_bytes().to_vec(),
    }
}

/// Sink forwarding every record to a channel
pub struct ChannelSink(pub mpsc::UnboundedSender<Record>);

impl ChannelSink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Record>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self(tx)), rx)
    }
}

#[async_trait]
impl RecordSink for ChannelSink {
    async fn process(&self, record: &Record) -> anyhow::Result<()> {
        self.0
            .send(record.clone())
            .map_err(|_| anyhow::anyhow!("receiver dropped"))
    }
}

/// Sink that rejects every record
pub struct FailingSink;

#[async_trait]
impl RecordSink for FailingSink {
    async fn process(&self, _record: &Record) -> anyhow::Result<()> {
        anyhow::bail!("downstream unavailable")
    }
}

/// Clock advancing one millisecond per reading
pub struct SteppingClock(AtomicI64);

impl SteppingClock {
    pub fn starting_at(millis: i64) -> Self {
        Self(AtomicI64::new(millis))
    }
}

impl Clock for SteppingClock {
    fn now_millis(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}
