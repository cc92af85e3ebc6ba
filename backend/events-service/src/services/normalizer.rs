//! Event normalization
//!
//! Turns a raw request body into an [`Event`]: the body must decode to a
//! JSON object, which is then stamped with the route's `type` and the
//! capture time `ts`.

use crate::models::{Event, EventType};
use serde_json::Value;
use thiserror::Error;

/// Source of capture timestamps
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Body that does not decode to a JSON object
#[derive(Debug, Error)]
pub enum MalformedInput {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Decode `body` and stamp it as an event of `event_type`
pub fn normalize(
    body: &[u8],
    event_type: EventType,
    clock: &dyn Clock,
) -> Result<Event, MalformedInput> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(fields) => Ok(Event::stamped(fields, event_type, clock.now_millis())),
        other => Err(MalformedInput::NotAnObject(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
