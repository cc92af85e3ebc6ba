use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Field stamped with the route's event type
pub const TYPE_FIELD: &str = "type";

/// Field stamped with the capture time in epoch milliseconds
pub const TS_FIELD: &str = "ts";

/// Kinds of domain events accepted by the ingress routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Movie,
    User,
    Payment,
}

impl EventType {
    /// Every accepted event type, in route registration order
    pub const ALL: [EventType; 3] = [EventType::Movie, EventType::User, EventType::Payment];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Movie => "movie",
            EventType::User => "user",
            EventType::Payment => "payment",
        }
    }

    /// HTTP path that ingests events of this type
    pub fn route(&self) -> String {
        format!("/api/events/{}", self.as_str())
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// Open-schema domain event
///
/// Caller fields are kept as-is; `type` and `ts` are always set by the
/// service and overwrite anything the caller sent under those names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    /// Stamp caller fields with the event type and capture timestamp
    pub fn stamped(mut fields: Map<String, Value>, event_type: EventType, ts_millis: i64) -> Self {
        fields.insert(TYPE_FIELD.to_string(), Value::from(event_type.as_str()));
        fields.insert(TS_FIELD.to_string(), Value::from(ts_millis));
        Self(fields)
    }

    pub fn event_type(&self) -> Option<EventType> {
        self.0
            .get(TYPE_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn timestamp_millis(&self) -> Option<i64> {
        self.0.get(TS_FIELD).and_then(Value::as_i64)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Wire form written to the log
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.0)
    }
}

/// A record read back from the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// Payload bytes exactly as appended
    pub payload: Vec<u8>,
}

impl Record {
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
