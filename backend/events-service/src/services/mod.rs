pub mod normalizer;
pub mod tailing_consumer;

pub use normalizer::{normalize, Clock, FixedClock, MalformedInput, SystemClock};
pub use tailing_consumer::{
    ConsumerSettings, ConsumerStats, LoggingSink, RecordSink, TailingConsumer,
};
