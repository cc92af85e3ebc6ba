//! Configuration for events service
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Service configuration, loaded once from environment variables
///
/// Built at startup and handed by reference to every component constructor.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Kafka bootstrap servers (comma-separated)
    #[serde(default = "default_kafka_brokers")]
    pub kafka_brokers: String,

    /// Topic used for both production and consumption
    #[serde(default = "default_kafka_topic")]
    pub kafka_topic: String,

    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP bind host
    #[serde(default = "default_http_host")]
    pub http_host: String,

    /// Consumer group of the tailing consumer
    #[serde(default = "default_consumer_group")]
    pub kafka_consumer_group: String,

    /// Producer delivery timeout in milliseconds
    #[serde(default = "default_message_timeout_ms")]
    pub kafka_message_timeout_ms: u64,

    /// Fixed delay between failed reads, in milliseconds
    #[serde(default = "default_consumer_backoff_ms")]
    pub consumer_backoff_ms: u64,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_event_bytes")]
    pub max_event_bytes: usize,
}

fn default_kafka_brokers() -> String {
    "kafka:9092".to_string()
}

fn default_kafka_topic() -> String {
    "events".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_consumer_group() -> String {
    "events-consumer".to_string()
}

fn default_message_timeout_ms() -> u64 {
    30_000
}

fn default_consumer_backoff_ms() -> u64 {
    1_000
}

fn default_max_event_bytes() -> usize {
    1024 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kafka_brokers: default_kafka_brokers(),
            kafka_topic: default_kafka_topic(),
            port: default_port(),
            http_host: default_http_host(),
            kafka_consumer_group: default_consumer_group(),
            kafka_message_timeout_ms: default_message_timeout_ms(),
            consumer_backoff_ms: default_consumer_backoff_ms(),
            max_event_bytes: default_max_event_bytes(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::vars_os()
                .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?))),
        )
    }

    /// Load configuration from `(NAME, value)` pairs
    ///
    /// Empty values count as unset and fall back to their defaults.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config =
            envy::from_iter(vars.into_iter().filter(|(_, value)| !value.trim().is_empty()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kafka_brokers.split(',').all(|b| b.trim().is_empty()) {
            return Err(ConfigError::Invalid("KAFKA_BROKERS is empty".into()));
        }
        if self.kafka_topic.trim().is_empty() {
            return Err(ConfigError::Invalid("KAFKA_TOPIC is empty".into()));
        }
        if self.kafka_consumer_group.trim().is_empty() {
            return Err(ConfigError::Invalid("KAFKA_CONSUMER_GROUP is empty".into()));
        }
        if self.consumer_backoff_ms == 0 {
            return Err(ConfigError::Invalid(
                "CONSUMER_BACKOFF_MS must be greater than 0".into(),
            ));
        }
        if self.max_event_bytes == 0 {
            return Err(ConfigError::Invalid(
                "MAX_EVENT_BYTES must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.port)
    }

    pub fn consumer_backoff(&self) -> Duration {
        Duration::from_millis(self.consumer_backoff_ms)
    }

    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.kafka_message_timeout_ms)
    }

    pub fn log_config(&self) {
        info!(
            brokers = %self.kafka_brokers,
            topic = %self.kafka_topic,
            group = %self.kafka_consumer_group,
            bind = %self.bind_address(),
            backoff_ms = self.consumer_backoff_ms,
            "Loaded configuration"
        );
    }
}
