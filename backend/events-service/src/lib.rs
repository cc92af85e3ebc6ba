pub mod config;
pub mod error;
pub mod handlers;
pub mod kafka;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use models::*;

use kafka::LogClient;
use services::Clock;
use std::sync::Arc;

/// Shared state of the ingest handlers
///
/// Holds only shared handles; handlers keep no mutable state of their own.
#[derive(Clone)]
pub struct AppState {
    pub log: Arc<dyn LogClient>,
    pub clock: Arc<dyn Clock>,
    pub topic: String,
}

impl AppState {
    pub fn new(config: &Config, log: Arc<dyn LogClient>, clock: Arc<dyn Clock>) -> Self {
        Self {
            log,
            clock,
            topic: config.kafka_topic.clone(),
        }
    }
}
