use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use events_service::handlers;
use events_service::kafka::{KafkaLogClient, LogClient};
use events_service::services::{LoggingSink, SystemClock, TailingConsumer};
use events_service::{AppState, Config};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONSUMER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,events_service=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("Starting events-service");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.log_config();

    let log: Arc<dyn LogClient> =
        Arc::new(KafkaLogClient::new(&config).context("Failed to create Kafka client")?);

    // Tailing consumer runs for the lifetime of the HTTP server
    let consumer = TailingConsumer::new(&config, Arc::clone(&log), Arc::new(LoggingSink));
    let (shutdown_tx, consumer_handle) = consumer.spawn();

    let state = web::Data::new(AppState::new(&config, log, Arc::new(SystemClock)));
    let max_event_bytes = config.max_event_bytes;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_event_bytes))
            .configure(handlers::configure)
    })
    .bind((config.http_host.as_str(), config.port))
    .with_context(|| format!("Failed to bind HTTP listener on {}", config.bind_address()))?;

    tracing::info!(
        bind = %config.bind_address(),
        brokers = %config.kafka_brokers,
        topic = %config.kafka_topic,
        "events-service listening"
    );

    let served = server.run().await;

    tracing::info!("HTTP server stopped, stopping tailing consumer");
    let _ = shutdown_tx.send(());
    match tokio::time::timeout(CONSUMER_STOP_TIMEOUT, consumer_handle).await {
        Ok(Ok(stats)) => tracing::info!(?stats, "Tailing consumer finished"),
        Ok(Err(e)) => tracing::error!(error = %e, "Tailing consumer task failed"),
        Err(_) => tracing::warn!("Tailing consumer did not stop in time"),
    }

    served.context("HTTP server error")
}
