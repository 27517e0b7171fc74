//! Relay daemon entry point.
//!
//! Wires the Postgres store and Kafka publisher into the relay loop,
//! then runs until a shutdown signal arrives. Any startup failure is
//! logged and terminates the process with a non-zero status so a
//! supervisor can restart it.

use std::process;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use zap_relay::adapters::{KafkaPublisher, PostgresOutboxStore};
use zap_relay::config::{AppConfig, ConfigError};
use zap_relay::ports::{BrokerPublisher, OutboxStore};
use zap_relay::relay::Relay;

/// Irrecoverable startup conditions. Everything past startup is retried
/// inside the relay loop instead.
#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("outbox store unavailable at startup: {0}")]
    Store(String),

    #[error("broker producer could not be created: {0}")]
    Broker(String),

    #[error("failed to install shutdown handler: {0}")]
    Signal(String),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "zap-relay failed");
        eprintln!("zap-relay failed: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    config.validate().map_err(ConfigError::from)?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await
        .map_err(|e| StartupError::Store(e.to_string()))?;

    let store = Arc::new(PostgresOutboxStore::new(pool));
    if config.database.run_migrations {
        store
            .migrate()
            .await
            .map_err(|e| StartupError::Store(e.to_string()))?;
    }

    let publisher = Arc::new(
        KafkaPublisher::new(&config.broker).map_err(|e| StartupError::Broker(e.to_string()))?,
    );

    match store.pending_count().await {
        Ok(pending) => info!(pending, "zap-relay started"),
        Err(e) => warn!(error = %e, "zap-relay started; pending count unavailable"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let relay = Relay::new(
        store.clone() as Arc<dyn OutboxStore>,
        publisher.clone() as Arc<dyn BrokerPublisher>,
        config.relay.clone(),
    );
    let relay_task = tokio::spawn(async move { relay.run(shutdown_rx).await });

    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the loop could never be stopped
        // cleanly; treat this as a startup defect.
        return Err(StartupError::Signal(e.to_string()));
    }
    info!("shutdown signal received, draining in-flight cycle");

    // The relay finishes its in-flight publish+delete pair before
    // stopping; only then is the producer flushed and released.
    let _ = shutdown_tx.send(true);
    if let Err(e) = relay_task.await {
        warn!(error = %e, "relay task ended abnormally");
    }

    if let Err(e) = publisher.disconnect(config.broker.request_timeout()).await {
        warn!(error = %e, "broker disconnect failed");
    }

    info!("zap-relay stopped");
    Ok(())
}
