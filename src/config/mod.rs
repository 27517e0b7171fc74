//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ZAP_RELAY_` prefix and nested values use underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use zap_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Relaying to topic {}", config.broker.topic);
//! ```

mod broker;
mod database;
mod error;
mod relay;

pub use broker::BrokerConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use relay::RelayConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the relay daemon.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Broker configuration (Kafka producer)
    pub broker: BrokerConfig,

    /// Relay loop configuration (batch limit, intervals, backoff)
    #[serde(default)]
    pub relay: RelayConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ZAP_RELAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ZAP_RELAY__DATABASE__URL=...` -> `database.url = ...`
    /// - `ZAP_RELAY__BROKER__BOOTSTRAP_SERVERS=...` -> `broker.bootstrap_servers = ...`
    /// - `ZAP_RELAY__RELAY__BATCH_LIMIT=25` -> `relay.batch_limit = 25`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ZAP_RELAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.broker.validate()?;
        self.relay.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set environment variables for testing
    /// Uses double underscores to separate nested config values
    fn set_minimal_env() {
        env::set_var(
            "ZAP_RELAY__DATABASE__URL",
            "postgresql://test@localhost/test",
        );
        env::set_var("ZAP_RELAY__BROKER__BOOTSTRAP_SERVERS", "localhost:9092");
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        env::remove_var("ZAP_RELAY__DATABASE__URL");
        env::remove_var("ZAP_RELAY__BROKER__BOOTSTRAP_SERVERS");
        env::remove_var("ZAP_RELAY__BROKER__TOPIC");
        env::remove_var("ZAP_RELAY__RELAY__BATCH_LIMIT");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.broker.bootstrap_servers, "localhost:9092");
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok());
        let config = result.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_relay_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.relay.batch_limit, 10);
        assert_eq!(config.broker.topic, "zap-events");
    }

    #[test]
    fn test_custom_batch_limit() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("ZAP_RELAY__RELAY__BATCH_LIMIT", "25");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.relay.batch_limit, 25);
    }

    #[test]
    fn test_custom_topic() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("ZAP_RELAY__BROKER__TOPIC", "other-events");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.broker.topic, "other-events");
    }
}
