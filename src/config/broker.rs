//! Broker configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Kafka producer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Comma-separated Kafka bootstrap addresses (host:port)
    pub bootstrap_servers: String,

    /// Client identifier reported to the broker
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Topic every outbox record is published to
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Per-message acknowledgement timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl BrokerConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate broker configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bootstrap_servers.is_empty() {
            return Err(ValidationError::MissingRequired("BROKER_BOOTSTRAP_SERVERS"));
        }
        if self.topic.is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: String::new(),
            client_id: default_client_id(),
            topic: default_topic(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_client_id() -> String {
    "zap-relay".to_string()
}

fn default_topic() -> String {
    "zap-events".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_config_defaults() {
        let config = BrokerConfig::default();
        assert_eq!(config.client_id, "zap-relay");
        assert_eq!(config.topic, "zap-events");
        assert_eq!(config.request_timeout_ms, 5000);
    }

    #[test]
    fn test_request_timeout_duration() {
        let config = BrokerConfig {
            request_timeout_ms: 2000,
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn test_validation_missing_bootstrap_servers() {
        let config = BrokerConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_topic() {
        let config = BrokerConfig {
            bootstrap_servers: "localhost:9092".to_string(),
            topic: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        let config = BrokerConfig {
            bootstrap_servers: "broker-1:9092,broker-2:9092".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
