//! Relay loop configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Timing and batching knobs for the poll-publish-delete cycle
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Maximum records fetched (and published) per cycle
    #[serde(default = "default_batch_limit")]
    pub batch_limit: u32,

    /// Sleep between fetches when the outbox is empty, in milliseconds
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,

    /// Pause between successful cycles to limit store pressure, in milliseconds
    #[serde(default = "default_pacing_interval_ms")]
    pub pacing_interval_ms: u64,

    /// First error backoff delay, in milliseconds; doubles per consecutive failure
    #[serde(default = "default_error_backoff_base_ms")]
    pub error_backoff_base_ms: u64,

    /// Upper bound on the error backoff delay, in milliseconds
    #[serde(default = "default_error_backoff_cap_ms")]
    pub error_backoff_cap_ms: u64,
}

impl RelayConfig {
    /// Get idle interval as Duration
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    /// Get pacing interval as Duration
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_millis(self.pacing_interval_ms)
    }

    /// Get error backoff base as Duration
    pub fn error_backoff_base(&self) -> Duration {
        Duration::from_millis(self.error_backoff_base_ms)
    }

    /// Get error backoff cap as Duration
    pub fn error_backoff_cap(&self) -> Duration {
        Duration::from_millis(self.error_backoff_cap_ms)
    }

    /// Validate relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_limit == 0 {
            return Err(ValidationError::ZeroBatchLimit);
        }
        if self.error_backoff_base_ms == 0 {
            return Err(ValidationError::ZeroBackoffBase);
        }
        if self.error_backoff_base_ms > self.error_backoff_cap_ms {
            return Err(ValidationError::BackoffBaseExceedsCap);
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            batch_limit: default_batch_limit(),
            idle_interval_ms: default_idle_interval_ms(),
            pacing_interval_ms: default_pacing_interval_ms(),
            error_backoff_base_ms: default_error_backoff_base_ms(),
            error_backoff_cap_ms: default_error_backoff_cap_ms(),
        }
    }
}

fn default_batch_limit() -> u32 {
    10
}

fn default_idle_interval_ms() -> u64 {
    1000
}

fn default_pacing_interval_ms() -> u64 {
    100
}

fn default_error_backoff_base_ms() -> u64 {
    500
}

fn default_error_backoff_cap_ms() -> u64 {
    30_000
}
