//! Error types for the relay cycle.
//!
//! The taxonomy mirrors the propagation policy: store and broker
//! failures inside a cycle are transient and absorbed by the relay with
//! backoff; only a poison record escapes the retry path, and it escapes
//! into the dead-letter table rather than out of the loop.

use thiserror::Error;

/// Failure talking to the outbox store (timeout, connection drop, SQL
/// error). Always transient: the relay retries with backoff and never
/// treats it as fatal.
#[derive(Debug, Clone, Error)]
#[error("outbox store error: {message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    /// Creates a store error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure publishing a batch to the broker.
///
/// On any error none of the batch may be assumed delivered, so the relay
/// never deletes on failure.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// Broker unreachable, connection dropped, or the batch was not
    /// fully acknowledged in time. The cycle is repeated from fetch,
    /// which is safe because deletion never happened.
    #[error("transient broker error: {0}")]
    Transient(String),

    /// A specific record can never be accepted by the broker (e.g. the
    /// message exceeds the broker's size limit). Retrying would stall
    /// the whole pipeline, so the relay quarantines the record instead.
    #[error("record {id} cannot be published: {reason}")]
    Poison { id: i64, reason: String },
}

/// Error surfaced by a single relay cycle.
///
/// `Relay::run` absorbs these with backoff; they are public so that
/// callers driving cycles by hand (tests, drain-on-shutdown) can see
/// what went wrong.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
