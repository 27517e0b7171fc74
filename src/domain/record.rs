//! The outbox record as seen by the relay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single row fetched from the outbox table.
///
/// The store owns the row for its whole lifetime; the relay only ever
/// holds transient copies fetched per cycle. A row is deleted only after
/// the broker has confirmed the publish of the batch containing it, so a
/// crash at any point re-fetches the same rows (duplicate delivery,
/// never loss).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxRecord {
    /// Store-assigned, strictly increasing identifier. The sole ordering
    /// key, and the message key used as a partition/ordering hint.
    pub id: i64,

    /// Opaque value to be delivered (a run correlation identifier in the
    /// original system).
    pub payload: String,

    /// When the row was inserted. Carried for observability only.
    pub enqueued_at: Option<DateTime<Utc>>,
}

impl OutboxRecord {
    /// Creates a record without an insert timestamp.
    pub fn new(id: i64, payload: impl Into<String>) -> Self {
        Self {
            id,
            payload: payload.into(),
            enqueued_at: None,
        }
    }

    /// The message key for this record: the identifier as a string.
    pub fn message_key(&self) -> String {
        self.id.to_string()
    }
}
