//! In-memory broker for testing.
//!
//! Captures published messages for assertions and lets tests script
//! publish failures (transient or poison) to drive the relay's error
//! paths.
//!
//! This adapter is for **testing only** and should not be used in
//! production. It uses `.expect()` on lock operations which will panic
//! if locks are poisoned.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::RwLock;
use std::time::Duration;

use crate::domain::{OutboxRecord, PublishError};
use crate::ports::BrokerPublisher;

/// A message as the broker saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    /// Record identifier as a string (the partition/ordering hint).
    pub key: String,
    /// The record payload.
    pub value: String,
}

/// In-memory broker.
///
/// A scripted failure consumes one `publish_batch` call: the batch is
/// rejected as a whole and nothing is recorded, matching the contract
/// that a failed batch may not be assumed delivered.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
pub struct InMemoryBroker {
    messages: RwLock<Vec<BrokerMessage>>,
    scripted_failures: RwLock<VecDeque<PublishError>>,
    disconnected: RwLock<bool>,
}

impl InMemoryBroker {
    /// Creates a broker with no messages and no scripted failures.
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            scripted_failures: RwLock::new(VecDeque::new()),
            disconnected: RwLock::new(false),
        }
    }

    // === Test Helpers ===

    /// Returns all delivered messages in delivery order.
    pub fn messages(&self) -> Vec<BrokerMessage> {
        self.messages
            .read()
            .expect("InMemoryBroker: messages lock poisoned")
            .clone()
    }

    /// Returns count of delivered messages.
    pub fn message_count(&self) -> usize {
        self.messages
            .read()
            .expect("InMemoryBroker: messages lock poisoned")
            .len()
    }

    /// Queues a failure for the next `publish_batch` call.
    pub fn fail_next(&self, error: PublishError) {
        self.scripted_failures
            .write()
            .expect("InMemoryBroker: scripted_failures write lock poisoned")
            .push_back(error);
    }

    /// Whether `disconnect` has been called.
    pub fn is_disconnected(&self) -> bool {
        *self
            .disconnected
            .read()
            .expect("InMemoryBroker: disconnected lock poisoned")
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerPublisher for InMemoryBroker {
    async fn publish_batch(&self, records: &[OutboxRecord]) -> Result<(), PublishError> {
        let scripted = self
            .scripted_failures
            .write()
            .expect("InMemoryBroker: scripted_failures write lock poisoned")
            .pop_front();
        if let Some(error) = scripted {
            return Err(error);
        }

        let mut messages = self
            .messages
            .write()
            .expect("InMemoryBroker: messages write lock poisoned");
        messages.extend(records.iter().map(|r| BrokerMessage {
            key: r.message_key(),
            value: r.payload.clone(),
        }));
        Ok(())
    }

    async fn disconnect(&self, _timeout: Duration) -> Result<(), PublishError> {
        *self
            .disconnected
            .write()
            .expect("InMemoryBroker: disconnected write lock poisoned") = true;
        Ok(())
    }
}
