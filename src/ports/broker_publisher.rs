//! BrokerPublisher port - Batched message publication.
//!
//! The session with the broker is established once at construction and
//! released via `disconnect` at shutdown.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{OutboxRecord, PublishError};

/// Port for publishing outbox batches to the broker.
///
/// Each record maps to one message on the single configured topic:
/// `key` = record identifier as a string (partition/ordering hint),
/// `value` = the payload.
///
/// Implementations must ensure:
/// - `Ok(())` means the broker accepted and is responsible for
///   delivering every message in the batch
/// - on `Err`, none of the batch may be assumed delivered; the relay
///   must not delete on partial uncertainty
#[async_trait]
pub trait BrokerPublisher: Send + Sync {
    /// Submits the entire batch and awaits broker acknowledgement.
    async fn publish_batch(&self, records: &[OutboxRecord]) -> Result<(), PublishError>;

    /// Flushes in-flight messages and releases the broker session.
    /// Invoked once at shutdown.
    async fn disconnect(&self, timeout: Duration) -> Result<(), PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn BrokerPublisher) {}

    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn broker_publisher_is_send_sync() {
        fn check<T: BrokerPublisher>() {
            assert_send_sync::<T>();
        }
    }
}
