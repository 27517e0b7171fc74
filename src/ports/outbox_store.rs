//! OutboxStore port - Typed access to the outbox table.
//!
//! The store side of the transactional outbox pattern: business
//! transactions insert rows elsewhere; this port only reads, deletes,
//! and quarantines them.

use async_trait::async_trait;

use crate::domain::{OutboxRecord, StoreError};

/// Port for reading and deleting outbox rows.
///
/// Implementations must ensure:
/// - `fetch_batch` never mutates state, so a crashed relay re-fetches
///   the same rows on restart
/// - `delete_batch` removes exactly the given identifiers and treats
///   absent identifiers as a no-op, so a retried delete is safe
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Returns at most `limit` pending records in ascending `id` order
    /// (the application-level approximation of FIFO). Returns an empty
    /// vec when none are pending.
    async fn fetch_batch(&self, limit: u32) -> Result<Vec<OutboxRecord>, StoreError>;

    /// Removes exactly the given identifiers.
    ///
    /// Idempotent: deleting an already-absent identifier is a no-op,
    /// since retries may re-issue the same delete after a prior partial
    /// failure. Never a broader predicate, to avoid racing with
    /// concurrently inserted rows.
    async fn delete_batch(&self, ids: &[i64]) -> Result<(), StoreError>;

    /// Quarantines a permanently unpublishable record: moves it out of
    /// the outbox and into the dead-letter table with the failure
    /// reason, atomically.
    async fn move_to_dead_letter(
        &self,
        record: &OutboxRecord,
        reason: &str,
    ) -> Result<(), StoreError>;

    /// Count of rows currently pending. Observability only; never
    /// drives control flow.
    async fn pending_count(&self) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn OutboxStore) {}

    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn outbox_store_is_send_sync() {
        fn check<T: OutboxStore>() {
            assert_send_sync::<T>();
        }
    }
}
