//! In-memory outbox store for testing.
//!
//! Provides a deterministic store so the relay loop can be exercised
//! without PostgreSQL. Failures can be scripted to drive the retry
//! paths.
//!
//! This adapter is for **testing only** and should not be used in
//! production. It uses `.expect()` on lock operations which will panic
//! if locks are poisoned.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::RwLock;

use crate::domain::{OutboxRecord, StoreError};
use crate::ports::OutboxStore;

/// In-memory outbox table.
///
/// Rows are keyed by their store-assigned identifier in a `BTreeMap`,
/// so iteration order is ascending `id` order, the same ordering the
/// Postgres adapter gets from `ORDER BY id ASC`.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
pub struct InMemoryOutboxStore {
    rows: RwLock<BTreeMap<i64, OutboxRecord>>,
    dead_letters: RwLock<Vec<(OutboxRecord, String)>>,
    next_id: AtomicI64,
    fetch_count: AtomicU32,
    fail_fetches: AtomicU32,
    fail_deletes: AtomicU32,
}

impl InMemoryOutboxStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            dead_letters: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
            fetch_count: AtomicU32::new(0),
            fail_fetches: AtomicU32::new(0),
            fail_deletes: AtomicU32::new(0),
        }
    }

    // === Test Helpers ===

    /// Inserts a row the way the external business transaction would,
    /// assigning the next strictly increasing identifier.
    pub fn insert(&self, payload: impl Into<String>) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = OutboxRecord::new(id, payload);
        self.rows
            .write()
            .expect("InMemoryOutboxStore: rows write lock poisoned")
            .insert(id, record);
        id
    }

    /// Returns the number of rows currently in the table.
    pub fn row_count(&self) -> usize {
        self.rows
            .read()
            .expect("InMemoryOutboxStore: rows lock poisoned")
            .len()
    }

    /// Checks whether a row with the given identifier exists.
    pub fn contains(&self, id: i64) -> bool {
        self.rows
            .read()
            .expect("InMemoryOutboxStore: rows lock poisoned")
            .contains_key(&id)
    }

    /// Returns the quarantined records with their failure reasons.
    pub fn dead_letters(&self) -> Vec<(OutboxRecord, String)> {
        self.dead_letters
            .read()
            .expect("InMemoryOutboxStore: dead_letters lock poisoned")
            .clone()
    }

    /// Number of `fetch_batch` calls made so far.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Makes the next `n` fetches fail with a store error.
    pub fn fail_next_fetches(&self, n: u32) {
        self.fail_fetches.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` deletes fail with a store error.
    pub fn fail_next_deletes(&self, n: u32) {
        self.fail_deletes.store(n, Ordering::SeqCst);
    }

    fn take_scripted_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for InMemoryOutboxStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn fetch_batch(&self, limit: u32) -> Result<Vec<OutboxRecord>, StoreError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if Self::take_scripted_failure(&self.fail_fetches) {
            return Err(StoreError::new("injected fetch failure"));
        }

        let rows = self
            .rows
            .read()
            .expect("InMemoryOutboxStore: rows lock poisoned");
        Ok(rows.values().take(limit as usize).cloned().collect())
    }

    async fn delete_batch(&self, ids: &[i64]) -> Result<(), StoreError> {
        if Self::take_scripted_failure(&self.fail_deletes) {
            return Err(StoreError::new("injected delete failure"));
        }

        let mut rows = self
            .rows
            .write()
            .expect("InMemoryOutboxStore: rows write lock poisoned");
        for id in ids {
            // Absent ids are a no-op: deletes must be idempotent.
            rows.remove(id);
        }
        Ok(())
    }

    async fn move_to_dead_letter(
        &self,
        record: &OutboxRecord,
        reason: &str,
    ) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .expect("InMemoryOutboxStore: rows write lock poisoned");
        rows.remove(&record.id);
        self.dead_letters
            .write()
            .expect("InMemoryOutboxStore: dead_letters write lock poisoned")
            .push((record.clone(), reason.to_string()));
        Ok(())
    }

    async fn pending_count(&self) -> Result<u64, StoreError> {
        Ok(self.row_count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = InMemoryOutboxStore::new();
        let a = store.insert("a");
        let b = store.insert("b");
        assert!(b > a);
    }

    #[tokio::test]
    async fn fetch_batch_returns_ascending_id_order() {
        let store = InMemoryOutboxStore::new();
        store.insert("a");
        store.insert("b");
        store.insert("c");

        let batch = store.fetch_batch(10).await.unwrap();
        let ids: Vec<i64> = batch.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn fetch_batch_respects_limit_and_does_not_mutate() {
        let store = InMemoryOutboxStore::new();
        for i in 0..5 {
            store.insert(format!("p{}", i));
        }

        let batch = store.fetch_batch(2).await.unwrap();
        assert_eq!(batch.len(), 2);
        // Fetch never mutates: all five rows are still there.
        assert_eq!(store.row_count(), 5);
    }

    #[tokio::test]
    async fn delete_batch_is_idempotent() {
        let store = InMemoryOutboxStore::new();
        let a = store.insert("a");
        let b = store.insert("b");

        store.delete_batch(&[a, b]).await.unwrap();
        assert_eq!(store.row_count(), 0);

        // Deleting the same set again is a no-op, not an error.
        store.delete_batch(&[a, b]).await.unwrap();
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn scripted_fetch_failures_are_consumed() {
        let store = InMemoryOutboxStore::new();
        store.insert("a");
        store.fail_next_fetches(1);

        assert!(store.fetch_batch(10).await.is_err());
        assert!(store.fetch_batch(10).await.is_ok());
    }

    #[tokio::test]
    async fn move_to_dead_letter_removes_the_row() {
        let store = InMemoryOutboxStore::new();
        let id = store.insert("poison");
        let record = store.fetch_batch(1).await.unwrap().remove(0);

        store
            .move_to_dead_letter(&record, "message too large")
            .await
            .unwrap();

        assert!(!store.contains(id));
        let dead = store.dead_letters();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].0.id, id);
        assert_eq!(dead[0].1, "message too large");
    }
}
