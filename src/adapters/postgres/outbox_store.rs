//! PostgreSQL implementation of OutboxStore.
//!
//! Rows are inserted by the business transaction elsewhere; this adapter
//! only fetches, deletes, and quarantines them.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{OutboxRecord, StoreError};
use crate::ports::OutboxStore;

/// PostgreSQL implementation of OutboxStore.
///
/// `fetch_batch` takes no row locks: a second relay instance would
/// re-fetch the same rows and double-publish them (tolerable under
/// at-least-once, but wasteful). Adding `FOR UPDATE SKIP LOCKED`
/// ownership here is the extension point if horizontal scaling is ever
/// needed.
#[derive(Clone)]
pub struct PostgresOutboxStore {
    pool: PgPool,
}

impl PostgresOutboxStore {
    /// Creates a new PostgresOutboxStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the outbox tables if absent.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS outbox (
                id          BIGSERIAL PRIMARY KEY,
                payload     TEXT NOT NULL,
                enqueued_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::new(format!("Failed to create outbox table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS outbox_dead_letter (
                id               BIGINT PRIMARY KEY,
                payload          TEXT NOT NULL,
                enqueued_at      TIMESTAMPTZ,
                failure_reason   TEXT NOT NULL,
                dead_lettered_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::new(format!("Failed to create dead-letter table: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl OutboxStore for PostgresOutboxStore {
    async fn fetch_batch(&self, limit: u32) -> Result<Vec<OutboxRecord>, StoreError> {
        let rows = sqlx::query_as::<_, OutboxRow>(
            r#"
            SELECT id, payload, enqueued_at
            FROM outbox
            ORDER BY id ASC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::new(format!("Failed to fetch outbox batch: {}", e)))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_batch(&self, ids: &[i64]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        // Exactly the fetched identifier set, never a broader predicate:
        // rows inserted since the fetch must survive. Absent ids are a
        // no-op, so a retried delete is safe.
        sqlx::query("DELETE FROM outbox WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to delete outbox batch: {}", e)))?;

        Ok(())
    }

    async fn move_to_dead_letter(
        &self,
        record: &OutboxRecord,
        reason: &str,
    ) -> Result<(), StoreError> {
        let mut txn = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::new(format!("Failed to begin quarantine txn: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO outbox_dead_letter (id, payload, enqueued_at, failure_reason)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(&record.payload)
        .bind(record.enqueued_at)
        .bind(reason)
        .execute(&mut *txn)
        .await
        .map_err(|e| StoreError::new(format!("Failed to insert dead letter: {}", e)))?;

        sqlx::query("DELETE FROM outbox WHERE id = $1")
            .bind(record.id)
            .execute(&mut *txn)
            .await
            .map_err(|e| StoreError::new(format!("Failed to delete quarantined row: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| StoreError::new(format!("Failed to commit quarantine txn: {}", e)))?;

        Ok(())
    }

    async fn pending_count(&self) -> Result<u64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM outbox")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::new(format!("Failed to count pending rows: {}", e)))?;

        Ok(count.0 as u64)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OutboxRow {
    id: i64,
    payload: String,
    enqueued_at: chrono::DateTime<chrono::Utc>,
}

impl From<OutboxRow> for OutboxRecord {
    fn from(row: OutboxRow) -> Self {
        Self {
            id: row.id,
            payload: row.payload,
            enqueued_at: Some(row.enqueued_at),
        }
    }
}
