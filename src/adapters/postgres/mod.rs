//! PostgreSQL adapters - Database implementations for store ports.

mod outbox_store;

pub use outbox_store::PostgresOutboxStore;
