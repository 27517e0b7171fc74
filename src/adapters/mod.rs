//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the relay to external systems:
//! - `postgres` - PostgreSQL outbox store
//! - `kafka` - Kafka broker publisher
//! - `memory` - In-memory implementations for testing

pub mod kafka;
pub mod memory;
pub mod postgres;

pub use kafka::KafkaPublisher;
pub use memory::{BrokerMessage, InMemoryBroker, InMemoryOutboxStore};
pub use postgres::PostgresOutboxStore;
