//! Zap Relay - Transactional Outbox Relay
//!
//! This crate bridges durable state changes recorded in PostgreSQL with
//! asynchronous event delivery to Kafka: every committed outbox row is
//! eventually published at least once, even across process crashes.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod relay;
