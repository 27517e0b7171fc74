//! Kafka adapter implementations.

mod publisher;

pub use publisher::KafkaPublisher;
