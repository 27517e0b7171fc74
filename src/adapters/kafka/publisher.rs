//! Kafka implementation of BrokerPublisher.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::BrokerConfig;
use crate::domain::{OutboxRecord, PublishError};
use crate::ports::BrokerPublisher;

/// Kafka implementation of BrokerPublisher.
///
/// The producer is configured for at-least-once delivery: `acks=all`
/// waits for all in-sync replicas, and idempotence prevents duplicate
/// writes within the producer session. Duplicates across relay restarts
/// are still possible and expected downstream.
pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaPublisher {
    /// Creates the producer and establishes the broker session.
    ///
    /// Invoked once at startup; a failure here is a startup error, not
    /// something the relay retries.
    pub fn new(config: &BrokerConfig) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("request.timeout.ms", config.request_timeout_ms.to_string())
            .create()?;

        info!(
            topic = %config.topic,
            client_id = %config.client_id,
            "Kafka producer initialized"
        );

        Ok(Self {
            producer,
            topic: config.topic.clone(),
        })
    }
}

#[async_trait]
impl BrokerPublisher for KafkaPublisher {
    async fn publish_batch(&self, records: &[OutboxRecord]) -> Result<(), PublishError> {
        // Enqueue the whole batch first (synchronous, preserves order),
        // then await every acknowledgement. Any failure fails the batch:
        // the relay must not delete on partial uncertainty.
        let mut deliveries = Vec::with_capacity(records.len());
        for record in records {
            let key = record.message_key();
            let future_record = FutureRecord::to(&self.topic)
                .key(&key)
                .payload(record.payload.as_bytes());

            match self.producer.send_result(future_record) {
                Ok(delivery) => deliveries.push((record.id, delivery)),
                Err((e, _)) => return Err(classify(record.id, e)),
            }
        }

        for (id, delivery) in deliveries {
            match delivery.await {
                Ok(Ok((partition, offset))) => {
                    debug!(id, partition, offset, "record acknowledged by broker");
                }
                Ok(Err((e, _))) => return Err(classify(id, e)),
                Err(_) => {
                    return Err(PublishError::Transient(
                        "producer dropped before delivery was resolved".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    async fn disconnect(&self, timeout: Duration) -> Result<(), PublishError> {
        info!("Flushing Kafka producer (timeout: {:?})", timeout);
        self.producer
            .flush(Timeout::After(timeout))
            .map_err(|e| PublishError::Transient(format!("Failed to flush producer: {}", e)))?;
        Ok(())
    }
}

/// Splits broker failures into transient ones (retried by repeating the
/// cycle) and poison ones (the record itself can never be accepted).
fn classify(id: i64, error: KafkaError) -> PublishError {
    match error {
        KafkaError::MessageProduction(RDKafkaErrorCode::MessageSizeTooLarge) => {
            PublishError::Poison {
                id,
                reason: error.to_string(),
            }
        }
        _ => PublishError::Transient(error.to_string()),
    }
}
