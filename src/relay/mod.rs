//! The poll-publish-delete cycle.
//!
//! The relay repeatedly fetches a bounded batch from the outbox store,
//! publishes it to the broker, and deletes exactly the published rows.
//! Deletion never precedes a confirmed publish, so a crash at any point
//! loses nothing; the worst observable effect is duplicate delivery.
//!
//! ## Cycle states
//!
//! Fetch, publish, and delete run strictly sequentially within one
//! cooperative task. An empty fetch leads to an idle wait; a successful
//! cycle to a short pacing delay; a transient failure to an exponential
//! backoff before the cycle restarts from fetch (safe, since nothing was
//! deleted). A poison record is moved to the dead-letter table so the
//! rest of the pipeline keeps flowing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::domain::{PublishError, RelayError};
use crate::ports::{BrokerPublisher, OutboxStore};

/// Outcome of a single poll-publish-delete cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The outbox was empty; nothing was published.
    Idle,
    /// A batch of this many records was published and deleted.
    Published(usize),
    /// A poison record was quarantined; the rest of the batch stays in
    /// the outbox for the next cycle.
    Quarantined { id: i64 },
}

/// The relay loop.
///
/// Holds explicit handles to the store and publisher so tests can
/// substitute in-memory doubles.
pub struct Relay {
    store: Arc<dyn OutboxStore>,
    publisher: Arc<dyn BrokerPublisher>,
    config: RelayConfig,
}

impl Relay {
    /// Creates a relay over the given store and publisher.
    pub fn new(
        store: Arc<dyn OutboxStore>,
        publisher: Arc<dyn BrokerPublisher>,
        config: RelayConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            config,
        }
    }

    /// Run the relay until the shutdown signal fires.
    ///
    /// All transient store and broker failures are absorbed here and
    /// retried under backoff; nothing escapes the loop. On shutdown the
    /// in-flight cycle is drained (publish and delete both complete)
    /// before this returns.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut backoff = Backoff::new(
            self.config.error_backoff_base(),
            self.config.error_backoff_cap(),
        );

        // The cycle itself is never raced against the shutdown signal:
        // an in-flight publish+delete pair always completes. Only the
        // sleeps between cycles are interruptible.
        while !*shutdown.borrow() {
            match self.run_cycle().await {
                Ok(CycleOutcome::Idle) => {
                    debug!("outbox empty, idling");
                    self.sleep_unless_shutdown(self.config.idle_interval(), &mut shutdown)
                        .await;
                }
                Ok(CycleOutcome::Published(count)) => {
                    backoff.reset();
                    debug!(count, "batch relayed");
                    self.sleep_unless_shutdown(self.config.pacing_interval(), &mut shutdown)
                        .await;
                }
                Ok(CycleOutcome::Quarantined { id }) => {
                    // Re-fetch immediately: the rest of the batch is
                    // still pending behind the poison record.
                    warn!(id, "poison record quarantined");
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "cycle failed, backing off"
                    );
                    self.sleep_unless_shutdown(delay, &mut shutdown).await;
                }
            }
        }

        info!("shutdown signal received, relay stopping");
    }

    async fn sleep_unless_shutdown(&self, delay: Duration, shutdown: &mut watch::Receiver<bool>) {
        tokio::select! {
            _ = time::sleep(delay) => {}
            _ = shutdown.wait_for(|stop| *stop) => {}
        }
    }

    /// Run a single fetch-publish-delete cycle.
    ///
    /// Returns `Ok` with what happened, or the transient error that
    /// aborted the cycle. Public so tests and the shutdown drain can
    /// drive cycles directly.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, RelayError> {
        let batch = self.store.fetch_batch(self.config.batch_limit).await?;
        if batch.is_empty() {
            return Ok(CycleOutcome::Idle);
        }

        debug!(count = batch.len(), first_id = batch[0].id, "batch fetched");

        if let Err(e) = self.publisher.publish_batch(&batch).await {
            match e {
                PublishError::Poison { id, ref reason } => {
                    // One bad record must not stall the pipeline: move it
                    // to the dead-letter table and let the next cycle
                    // retry the rest. Nothing was deleted, so records the
                    // broker did accept will be re-published (duplicate,
                    // not lost).
                    let record = batch
                        .iter()
                        .find(|r| r.id == id)
                        .ok_or_else(|| RelayError::Publish(e.clone()))?;
                    error!(
                        id,
                        reason = %reason,
                        payload = %serde_json::to_string(record).unwrap_or_default(),
                        "record cannot be published, moving to dead letter"
                    );
                    self.store.move_to_dead_letter(record, reason).await?;
                    return Ok(CycleOutcome::Quarantined { id });
                }
                PublishError::Transient(_) => return Err(e.into()),
            }
        }

        // Publish confirmed; the batch may now be deleted. Delete is
        // idempotent, so it is retried here with the same identifier set
        // until it lands: re-fetching instead would re-publish the whole
        // batch on every delete failure.
        let ids: Vec<i64> = batch.iter().map(|r| r.id).collect();
        self.delete_published(&ids).await;

        Ok(CycleOutcome::Published(ids.len()))
    }

    /// Delete a published batch, retrying with backoff until it lands.
    ///
    /// The records are already published, so repeated retries only risk
    /// duplicate delivery, never loss.
    async fn delete_published(&self, ids: &[i64]) {
        let mut backoff = Backoff::new(
            self.config.error_backoff_base(),
            self.config.error_backoff_cap(),
        );

        loop {
            match self.store.delete_batch(ids).await {
                Ok(()) => return,
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(
                        error = %e,
                        ids = ?ids,
                        delay_ms = delay.as_millis() as u64,
                        "delete failed after confirmed publish, retrying same id set"
                    );
                    time::sleep(delay).await;
                }
            }
        }
    }
}

/// Exponential backoff with a cap.
struct Backoff {
    base: Duration,
    cap: Duration,
    current: Duration,
}

impl Backoff {
    fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            current: base,
        }
    }

    /// Returns the next delay and doubles the stored one, up to the cap.
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.cap);
        delay
    }

    fn reset(&mut self) {
        self.current = self.base;
    }
}
