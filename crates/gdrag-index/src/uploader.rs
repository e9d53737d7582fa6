//! Batch upsert with a bounded retry policy.

use std::sync::Arc;
use std::time::Duration;

use gdrag_store::{VectorPoint, VectorStore};
use serde::{Deserialize, Serialize};

/// Growth of the wait between consecutive attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (default: 3).
    pub max_attempts: u32,
    /// Base wait between attempts (default: 2s).
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    /// Wait after the `failed`-th failed attempt (1-based).
    #[must_use]
    pub fn delay_for(&self, failed: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let factor = 1u32.checked_shl(failed.saturating_sub(1)).unwrap_or(u32::MAX);
                self.delay.saturating_mul(factor)
            }
        }
    }
}

/// Upserts whole batches; a batch either lands or is dropped.
pub struct Uploader {
    store: Arc<dyn VectorStore>,
    policy: RetryPolicy,
}

impl Uploader {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Returns `true` once an upsert succeeds, `false` after `max_attempts`
    /// failures. Empty batches succeed without touching the store.
    pub async fn upload(&self, collection: &str, points: Vec<VectorPoint>) -> bool {
        if points.is_empty() {
            return true;
        }
        let attempts = self.policy.max_attempts.max(1);
        let count = points.len();

        for attempt in 1..=attempts {
            match self.store.upsert(collection, points.clone()).await {
                Ok(()) => {
                    tracing::debug!(collection, count, attempt, "batch uploaded");
                    return true;
                }
                Err(e) if attempt < attempts => {
                    let wait = self.policy.delay_for(attempt);
                    tracing::warn!(
                        collection,
                        attempt,
                        "upload failed, retrying in {}ms: {e}",
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    tracing::error!(
                        collection,
                        count,
                        "upload failed after {attempts} attempts: {e}"
                    );
                }
            }
        }
        false
    }
}
