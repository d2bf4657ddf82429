//! Keyed visitor counter over a conditional-write `KvStore`.
//!
//! There is no in-process locking. Every write is conditioned on the state the
//! writer last observed (absent, or a specific count), so concurrent writers
//! across processes are serialized by the store and a loser simply re-reads
//! and tries again. Retries are bounded by [`RetryPolicy`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::time::{sleep, timeout_at, Instant};

use crate::error::{CounterError, Result, StoreError};
use crate::record::CounterRecord;
use crate::retry::RetryPolicy;
use crate::store::{KvStore, PutCondition, StoreResult};

/// Longest key accepted (DynamoDB partition key limit).
pub const MAX_KEY_BYTES: usize = 1024;

#[derive(Clone)]
pub struct CounterStore {
    kv: Arc<dyn KvStore>,
    policy: RetryPolicy,
    conflicts: Arc<AtomicU64>,
}

impl CounterStore {
    pub fn new(kv: Arc<dyn KvStore>, policy: RetryPolicy) -> Self {
        Self {
            kv,
            policy,
            conflicts: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &'static str {
        self.kv.backend()
    }

    /// Conditional-write conflicts observed since construction.
    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Increment the counter for `key` and return the new value.
    ///
    /// Creates the record with `count = 1` on first use.
    pub async fn increment(&self, key: &str) -> Result<u64> {
        validate_key(key)?;
        let deadline = Instant::now() + self.policy.deadline;
        let max_attempts = self.policy.max_attempts.max(1);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let outcome = timeout_at(deadline, self.try_increment(key))
                .await
                .map_err(|_| {
                    tracing::warn!(key, attempt, "increment deadline exceeded");
                    CounterError::Timeout
                })?;

            match outcome {
                Ok(count) => {
                    tracing::info!(key, count, attempt, "counter incremented");
                    return Ok(count);
                }
                Err(StoreError::ConditionFailed) => {
                    self.conflicts.fetch_add(1, Ordering::Relaxed);
                    if attempt >= max_attempts {
                        tracing::warn!(key, attempt, "increment gave up under contention");
                        return Err(CounterError::Contention { attempts: attempt });
                    }
                    let delay = self.policy.backoff(attempt);
                    if Instant::now() + delay >= deadline {
                        tracing::warn!(key, attempt, "no time left to retry increment");
                        return Err(CounterError::Timeout);
                    }
                    tracing::debug!(
                        key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "concurrent update, retrying"
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(key, attempt, error = %e, "increment failed");
                    return Err(e.into());
                }
            }
        }
    }

    /// Current value for `key`, or 0 if it was never incremented.
    pub async fn read(&self, key: &str) -> Result<u64> {
        validate_key(key)?;
        let deadline = Instant::now() + self.policy.deadline;
        let record = timeout_at(deadline, self.kv.get_item(key))
            .await
            .map_err(|_| CounterError::Timeout)?
            .map_err(|e| {
                tracing::error!(key, error = %e, "read failed");
                CounterError::from(e)
            })?;

        let count = record.map(|r| r.count).unwrap_or(0);
        tracing::debug!(key, count, "counter read");
        Ok(count)
    }

    /// One read-increment-write cycle. `ConditionFailed` means "lost a race".
    async fn try_increment(&self, key: &str) -> StoreResult<u64> {
        if let Some(current) = self.kv.get_item(key).await? {
            return self.bump(current).await;
        }

        match self
            .kv
            .put_item(CounterRecord::first(key, Utc::now()), PutCondition::NotExists)
            .await
        {
            Ok(()) => {
                tracing::info!(key, "created counter");
                Ok(1)
            }
            Err(StoreError::ConditionFailed) => {
                // Someone else created it between our get and put.
                tracing::debug!(key, "counter created concurrently, incrementing existing");
                match self.kv.get_item(key).await? {
                    Some(current) => self.bump(current).await,
                    None => Err(StoreError::ConditionFailed),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn bump(&self, current: CounterRecord) -> StoreResult<u64> {
        let next = current.incremented(Utc::now()).ok_or_else(|| {
            StoreError::Malformed(format!("count overflow for key {}", current.key))
        })?;
        let count = next.count;
        self.kv
            .put_item(next, PutCondition::CountEquals(current.count))
            .await?;
        Ok(count)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CounterError::BadRequest("counter key must not be empty".into()));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(CounterError::BadRequest(format!(
            "counter key must be at most {MAX_KEY_BYTES} bytes"
        )));
    }
    Ok(())
}
