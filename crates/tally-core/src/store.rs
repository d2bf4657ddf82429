//! Key-value store contract for counter records.
//!
//! The counter relies entirely on the backend's conditional put to serialize
//! writers; implementations must evaluate the condition and the write as one
//! atomic step.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::CounterRecord;

/// Precondition attached to a put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutCondition {
    /// Unconditional overwrite.
    None,
    /// Succeeds only if no record exists for the key.
    NotExists,
    /// Succeeds only if a record exists and its count equals the value.
    CountEquals(u64),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Strongly consistent read of one record.
    async fn get_item(&self, key: &str) -> StoreResult<Option<CounterRecord>>;

    /// Write `record`, failing with [`StoreError::ConditionFailed`] if
    /// `condition` does not hold against the current stored state.
    async fn put_item(&self, record: CounterRecord, condition: PutCondition) -> StoreResult<()>;
}
