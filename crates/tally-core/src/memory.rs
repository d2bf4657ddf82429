//! In-process `KvStore` backed by `DashMap`.
//!
//! Used by the `memory` backend for local runs and by tests. Conditions are
//! evaluated under the shard lock of the key, so a put is atomic with its check.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::StoreError;
use crate::record::CounterRecord;
use crate::store::{KvStore, PutCondition, StoreResult};

#[derive(Default)]
pub struct MemoryKvStore {
    items: DashMap<String, CounterRecord>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Drop a record, as an operator or TTL might do behind our back.
    pub fn remove(&self, key: &str) -> Option<CounterRecord> {
        self.items.remove(key).map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_item(&self, key: &str) -> StoreResult<Option<CounterRecord>> {
        Ok(self.items.get(key).map(|r| r.value().clone()))
    }

    async fn put_item(&self, record: CounterRecord, condition: PutCondition) -> StoreResult<()> {
        match condition {
            PutCondition::None => {
                self.items.insert(record.key.clone(), record);
                Ok(())
            }
            PutCondition::NotExists => match self.items.entry(record.key.clone()) {
                Entry::Occupied(_) => Err(StoreError::ConditionFailed),
                Entry::Vacant(slot) => {
                    slot.insert(record);
                    Ok(())
                }
            },
            PutCondition::CountEquals(expected) => match self.items.get_mut(&record.key) {
                Some(mut current) if current.count == expected => {
                    *current = record;
                    Ok(())
                }
                _ => Err(StoreError::ConditionFailed),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::Utc;

    use super::*;

    #[tokio::test]
    async fn not_exists_rejects_second_create() {
        let store = MemoryKvStore::new();
        let rec = CounterRecord::first("k", Utc::now());
        store.put_item(rec.clone(), PutCondition::NotExists).await.unwrap();
        let err = store.put_item(rec, PutCondition::NotExists).await.unwrap_err();
        assert_eq!(err, StoreError::ConditionFailed);
    }

    #[tokio::test]
    async fn count_equals_guards_stale_writes() {
        let store = MemoryKvStore::new();
        let now = Utc::now();
        store
            .put_item(CounterRecord::new("k", 5, now), PutCondition::None)
            .await
            .unwrap();

        let stale = store
            .put_item(CounterRecord::new("k", 5, now), PutCondition::CountEquals(4))
            .await;
        assert_eq!(stale, Err(StoreError::ConditionFailed));

        store
            .put_item(CounterRecord::new("k", 6, now), PutCondition::CountEquals(5))
            .await
            .unwrap();
        assert_eq!(store.get_item("k").await.unwrap().unwrap().count, 6);
    }

    #[tokio::test]
    async fn count_equals_on_missing_key_fails() {
        let store = MemoryKvStore::new();
        let res = store
            .put_item(CounterRecord::new("k", 1, Utc::now()), PutCondition::CountEquals(0))
            .await;
        assert_eq!(res, Err(StoreError::ConditionFailed));
        assert!(store.is_empty());
    }
}
