//! Persisted counter record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One counter row: primary key, current value, and last write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterRecord {
    pub key: String,
    pub count: u64,
    pub last_updated: DateTime<Utc>,
}

impl CounterRecord {
    pub fn new(key: impl Into<String>, count: u64, last_updated: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            count,
            last_updated,
        }
    }

    /// Record written on the very first increment of a key.
    pub fn first(key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(key, 1, now)
    }

    /// Successor record, or `None` if the count would overflow.
    pub fn incremented(&self, now: DateTime<Utc>) -> Option<Self> {
        let count = self.count.checked_add(1)?;
        Some(Self::new(self.key.clone(), count, now))
    }
}
