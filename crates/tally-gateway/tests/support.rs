//! Shared fixtures for gateway integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;

use tally_core::memory::MemoryKvStore;
use tally_core::store::{KvStore, PutCondition, StoreResult};
use tally_core::{CounterRecord, StoreError};
use tally_gateway::app_state::AppState;
use tally_gateway::config::{self, TallyConfig};

/// Store that fails every call like an unreachable backend.
pub struct DownStore;

#[async_trait]
impl KvStore for DownStore {
    fn backend(&self) -> &'static str {
        "down"
    }

    async fn get_item(&self, _key: &str) -> StoreResult<Option<CounterRecord>> {
        Err(StoreError::Transport("connection refused".into()))
    }

    async fn put_item(&self, _record: CounterRecord, _condition: PutCondition) -> StoreResult<()> {
        Err(StoreError::Transport("connection refused".into()))
    }
}

pub fn memory_config(extra: &str) -> TallyConfig {
    config::load_from_str(&format!("version: 1\nstore:\n  backend: memory\n{extra}")).unwrap()
}

pub fn memory_state() -> (AppState, Arc<MemoryKvStore>) {
    let kv = Arc::new(MemoryKvStore::new());
    let state = AppState::new(memory_config(""), kv.clone()).unwrap();
    (state, kv)
}

pub fn down_state() -> AppState {
    AppState::new(memory_config(""), Arc::new(DownStore)).unwrap()
}
