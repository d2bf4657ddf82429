//! Store backend selection.

pub mod dynamo;

use std::sync::Arc;

use tally_core::memory::MemoryKvStore;
use tally_core::store::KvStore;

use crate::config::{StoreBackend, StoreSection};

pub use dynamo::DynamoKvStore;

pub async fn build_kv_store(section: &StoreSection) -> Arc<dyn KvStore> {
    if section.backend == StoreBackend::Memory {
        tracing::warn!("using in-memory store; counts are lost on restart");
        return Arc::new(MemoryKvStore::new());
    }
    Arc::new(DynamoKvStore::connect(section).await)
}
