//! Shared application state for the tally gateway and Lambda handler.

use std::sync::Arc;

use tally_core::error::Result;
use tally_core::store::KvStore;
use tally_core::CounterStore;

use crate::config::TallyConfig;
use crate::obs::metrics::TallyMetrics;
use crate::store;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: TallyConfig,
    counter: CounterStore,
    metrics: TallyMetrics,
}

impl AppState {
    /// Build state over an already constructed store.
    pub fn new(cfg: TallyConfig, kv: Arc<dyn KvStore>) -> Result<Self> {
        cfg.validate()?;
        let counter = CounterStore::new(kv, cfg.counter.retry_policy());
        tracing::info!(
            backend = counter.backend(),
            key = %cfg.counter.key,
            max_attempts = cfg.counter.max_attempts,
            "counter store ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                counter,
                metrics: TallyMetrics::default(),
            }),
        })
    }

    /// Build state and the store backend named in `cfg.store`.
    pub async fn connect(cfg: TallyConfig) -> Result<Self> {
        cfg.validate()?;
        let kv = store::build_kv_store(&cfg.store).await;
        Self::new(cfg, kv)
    }

    pub fn cfg(&self) -> &TallyConfig {
        &self.inner.cfg
    }

    pub fn counter(&self) -> &CounterStore {
        &self.inner.counter
    }

    /// Key every visit is counted under.
    pub fn counter_key(&self) -> &str {
        &self.inner.cfg.counter.key
    }

    pub fn metrics(&self) -> &TallyMetrics {
        &self.inner.metrics
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Values owned outside the metrics registry, rendered as plain lines.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![("tally_cas_conflicts_total", self.inner.counter.conflicts())]
    }

    /// `Access-Control-Allow-Origin` value for a request from `origin`.
    pub fn allow_origin(&self, origin: Option<&str>) -> Option<String> {
        let allowed = &self.inner.cfg.gateway.allowed_origins;
        if allowed.iter().any(|o| o == "*") {
            return Some("*".to_string());
        }
        let origin = origin?;
        allowed.iter().find(|o| o.as_str() == origin).cloned()
    }
}
