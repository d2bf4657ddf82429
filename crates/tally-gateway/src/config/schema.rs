use std::time::Duration;

use serde::Deserialize;
use tally_core::error::{CounterError, Result};
use tally_core::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TallyConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub counter: CounterSection,
}

impl TallyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(CounterError::BadRequest(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.gateway.validate()?;
        self.store.validate()?;
        self.counter.validate()?;

        Ok(())
    }

    /// Config for runtimes without a config file (Lambda): table, region, and
    /// counter key come from the environment, everything else is default.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Ok(table) = std::env::var("VISITOR_COUNTS_TABLE") {
            cfg.store.table_name = table;
        }
        if let Ok(region) = std::env::var("AWS_REGION") {
            cfg.store.region = Some(region);
        }
        if let Ok(key) = std::env::var("COUNTER_KEY") {
            cfg.counter.key = key;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            store: StoreSection::default(),
            counter: CounterSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Origins echoed back in `Access-Control-Allow-Origin`. `"*"` allows any.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(CounterError::BadRequest(format!(
                "gateway.listen must be a valid socket address: {}",
                self.listen
            )));
        }
        if self.allowed_origins.iter().any(|o| o.trim().is_empty()) {
            return Err(CounterError::BadRequest(
                "gateway.allowed_origins must not contain empty entries".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["*".into()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Dynamodb,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Falls back to the AWS default provider chain when unset.
    #[serde(default)]
    pub region: Option<String>,

    /// Override for DynamoDB Local and similar.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            table_name: default_table_name(),
            region: None,
            endpoint_url: None,
        }
    }
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        if self.backend == StoreBackend::Dynamodb {
            let n = self.table_name.len();
            // DynamoDB table name rules.
            if !(3..=255).contains(&n)
                || !self
                    .table_name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            {
                return Err(CounterError::BadRequest(format!(
                    "store.table_name is not a valid DynamoDB table name: {}",
                    self.table_name
                )));
            }
        }
        Ok(())
    }
}

fn default_backend() -> StoreBackend {
    StoreBackend::Dynamodb
}
fn default_table_name() -> String {
    "VisitorCounts".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterSection {
    #[serde(default = "default_key")]
    pub key: String,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

impl Default for CounterSection {
    fn default() -> Self {
        Self {
            key: default_key(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            deadline_ms: default_deadline_ms(),
        }
    }
}

impl CounterSection {
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() || self.key.len() > tally_core::counter::MAX_KEY_BYTES {
            return Err(CounterError::BadRequest(
                "counter.key must be 1..=1024 bytes".into(),
            ));
        }
        if !(1..=100).contains(&self.max_attempts) {
            return Err(CounterError::BadRequest(
                "counter.max_attempts must be between 1 and 100".into(),
            ));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(CounterError::BadRequest(
                "counter.base_delay_ms must not exceed max_delay_ms".into(),
            ));
        }
        if !(10..=60000).contains(&self.deadline_ms) {
            return Err(CounterError::BadRequest(
                "counter.deadline_ms must be between 10 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            deadline: Duration::from_millis(self.deadline_ms),
        }
    }
}

fn default_key() -> String {
    "site-visits".into()
}
fn default_max_attempts() -> u32 {
    8
}
fn default_base_delay_ms() -> u64 {
    10
}
fn default_max_delay_ms() -> u64 {
    500
}
fn default_deadline_ms() -> u64 {
    3000
}
