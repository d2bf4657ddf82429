//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use tally_core::error::{CounterError, Result};

pub use schema::{CounterSection, GatewaySection, StoreBackend, StoreSection, TallyConfig};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "TALLY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "tally.yaml";

pub fn load_from_file(path: &str) -> Result<TallyConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| CounterError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<TallyConfig> {
    let cfg: TallyConfig = serde_yaml::from_str(s)
        .map_err(|e| CounterError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Path from `TALLY_CONFIG`, or `tally.yaml` in the working directory.
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
