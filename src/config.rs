//! Configuration for tax rates and storage paths
//!
//! Settings live in `~/.tradersan/config.toml`. Every key is optional;
//! missing keys (or a missing file) fall back to the defaults below, so a
//! fresh install needs no setup.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Default holding-period threshold separating short- from long-term gains.
pub const DAYS_IN_A_YEAR: i64 = 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tax rate applied to positive short-term gains (default 40%)
    pub short_term_rate: Decimal,
    /// Tax rate applied to positive long-term gains (default 15%)
    pub long_term_rate: Decimal,
    /// A lot held more than this many days is long-term
    pub long_term_threshold_days: i64,
    /// Flat brokerage fee applied to sells that do not carry their own
    pub sale_fee: Decimal,
    /// Override for the SQLite database location
    pub db_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            short_term_rate: Decimal::new(40, 2),
            long_term_rate: Decimal::new(15, 2),
            long_term_threshold_days: DAYS_IN_A_YEAR,
            sale_fee: Decimal::ZERO,
            db_path: None,
        }
    }
}

/// Get the tradersan home directory (~/.tradersan), creating it if needed
pub fn config_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let dir = PathBuf::from(home).join(".tradersan");
    std::fs::create_dir_all(&dir).context("Failed to create .tradersan directory")?;
    Ok(dir)
}

impl Config {
    /// Load configuration from ~/.tradersan/config.toml, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = config_home()?.join("config.toml");
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)
            .context(format!("Failed to read config at {:?}", path))?;
        let config: Config =
            toml::from_str(&contents).context(format!("Failed to parse config at {:?}", path))?;
        Ok(config)
    }
}
