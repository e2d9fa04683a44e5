// ⚙️ Configuration - JSON file, every field optional

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::freshness::FreshnessPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Hand-curated fixtures used as fallback when feeds go stale
    pub static_data: Option<PathBuf>,

    /// Up to two live feeds (first = primary, second = secondary)
    pub feeds: Vec<FeedConfig>,

    pub freshness: FreshnessConfig,

    /// Gossip older than this many whole days is flagged
    pub rumor_stale_days: i64,

    /// Clubs shown on the overview; empty means every registered club
    pub clubs: Vec<String>,

    /// SQLite file for the parsed-transfer cache; in-memory when unset
    pub database: Option<PathBuf>,

    pub server_addr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub path: PathBuf,

    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    pub stale_after_minutes: i64,
    pub fallback_window_days: i64,
}

fn default_refresh_minutes() -> i64 {
    crate::aggregator::DEFAULT_REFRESH_INTERVAL_MINUTES
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        FreshnessConfig {
            stale_after_minutes: 60,
            fallback_window_days: 30,
        }
    }
}

impl FreshnessConfig {
    pub fn policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(
            Duration::minutes(self.stale_after_minutes),
            Duration::days(self.fallback_window_days),
        )
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        HubConfig {
            static_data: None,
            feeds: Vec::new(),
            freshness: FreshnessConfig::default(),
            rumor_stale_days: crate::rumors::DEFAULT_STALE_DAYS,
            clubs: Vec::new(),
            database: None,
            server_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl HubConfig {
    /// Load config from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: HubConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    /// At most two feeds, each with its own name
    pub fn validate(&self) -> Result<()> {
        if self.feeds.len() > 2 {
            anyhow::bail!("At most two live feeds are supported, got {}", self.feeds.len());
        }

        if let [first, second] = self.feeds.as_slice() {
            if first.name == second.name {
                anyhow::bail!("Duplicate feed name: {}", first.name);
            }
        }

        Ok(())
    }
}
