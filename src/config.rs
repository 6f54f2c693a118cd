//! Settings for the synchronization layer.
//!
//! Stored as a JSON object on disk; every key is optional:
//! ```json
//! {
//!   "baseUrl": "http://localhost:5000",
//!   "pollIntervalMs": 5000,
//!   "requestTimeoutMs": 4000,
//!   "schedule": "fixedRate",
//!   "fallback": "always",
//!   "lots": ["lot1", "lot2"]
//! }
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::poll::Schedule;
use crate::reconcile::FallbackPolicy;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 4000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub base_url: String,
    /// Cadence of background refresh, shared by both views.
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub schedule: Schedule,
    pub fallback: FallbackPolicy,
    /// Lot ids the dashboard shows a card for, in display order.
    pub lots: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            schedule: Schedule::default(),
            fallback: FallbackPolicy::default(),
            lots: vec!["lot1".to_string(), "lot2".to_string()],
        }
    }
}

impl SyncConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading config '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("parsing config '{path}'"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("pollIntervalMs must be greater than zero");
        }
        if self.request_timeout_ms == 0 {
            bail!("requestTimeoutMs must be greater than zero");
        }
        if self.request_timeout_ms >= self.poll_interval_ms {
            warn!(
                request_timeout_ms = self.request_timeout_ms,
                poll_interval_ms = self.poll_interval_ms,
                "Request timeout is not shorter than the poll interval; polls may pile up"
            );
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
