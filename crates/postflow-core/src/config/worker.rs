//! Publication worker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scheduled post publication worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) that triggers a publication sweep.
    /// When unset, the worker sweeps every `poll_interval_seconds`.
    #[serde(default)]
    pub schedule: Option<String>,
    /// Interval in seconds between sweeps when no cron schedule is set.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Maximum number of due posts attempted per sweep.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Seconds after which a post stuck in `processing` may be re-claimed.
    #[serde(default = "default_stale_after")]
    pub stale_after_seconds: u64,
}

impl WorkerConfig {
    /// Stale-claim threshold as a [`Duration`].
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_seconds)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: None,
            poll_interval_seconds: default_poll_interval(),
            batch_size: default_batch_size(),
            stale_after_seconds: default_stale_after(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    60
}

fn default_batch_size() -> usize {
    25
}

fn default_stale_after() -> u64 {
    900
}
