//! Poller configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the per-task status pollers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Delay before the next status query after an in-progress answer (milliseconds).
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,

    /// Delay before retrying after a failed status query (milliseconds).
    /// Longer than the progress interval so a degraded network is not hammered.
    #[serde(default = "default_retry_interval")]
    pub retry_interval_ms: u64,

    /// Consecutive failed queries after which a task is marked failed.
    /// Unset means retry forever.
    #[serde(default)]
    pub max_transport_retries: Option<u32>,
}

fn default_progress_interval() -> u64 {
    2000 // 2 seconds
}

fn default_retry_interval() -> u64 {
    4000 // 4 seconds
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: default_progress_interval(),
            retry_interval_ms: default_retry_interval(),
            max_transport_retries: None,
        }
    }
}

impl PollerConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}
