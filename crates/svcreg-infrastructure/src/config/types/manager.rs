use crate::constants::DEFAULT_RELOAD_INTERVAL_SECS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Services manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Seconds between background reloads; 0 disables them
    pub reload_interval_secs: u64,
}

impl ManagerConfig {
    /// Reload period, `None` when periodic reloads are off
    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_secs > 0).then(|| Duration::from_secs(self.reload_interval_secs))
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            reload_interval_secs: DEFAULT_RELOAD_INTERVAL_SECS,
        }
    }
}
