use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Presence {
    #[default]
    Online,
    Offline,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkListenerConfig {
    /// Long-poll timeout passed to `/sync` (default: 30000)
    #[serde(default = "default_sync_timeout_ms")]
    pub timeout_ms: u64,
    /// Minimum wall time between two sync requests (default: 0)
    #[serde(default)]
    pub minimum_sync_time_ms: u64,
    /// Presence announced while syncing; unset leaves presence untouched
    #[serde(default)]
    pub presence: Option<Presence>,
}

fn default_sync_timeout_ms() -> u64 {
    30_000
}

impl LinkListenerConfig {
    #[must_use]
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn minimum_sync_time(&self) -> Duration {
        Duration::from_millis(self.minimum_sync_time_ms)
    }
}

impl Default for LinkListenerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_sync_timeout_ms(),
            minimum_sync_time_ms: 0,
            presence: None,
        }
    }
}
