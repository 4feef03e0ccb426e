mod bot;
mod listener;
mod matrix;

pub use bot::{BotConfig, CompiledReplacement, DEFAULT_USER_AGENT, SiteReplacement};
pub use listener::{LinkListenerConfig, Presence};
pub use matrix::MatrixConfig;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sections that must be present in the config file.
pub const REQUIRED_SECTIONS: [&str; 2] = ["matrix", "url_preview_bot"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path the config was loaded from (computed, not serialized)
    #[serde(skip)]
    pub config_path: PathBuf,
    pub matrix: MatrixConfig,
    pub url_preview_bot: BotConfig,
    #[serde(default)]
    pub link_listener: LinkListenerConfig,
    /// `tracing` level filter: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}
