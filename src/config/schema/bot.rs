use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; MatrixPreviewBot; +https://github.com/Enovale/MatrixPreviewBot; embed bot; like Discordbot)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// User agent sent with every page and media request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Redact the triggering message when it contained nothing but links
    /// and at least one preview was posted (default: true)
    #[serde(default = "default_true")]
    pub delete_original_if_empty: bool,
    /// Line posted once before the first preview of a message. `{sender}`
    /// expands to the sender's user id.
    #[serde(default)]
    pub sender_prefix: Option<String>,
    /// Transient notice shown while previews are resolved
    #[serde(default = "default_loading_message")]
    pub loading_message: String,
    /// Post "Ready!" into every joined room on startup (default: false)
    #[serde(default)]
    pub announce_ready: bool,
    /// Per-request timeout for page and media fetches (default: 15)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Site-specific URL rewrites applied before delegating to the generic
    /// processors
    #[serde(default)]
    pub site_replacements: Vec<SiteReplacement>,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

fn default_loading_message() -> String {
    "Loading preview…".into()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

impl BotConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            delete_original_if_empty: true,
            sender_prefix: None,
            loading_message: default_loading_message(),
            announce_ready: false,
            request_timeout_secs: default_request_timeout_secs(),
            site_replacements: Vec::new(),
        }
    }
}

/// One `{match, replace}` rewrite rule. `replace` may reference capture
/// groups (`$1`, `${name}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteReplacement {
    #[serde(rename = "match")]
    pub pattern: String,
    pub replace: String,
}

impl SiteReplacement {
    pub fn compile(&self) -> Result<CompiledReplacement, ConfigError> {
        let regex = Regex::new(&self.pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: self.pattern.clone(),
            source,
        })?;
        Ok(CompiledReplacement {
            regex,
            replace: self.replace.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompiledReplacement {
    regex: Regex,
    replace: String,
}

impl CompiledReplacement {
    /// Rewrite `input`, or `None` when the pattern does not match.
    #[must_use]
    pub fn apply(&self, input: &str) -> Option<String> {
        if !self.regex.is_match(input) {
            return None;
        }
        Some(
            self.regex
                .replace(input, self.replace.as_str())
                .into_owned(),
        )
    }
}
