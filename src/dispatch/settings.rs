use std::time::Duration;

use crate::config::BotConfig;

/// Reason attached to the redaction of a trigger message that was fully
/// replaced by previews.
pub const TRIGGER_REDACT_REASON: &str = "URL Preview provided.";
/// Reason attached to the redaction of the loading notice.
pub const PLACEHOLDER_REDACT_REASON: &str = "Preview finished.";

const TYPING_REFRESH: Duration = Duration::from_secs(10);
const TYPING_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub delete_original_if_empty: bool,
    /// Template with `{sender}` placeholder
    pub sender_prefix: Option<String>,
    pub loading_message: String,
    /// How often the typing indicator is renewed while previews load
    pub typing_refresh: Duration,
    /// Lifetime requested for each typing notification
    pub typing_timeout: Duration,
}

impl DispatchSettings {
    #[must_use]
    pub fn render_sender_prefix(&self, sender: &str) -> Option<String> {
        self.sender_prefix
            .as_deref()
            .filter(|template| !template.trim().is_empty())
            .map(|template| template.replace("{sender}", sender))
    }
}

impl From<&BotConfig> for DispatchSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            delete_original_if_empty: config.delete_original_if_empty,
            sender_prefix: config.sender_prefix.clone(),
            loading_message: config.loading_message.clone(),
            typing_refresh: TYPING_REFRESH,
            typing_timeout: TYPING_TIMEOUT,
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from(&BotConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_bot_config() {
        let config = BotConfig {
            delete_original_if_empty: false,
            sender_prefix: Some("From {sender}:".into()),
            loading_message: "wait".into(),
            ..BotConfig::default()
        };
        let settings = DispatchSettings::from(&config);
        assert!(!settings.delete_original_if_empty);
        assert_eq!(settings.loading_message, "wait");
        assert_eq!(
            settings.render_sender_prefix("@a:x").as_deref(),
            Some("From @a:x:")
        );
        assert!(settings.typing_refresh < settings.typing_timeout);
    }

    #[test]
    fn blank_sender_prefix_is_ignored() {
        let settings = DispatchSettings {
            sender_prefix: Some("   ".into()),
            ..DispatchSettings::default()
        };
        assert!(settings.render_sender_prefix("@a:b").is_none());
    }

    #[test]
    fn no_prefix_by_default() {
        assert!(DispatchSettings::default().render_sender_prefix("@a:b").is_none());
    }
}
