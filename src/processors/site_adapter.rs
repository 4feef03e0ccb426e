use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use super::Processor;
use crate::config::CompiledReplacement;
use crate::matrix::MessageContent;

/// Rewrites links for sites that need a different URL to preview well and
/// hands the rewritten link to the generic processors.
pub struct SiteAdapterProcessor {
    rules: Vec<CompiledReplacement>,
    delegates: Vec<Arc<dyn Processor>>,
}

impl SiteAdapterProcessor {
    pub fn new(rules: Vec<CompiledReplacement>, delegates: Vec<Arc<dyn Processor>>) -> Self {
        Self { rules, delegates }
    }

    /// First rule that changes `url`, applied.
    fn rewrite(&self, url: &Url) -> Option<Url> {
        self.rules
            .iter()
            .filter_map(|rule| rule.apply(url.as_str()))
            .filter_map(|rewritten| Url::parse(&rewritten).ok())
            .find(|rewritten| rewritten != url)
    }
}

#[async_trait]
impl Processor for SiteAdapterProcessor {
    fn name(&self) -> &'static str {
        "site_adapter"
    }

    async fn process(
        &self,
        room_id: &str,
        url: &Url,
    ) -> anyhow::Result<Option<Vec<MessageContent>>> {
        let Some(rewritten) = self.rewrite(url) else {
            return Ok(None);
        };
        tracing::info!(url = %url, rewritten = %rewritten, "site rule matched");

        let mut payloads = Vec::new();
        let mut applicable = false;
        for delegate in &self.delegates {
            match delegate.process(room_id, &rewritten).await {
                Ok(Some(found)) => {
                    applicable = true;
                    payloads.extend(found);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        processor = delegate.name(),
                        url = %rewritten,
                        error = %e,
                        "delegate failed for rewritten link"
                    );
                }
            }
        }
        Ok(applicable.then_some(payloads))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteReplacement;
    use std::sync::Mutex;

    /// Echoes the URL it was asked about.
    #[derive(Default)]
    struct Echo {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Processor for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn process(
            &self,
            _room_id: &str,
            url: &Url,
        ) -> anyhow::Result<Option<Vec<MessageContent>>> {
            self.seen.lock().unwrap().push(url.to_string());
            Ok(Some(vec![MessageContent::notice(url.as_str())]))
        }
    }

    fn rule(pattern: &str, replace: &str) -> CompiledReplacement {
        SiteReplacement {
            pattern: pattern.into(),
            replace: replace.into(),
        }
        .compile()
        .unwrap()
    }

    #[tokio::test]
    async fn no_matching_rule_is_not_applicable() {
        let echo = Arc::new(Echo::default());
        let adapter = SiteAdapterProcessor::new(
            vec![rule(r"^https://tumblr\.com/(.+)$", "https://www.tumblr.com/$1")],
            vec![echo.clone() as Arc<dyn Processor>],
        );
        let url = Url::parse("https://example.com/a").unwrap();
        assert!(adapter.process("!r:x", &url).await.unwrap().is_none());
        assert!(echo.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rewritten_url_is_delegated() {
        let echo = Arc::new(Echo::default());
        let adapter = SiteAdapterProcessor::new(
            vec![rule(r"^https://x\.com/(.+)$", "https://fxtwitter.com/$1")],
            vec![echo.clone() as Arc<dyn Processor>],
        );
        let url = Url::parse("https://x.com/user/status/1").unwrap();

        let payloads = adapter.process("!r:x", &url).await.unwrap().unwrap();

        assert_eq!(payloads.len(), 1);
        assert_eq!(
            echo.seen.lock().unwrap().as_slice(),
            ["https://fxtwitter.com/user/status/1"]
        );
    }

    #[tokio::test]
    async fn identity_rewrite_is_ignored() {
        let adapter = SiteAdapterProcessor::new(
            vec![rule(r"^(https://example\.com/.*)$", "$1")],
            vec![Arc::new(Echo::default()) as Arc<dyn Processor>],
        );
        let url = Url::parse("https://example.com/a").unwrap();
        assert!(adapter.process("!r:x", &url).await.unwrap().is_none());
    }
}
