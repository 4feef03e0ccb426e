//! Per-link preview producers.
//!
//! Every processor in a [`ProcessorChain`] runs for every link, in priority
//! order; the payload groups of all processors that apply are kept.

pub mod direct_media;
pub mod open_graph;
pub mod site_adapter;
pub mod upload;

pub use direct_media::DirectMediaProcessor;
pub use open_graph::{OpenGraphProcessor, Summary};
pub use site_adapter::SiteAdapterProcessor;
pub use upload::MediaUploader;

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use crate::config::CompiledReplacement;
use crate::matrix::MessageContent;
use crate::media::PreviewCache;

#[async_trait]
pub trait Processor: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the link is not handled by this processor;
    /// `Ok(Some(payloads))` is the group of messages to post for it.
    async fn process(
        &self,
        room_id: &str,
        url: &Url,
    ) -> anyhow::Result<Option<Vec<MessageContent>>>;
}

/// Fixed, ordered list of processors.
#[derive(Clone)]
pub struct ProcessorChain {
    processors: Vec<Arc<dyn Processor>>,
}

impl ProcessorChain {
    pub fn new(processors: Vec<Arc<dyn Processor>>) -> Self {
        Self { processors }
    }

    /// Direct media, then Open Graph, then site rewrites delegating to both.
    pub fn standard(
        uploader: &MediaUploader,
        cache: &PreviewCache,
        site_rules: Vec<CompiledReplacement>,
    ) -> Self {
        let direct: Arc<dyn Processor> =
            Arc::new(DirectMediaProcessor::new(uploader.clone(), cache.clone()));
        let open_graph: Arc<dyn Processor> =
            Arc::new(OpenGraphProcessor::new(uploader.clone(), cache.clone()));
        let site: Arc<dyn Processor> = Arc::new(SiteAdapterProcessor::new(
            site_rules,
            vec![Arc::clone(&direct), Arc::clone(&open_graph)],
        ));
        Self::new(vec![direct, open_graph, site])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Run every processor for `url`. A failing processor is logged and
    /// counts as not applicable.
    pub async fn run(&self, room_id: &str, url: &Url) -> Vec<Vec<MessageContent>> {
        let mut groups = Vec::new();
        for processor in &self.processors {
            match processor.process(room_id, url).await {
                Ok(Some(payloads)) => {
                    tracing::debug!(
                        processor = processor.name(),
                        url = %url,
                        payloads = payloads.len(),
                        "processor produced previews"
                    );
                    groups.push(payloads);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        processor = processor.name(),
                        url = %url,
                        error = %e,
                        "processor failed"
                    );
                }
            }
        }
        groups
    }
}
