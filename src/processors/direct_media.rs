use async_trait::async_trait;
use url::Url;

use super::Processor;
use super::upload::MediaUploader;
use crate::matrix::MessageContent;
use crate::media::{MediaKind, PreviewCache, ProcessedPreview};

/// Posts links that point straight at an image, video or audio file.
pub struct DirectMediaProcessor {
    uploader: MediaUploader,
    cache: PreviewCache,
}

impl DirectMediaProcessor {
    pub fn new(uploader: MediaUploader, cache: PreviewCache) -> Self {
        Self { uploader, cache }
    }
}

#[async_trait]
impl Processor for DirectMediaProcessor {
    fn name(&self) -> &'static str {
        "direct_media"
    }

    async fn process(
        &self,
        _room_id: &str,
        url: &Url,
    ) -> anyhow::Result<Option<Vec<MessageContent>>> {
        let head = self.uploader.fetcher().head(url).await?;
        let Some(content_type) = head.content_type else {
            return Ok(None);
        };
        let Some(kind) = MediaKind::from_mime(&content_type) else {
            tracing::debug!(url = %url, content_type = %content_type, "not direct media");
            return Ok(None);
        };

        let final_url = head.final_url;
        let preview = self
            .cache
            .get_or_try_insert_with(final_url.as_str(), || async {
                let media = self
                    .uploader
                    .transfer(&final_url, &content_type, None, None)
                    .await?;
                Ok::<_, anyhow::Error>(ProcessedPreview {
                    kind,
                    media,
                    thumbnail: None,
                })
            })
            .await?;

        Ok(Some(vec![MessageContent::media(&preview)]))
    }
}
