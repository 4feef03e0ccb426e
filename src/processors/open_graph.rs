use async_trait::async_trait;
use futures_util::future::join_all;
use url::Url;

use super::Processor;
use super::upload::MediaUploader;
use crate::matrix::MessageContent;
use crate::media::detection::{file_name_from_url, resolve_mime};
use crate::media::types::dimensions_are_valid;
use crate::media::{MediaKind, PreviewCache, ProcessedPreview, UploadedMedia};
use crate::opengraph::{OpenGraph, StructuredMetadata, fetch_open_graph};
use crate::utils::text::{html_escape, truncate_with_ellipsis};

const MAX_DESCRIPTION_CHARS: usize = 500;

/// Card types that never carry inline media.
const MEDIA_LESS_CARDS: [&str; 2] = ["summary", "undefined"];

/// Quoted title + description, rendered plain and as HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub body: String,
    pub html: String,
}

impl Summary {
    #[must_use]
    pub fn from_graph(graph: &OpenGraph) -> Self {
        let title = graph.title().unwrap_or_default();
        let description = graph
            .description()
            .map(|d| truncate_with_ellipsis(d, MAX_DESCRIPTION_CHARS))
            .unwrap_or_default();
        let link = html_escape(graph.original_url.as_str());

        let body = format!("> {title}\n> {}\n", description.replace('\n', "\n> "));
        let html = format!(
            "<blockquote><div class=\"m13253-url-preview-headline\">\
             <a class=\"m13253-url-preview-backref\" href=\"{link}\">\u{1f517}\u{fe0f}</a> \
             <strong><a class=\"m13253-url-preview-title\" href=\"{link}\">{}</a></strong></div>\
             <div class=\"m13253-url-preview-description\">{}</div></blockquote>",
            html_escape(title),
            html_escape(&description).replace('\n', "<br>"),
        );
        Self { body, html }
    }

    #[must_use]
    pub fn payload(&self) -> MessageContent {
        MessageContent::rich(self.body.clone(), self.html.clone())
    }
}

/// One media entry scheduled for download, with its optional thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MediaPlan {
    source: Url,
    kind: MediaKind,
    content_type: String,
    width: Option<u32>,
    height: Option<u32>,
    thumbnail: Option<ThumbnailPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ThumbnailPlan {
    source: Url,
    content_type: String,
    width: u32,
    height: u32,
}

fn card_wants_media(card_type: Option<&str>) -> bool {
    card_type.is_none_or(|card| !MEDIA_LESS_CARDS.contains(&card))
}

/// Order media as videos, then images not consumed as video thumbnails,
/// then audio. Each video takes the next image as its thumbnail.
fn plan_media(graph: &OpenGraph) -> Vec<MediaPlan> {
    let images = graph.get("og:image");
    let videos = graph.get("og:video");
    let audios = graph.get("og:audio");

    let mut thumbnails = images.iter();
    let mut plans = Vec::new();

    for entry in videos
        .iter()
        .chain(images.iter().skip(videos.len()))
        .chain(audios)
    {
        let Some(mut plan) = plan_entry(entry) else {
            continue;
        };
        if entry.name == "video" {
            plan.thumbnail = thumbnails.next().and_then(plan_thumbnail);
        }
        plans.push(plan);
    }
    plans
}

fn plan_entry(entry: &StructuredMetadata) -> Option<MediaPlan> {
    let width = entry.int_property("width");
    let height = entry.int_property("height");
    if !dimensions_are_valid(width, height) {
        tracing::debug!(media_url = %entry.value, ?width, ?height, "skipping media with bad dimensions");
        return None;
    }

    let source = Url::parse(&entry.value).ok()?;
    let content_type = resolve_mime(entry.property("type"), &file_name_from_url(&source));
    let declared = MediaKind::from_kind(&entry.name);
    let actual = MediaKind::from_mime(&content_type);

    if actual != declared {
        tracing::warn!(
            media_url = %entry.value,
            content_type = %content_type,
            declared = %entry.name,
            "mime type does not match declared media kind"
        );
    }
    let kind = actual.or(declared)?;

    Some(MediaPlan {
        source,
        kind,
        content_type,
        width: width.and_then(|w| u32::try_from(w).ok()),
        height: height.and_then(|h| u32::try_from(h).ok()),
        thumbnail: None,
    })
}

fn plan_thumbnail(entry: &StructuredMetadata) -> Option<ThumbnailPlan> {
    let width = u32::try_from(entry.int_property("width")?).ok()?;
    let height = u32::try_from(entry.int_property("height")?).ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    let source = Url::parse(&entry.value).ok()?;
    let content_type = resolve_mime(entry.property("type"), &file_name_from_url(&source));
    Some(ThumbnailPlan {
        source,
        content_type,
        width,
        height,
    })
}

/// Builds rich previews from a page's Open Graph / Twitter card metadata.
pub struct OpenGraphProcessor {
    uploader: MediaUploader,
    cache: PreviewCache,
}

impl OpenGraphProcessor {
    pub fn new(uploader: MediaUploader, cache: PreviewCache) -> Self {
        Self { uploader, cache }
    }

    async fn resolve(&self, plan: &MediaPlan) -> anyhow::Result<ProcessedPreview> {
        self.cache
            .get_or_try_insert_with(plan.source.as_str(), || async {
                let media = self.uploader.transfer(
                    &plan.source,
                    &plan.content_type,
                    plan.width,
                    plan.height,
                );
                let thumbnail = self.thumbnail(plan.thumbnail.as_ref());
                let (media, thumbnail) = tokio::join!(media, thumbnail);
                Ok::<_, anyhow::Error>(ProcessedPreview {
                    kind: plan.kind,
                    media: media?,
                    thumbnail,
                })
            })
            .await
    }

    async fn thumbnail(&self, plan: Option<&ThumbnailPlan>) -> Option<UploadedMedia> {
        let plan = plan?;
        tracing::info!(thumbnail_url = %plan.source, "downloading video thumbnail");
        match self
            .uploader
            .transfer(
                &plan.source,
                &plan.content_type,
                Some(plan.width),
                Some(plan.height),
            )
            .await
        {
            Ok(media) => Some(media),
            Err(e) => {
                tracing::warn!(thumbnail_url = %plan.source, error = %e, "thumbnail failed");
                None
            }
        }
    }
}

#[async_trait]
impl Processor for OpenGraphProcessor {
    fn name(&self) -> &'static str {
        "open_graph"
    }

    async fn process(
        &self,
        _room_id: &str,
        url: &Url,
    ) -> anyhow::Result<Option<Vec<MessageContent>>> {
        let graph = fetch_open_graph(self.uploader.fetcher(), url).await?;
        if graph.is_empty() {
            return Ok(None);
        }

        let summary = Summary::from_graph(&graph);
        if !card_wants_media(graph.card_type()) {
            return Ok(Some(vec![summary.payload()]));
        }

        let plans = plan_media(&graph);
        let resolved = join_all(plans.iter().map(|plan| self.resolve(plan))).await;
        let previews: Vec<ProcessedPreview> = plans
            .iter()
            .zip(resolved)
            .filter_map(|(plan, result)| match result {
                Ok(preview) => Some(preview),
                Err(e) => {
                    tracing::warn!(media_url = %plan.source, error = %e, "media preview failed");
                    None
                }
            })
            .collect();

        let Some((last, rest)) = previews.split_last() else {
            return Ok(Some(vec![summary.payload()]));
        };

        let mut payloads: Vec<MessageContent> = rest.iter().map(MessageContent::media).collect();
        payloads.push(MessageContent::media(last).with_caption(summary.body, summary.html));
        Ok(Some(payloads))
    }
}
