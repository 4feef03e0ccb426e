use serde::Serialize;

use crate::media::{MediaKind, ProcessedPreview, UploadedMedia};

pub const HTML_FORMAT: &str = "org.matrix.custom.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageType {
    #[serde(rename = "m.text")]
    Text,
    #[serde(rename = "m.notice")]
    Notice,
    #[serde(rename = "m.image")]
    Image,
    #[serde(rename = "m.video")]
    Video,
    #[serde(rename = "m.audio")]
    Audio,
}

impl From<MediaKind> for MessageType {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => Self::Image,
            MediaKind::Video => Self::Video,
            MediaKind::Audio => Self::Audio,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThumbnailInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_info: Option<ThumbnailInfo>,
}

/// An `m.room.message` payload ready to send: text, rich text, or an
/// uploaded attachment with optional caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageContent {
    pub msgtype: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<FileInfo>,
}

impl MessageContent {
    #[must_use]
    pub fn notice(body: impl Into<String>) -> Self {
        Self::plain(MessageType::Notice, body.into())
    }

    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::plain(MessageType::Text, body.into())
    }

    /// Notice with an HTML rendering.
    #[must_use]
    pub fn rich(body: impl Into<String>, html: impl Into<String>) -> Self {
        Self::notice(body).with_caption(String::new(), html)
    }

    fn plain(msgtype: MessageType, body: String) -> Self {
        Self {
            msgtype,
            body: Some(body),
            format: None,
            formatted_body: None,
            url: None,
            filename: None,
            info: None,
        }
    }

    /// Attachment payload for an uploaded preview, without caption.
    #[must_use]
    pub fn media(preview: &ProcessedPreview) -> Self {
        let UploadedMedia {
            file_name,
            content_uri,
            content_type,
            width,
            height,
            size,
        } = &preview.media;

        let mut info = FileInfo {
            mimetype: Some(content_type.clone()),
            size: Some(*size),
            w: *width,
            h: *height,
            ..FileInfo::default()
        };
        if let Some(thumb) = &preview.thumbnail {
            info.thumbnail_url = Some(thumb.content_uri.clone());
            info.thumbnail_info = Some(ThumbnailInfo {
                mimetype: Some(thumb.content_type.clone()),
                size: Some(thumb.size),
                w: thumb.width,
                h: thumb.height,
            });
        }

        Self {
            msgtype: preview.kind.into(),
            body: None,
            format: None,
            formatted_body: None,
            url: Some(content_uri.clone()),
            filename: Some(file_name.clone()),
            info: Some(info),
        }
    }

    /// Attach a plain + HTML caption. An empty `body` argument keeps any
    /// existing body.
    #[must_use]
    pub fn with_caption(mut self, body: impl Into<String>, html: impl Into<String>) -> Self {
        let body = body.into();
        if !body.is_empty() {
            self.body = Some(body);
        }
        self.format = Some(HTML_FORMAT.to_string());
        self.formatted_body = Some(html.into());
        self
    }

    #[must_use]
    pub fn has_attachment(&self) -> bool {
        self.url.is_some()
    }

    /// Content as sent on the wire. Matrix requires `body`, so attachments
    /// without a caption fall back to their file name.
    #[must_use]
    pub fn to_event_content(&self) -> serde_json::Value {
        let mut wire = self.clone();
        if wire.body.is_none() {
            wire.body = Some(wire.filename.clone().unwrap_or_default());
        }
        serde_json::to_value(&wire).unwrap_or_else(|_| serde_json::json!({}))
    }
}
