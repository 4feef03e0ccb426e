use serde::{Deserialize, Serialize};

/// Top-level MIME category a preview can be posted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Kind for a full MIME type (`image/png`) or bare category (`image`).
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let category = mime.split('/').next().unwrap_or_default().trim();
        Self::from_kind(&category.to_ascii_lowercase())
    }

    #[must_use]
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }
}

/// One uploaded file: the media itself or its thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub file_name: String,
    /// Content URI returned by the homeserver (`mxc://...`)
    pub content_uri: String,
    pub content_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: u64,
}

/// A downloaded and re-uploaded media item, cached by its remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedPreview {
    pub kind: MediaKind,
    pub media: UploadedMedia,
    pub thumbnail: Option<UploadedMedia>,
}

/// Declared dimensions must be positive when present.
#[must_use]
pub fn dimensions_are_valid(width: Option<i64>, height: Option<i64>) -> bool {
    width.is_none_or(|w| w > 0) && height.is_none_or(|h| h > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_from_mime_covers_categories() {
        assert_eq!(MediaKind::from_mime("image/webp"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime("video/mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_mime("audio/ogg"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_mime("Image/PNG"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime("video"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_mime("text/html"), None);
        assert_eq!(MediaKind::from_mime(""), None);
    }

    #[test]
    fn kind_displays_lowercase() {
        assert_eq!(MediaKind::Audio.to_string(), "audio");
        assert_eq!(MediaKind::from_kind("video"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_kind("text"), None);
    }

    #[test]
    fn dimensions_must_be_positive_when_present() {
        assert!(dimensions_are_valid(None, None));
        assert!(dimensions_are_valid(Some(640), Some(480)));
        assert!(dimensions_are_valid(Some(640), None));
        assert!(!dimensions_are_valid(Some(0), Some(480)));
        assert!(!dimensions_are_valid(Some(640), Some(-1)));
    }
}
