use url::Url;

const FALLBACK_FILE_NAME: &str = "file";
const FALLBACK_MIME: &str = "application/octet-stream";

#[must_use]
pub fn detect_mime_from_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "html" | "htm" => "text/html",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime.to_string())
}

/// Declared MIME type when present, else a guess from the file extension.
#[must_use]
pub fn resolve_mime(declared: Option<&str>, filename: &str) -> String {
    declared
        .map(str::trim)
        .filter(|mime| mime.parse::<mime::Mime>().is_ok())
        .map(str::to_string)
        .or_else(|| detect_mime_from_extension(filename))
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

/// `essence` of a `Content-Type` header value, dropping parameters.
#[must_use]
pub fn content_type_essence(header: &str) -> Option<String> {
    let parsed: mime::Mime = header.parse().ok()?;
    Some(parsed.essence_str().to_string())
}

/// Last non-empty path segment of `url`, percent-decoded.
#[must_use]
pub fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(|segment| {
            urlencoding::decode(segment)
                .map_or_else(|_| segment.to_string(), std::borrow::Cow::into_owned)
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_mime_from_extension_common_types() {
        assert_eq!(detect_mime_from_extension("photo.JPG").as_deref(), Some("image/jpeg"));
        assert_eq!(detect_mime_from_extension("clip.webm").as_deref(), Some("video/webm"));
        assert_eq!(detect_mime_from_extension("voice.mp3").as_deref(), Some("audio/mpeg"));
        assert!(detect_mime_from_extension("README").is_none());
        assert!(detect_mime_from_extension("archive.xyz").is_none());
    }

    #[test]
    fn resolve_mime_prefers_declared_type() {
        assert_eq!(resolve_mime(Some("video/mp4"), "thumb.png"), "video/mp4");
        assert_eq!(resolve_mime(None, "thumb.png"), "image/png");
        assert_eq!(resolve_mime(Some("not a mime"), "thumb.png"), "image/png");
        assert_eq!(resolve_mime(None, "blob"), "application/octet-stream");
    }

    #[test]
    fn content_type_essence_strips_parameters() {
        assert_eq!(
            content_type_essence("text/html; charset=utf-8").as_deref(),
            Some("text/html")
        );
        assert_eq!(content_type_essence("image/png").as_deref(), Some("image/png"));
        assert!(content_type_essence("garbage").is_none());
    }

    #[test]
    fn file_name_uses_last_segment() {
        let url = Url::parse("https://cdn.example.com/a/b/cat.png?size=large").unwrap();
        assert_eq!(file_name_from_url(&url), "cat.png");
    }

    #[test]
    fn file_name_skips_trailing_slash_and_decodes() {
        let url = Url::parse("https://example.com/media/my%20clip.mp4/").unwrap();
        assert_eq!(file_name_from_url(&url), "my clip.mp4");
    }

    #[test]
    fn file_name_falls_back_for_root() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(file_name_from_url(&url), "file");
    }
}
