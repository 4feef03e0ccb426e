use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::types::ExtractedLinks;

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://(?:www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b(?:[-a-zA-Z0-9()@:%_+.~#?&/=]*)",
    )
    .expect("link pattern is a valid regex")
});

/// Scan `text` for HTTP/HTTPS links.
///
/// Every match is removed from the text to decide whether anything else was
/// said; matches that fail strict URL parsing still count as removed but are
/// not returned.
pub fn extract_links(text: &str) -> ExtractedLinks {
    let mut urls = Vec::new();
    let mut residual = String::with_capacity(text.len());
    let mut cursor = 0;

    for found in LINK_PATTERN.find_iter(text) {
        residual.push_str(&text[cursor..found.start()]);
        cursor = found.end();

        match Url::parse(found.as_str()) {
            Ok(url) => urls.push(url),
            Err(e) => tracing::debug!(candidate = found.as_str(), error = %e, "dropping unparsable link"),
        }
    }
    residual.push_str(&text[cursor..]);

    ExtractedLinks {
        urls,
        residual_len: residual.chars().filter(|c| !c.is_whitespace()).count(),
    }
}

/// Drop the quoted reply fallback (`> ` lines up to the first blank line)
/// that Matrix clients prepend to replies.
pub fn strip_reply_fallback(body: &str) -> &str {
    if !body.starts_with("> ") {
        return body;
    }

    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        if line.starts_with("> ") || line.trim_end() == ">" {
            offset += line.len();
            continue;
        }
        if line.trim().is_empty() {
            offset += line.len();
        }
        break;
    }
    &body[offset..]
}
