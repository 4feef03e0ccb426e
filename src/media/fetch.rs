use bytes::Bytes;
use reqwest::{Client, StatusCode, header};
use std::time::Duration;
use url::Url;

use super::detection::content_type_essence;
use crate::error::FetchError;

/// Pages larger than this are truncated before metadata parsing.
pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

/// Result of a metadata-only request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadInfo {
    /// URL after following redirects
    pub final_url: Url,
    /// `Content-Type` essence (`image/png`), if the server sent one
    pub content_type: Option<String>,
}

/// A fetched HTML document.
#[derive(Debug, Clone)]
pub struct Page {
    pub final_url: Url,
    pub content_type: Option<String>,
    pub body: String,
}

impl Page {
    #[must_use]
    pub fn is_html(&self) -> bool {
        is_html_type(self.content_type.as_deref())
    }
}

/// HTTP client for remote pages and media, sending the configured user agent.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    #[must_use]
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    pub async fn head(&self, url: &Url) -> Result<HeadInfo, FetchError> {
        let resp = self
            .client
            .head(url.as_str())
            .send()
            .await
            .map_err(|source| request_error(url, source))?;
        ensure_success(url, resp.status())?;

        Ok(HeadInfo {
            final_url: resp.url().clone(),
            content_type: header_content_type(resp.headers()),
        })
    }

    pub async fn download(&self, url: &Url) -> Result<Bytes, FetchError> {
        tracing::debug!(url = %url, "downloading media");
        let resp = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|source| request_error(url, source))?;
        ensure_success(url, resp.status())?;
        resp.bytes().await.map_err(|source| request_error(url, source))
    }

    /// Fetch an HTML document. Non-HTML responses come back with an empty
    /// body and are not read; HTML bodies stop at [`MAX_PAGE_BYTES`].
    pub async fn fetch_page(&self, url: &Url) -> Result<Page, FetchError> {
        let mut resp = self
            .client
            .get(url.as_str())
            .header(header::ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.5")
            .send()
            .await
            .map_err(|source| request_error(url, source))?;
        ensure_success(url, resp.status())?;

        let final_url = resp.url().clone();
        let content_type = header_content_type(resp.headers());
        if !is_html_type(content_type.as_deref()) {
            return Ok(Page {
                final_url,
                content_type,
                body: String::new(),
            });
        }

        let mut raw: Vec<u8> = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|source| request_error(url, source))?
        {
            let room = MAX_PAGE_BYTES - raw.len();
            raw.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if raw.len() >= MAX_PAGE_BYTES {
                tracing::debug!(url = %url, limit = MAX_PAGE_BYTES, "page truncated");
                break;
            }
        }

        Ok(Page {
            final_url,
            content_type,
            body: String::from_utf8_lossy(&raw).into_owned(),
        })
    }
}

/// `None` counts as HTML: servers that omit the header usually serve pages.
#[must_use]
pub fn is_html_type(content_type: Option<&str>) -> bool {
    content_type.is_none_or(|ct| ct == "text/html" || ct == "application/xhtml+xml")
}

fn header_content_type(headers: &header::HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(content_type_essence)
}

fn ensure_success(url: &Url, status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

fn request_error(url: &Url, source: reqwest::Error) -> FetchError {
    FetchError::Request {
        url: url.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new("PreviewBotTest/1.0", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn head_follows_redirects_and_reads_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/short"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "/media/cat.png"),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/media/cat.png"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "image/png"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/short", server.uri())).unwrap();
        let info = fetcher().head(&url).await.unwrap();
        assert_eq!(info.final_url.path(), "/media/cat.png");
        assert_eq!(info.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn requests_carry_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.bin"))
            .and(header_eq("User-Agent", "PreviewBotTest/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1_u8, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/a.bin", server.uri())).unwrap();
        let bytes = fetcher().download(&url).await.unwrap();
        assert_eq!(bytes.as_ref(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn non_success_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let err = fetcher().fetch_page(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn fetch_page_reports_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "<html><head><title>Hi</title></head></html>",
                    "text/html; charset=utf-8",
                ),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
        let page = fetcher().fetch_page(&url).await.unwrap();
        assert!(page.is_html());
        assert!(page.body.contains("<title>Hi</title>"));
    }

    #[tokio::test]
    async fn media_response_body_is_not_read_as_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0_u8; 64 * 1024], "video/mp4"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/clip.mp4", server.uri())).unwrap();
        let page = fetcher().fetch_page(&url).await.unwrap();
        assert!(!page.is_html());
        assert!(page.body.is_empty());
    }

    #[tokio::test]
    async fn oversized_page_is_capped() {
        let server = MockServer::start().await;
        let big = format!("<html>{}</html>", "a".repeat(MAX_PAGE_BYTES + 1024));
        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(big, "text/html"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/big", server.uri())).unwrap();
        let page = fetcher().fetch_page(&url).await.unwrap();
        assert_eq!(page.body.len(), MAX_PAGE_BYTES);
    }
}
