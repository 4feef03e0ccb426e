pub mod parser;
pub mod types;

pub use parser::parse_open_graph;
pub use types::{OpenGraph, StructuredMetadata};

use crate::error::FetchError;
use crate::media::{HttpFetcher, is_html_type};
use url::Url;

/// Fetch `url` and parse its metadata. Non-HTML responses yield an empty
/// graph. A HEAD request screens out media first so its body is never
/// downloaded here; servers that reject HEAD fall through to GET.
pub async fn fetch_open_graph(fetcher: &HttpFetcher, url: &Url) -> Result<OpenGraph, FetchError> {
    match fetcher.head(url).await {
        Ok(info) if !is_html_type(info.content_type.as_deref()) => {
            tracing::debug!(
                url = %url,
                content_type = info.content_type.as_deref().unwrap_or_default(),
                "link is not a page; no metadata"
            );
            return Ok(OpenGraph::empty(url.clone()));
        }
        Ok(_) => {}
        Err(e) => tracing::debug!(url = %url, error = %e, "HEAD failed; trying GET"),
    }

    let page = fetcher.fetch_page(url).await?;
    if !page.is_html() {
        tracing::debug!(
            url = %url,
            content_type = page.content_type.as_deref().unwrap_or_default(),
            "page is not HTML; no metadata"
        );
        return Ok(OpenGraph::empty(url.clone()));
    }
    Ok(parse_open_graph(url.clone(), &page.final_url, &page.body))
}
