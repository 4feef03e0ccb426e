use anyhow::Context;
use std::sync::Arc;
use url::Url;

use crate::matrix::MatrixApi;
use crate::media::detection::file_name_from_url;
use crate::media::{HttpFetcher, UploadedMedia};

/// Moves remote media into the homeserver's media repository.
#[derive(Clone)]
pub struct MediaUploader {
    fetcher: HttpFetcher,
    api: Arc<dyn MatrixApi>,
}

impl MediaUploader {
    pub fn new(fetcher: HttpFetcher, api: Arc<dyn MatrixApi>) -> Self {
        Self { fetcher, api }
    }

    pub fn fetcher(&self) -> &HttpFetcher {
        &self.fetcher
    }

    /// Download `source` and upload it under the file name taken from its
    /// last path segment.
    pub async fn transfer(
        &self,
        source: &Url,
        content_type: &str,
        width: Option<u32>,
        height: Option<u32>,
    ) -> anyhow::Result<UploadedMedia> {
        let file_name = file_name_from_url(source);
        tracing::info!(url = %source, content_type, "downloading media");

        let data = self.fetcher.download(source).await?;
        let size = data.len() as u64;
        let content_uri = self
            .api
            .upload(&file_name, content_type, data)
            .await
            .with_context(|| format!("upload {file_name}"))?;

        tracing::debug!(url = %source, content_uri = %content_uri, size, "media uploaded");
        Ok(UploadedMedia {
            file_name,
            content_uri,
            content_type: content_type.to_string(),
            width,
            height,
            size,
        })
    }
}
