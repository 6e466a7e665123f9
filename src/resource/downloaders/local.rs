use super::{Download, Downloader};
use crate::core::UsefulError;
use crate::resource::{FreshnessToken, ResourceUrl};
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Reads resources from the local filesystem.
///
/// The freshness token is the SHA-256 of the file content, so a rewrite with equal
/// content is not a change.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDownloader;

impl LocalDownloader {
    async fn read(url: &ResourceUrl) -> Result<Vec<u8>, UsefulError> {
        let path = Path::new(url.path());
        debug!(path = %path.display(), "Reading local resource");
        tokio::fs::read(path)
            .await
            .map_err(|e| UsefulError::fetch(url.as_str(), e))
    }
}

#[async_trait]
impl Downloader for LocalDownloader {
    async fn download(&self, url: &ResourceUrl) -> Result<Download, UsefulError> {
        let bytes = Self::read(url).await?;
        let token = FreshnessToken::of_content(&bytes);
        Ok(Download {
            bytes,
            token: Some(token),
        })
    }

    async fn freshness(&self, url: &ResourceUrl) -> Result<FreshnessToken, UsefulError> {
        let bytes = Self::read(url).await?;
        Ok(FreshnessToken::of_content(&bytes))
    }
}
