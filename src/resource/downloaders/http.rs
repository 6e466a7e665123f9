use super::{Download, Downloader};
use crate::core::UsefulError;
use crate::resource::{FreshnessToken, ResourceUrl};
use async_trait::async_trait;
use reqwest::header::{ETAG, HeaderMap, LAST_MODIFIED};
use tracing::debug;

/// Fetches `http` and `https` resources.
///
/// Freshness is the `ETag` header of a `HEAD` response, else its `Last-Modified`.
/// Servers sending neither are checked by downloading the body and hashing it.
/// Downloads take their token the same way, so a stored token always compares
/// against a token of the same kind.
#[derive(Debug, Clone, Default)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    /// Use a preconfigured client (timeouts, proxies, default headers).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn validator(&self, url: &ResourceUrl) -> Result<Option<FreshnessToken>, UsefulError> {
        let uri = url.as_str();
        let response = self
            .client
            .head(uri)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| UsefulError::fetch(uri, e))?;
        Ok(header_token(response.headers()))
    }

    async fn body(&self, url: &ResourceUrl) -> Result<Vec<u8>, UsefulError> {
        let uri = url.as_str();
        debug!(url = uri, "Downloading resource");

        let response = self
            .client
            .get(uri)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| UsefulError::fetch(uri, e))?;
        let bytes = response.bytes().await.map_err(|e| UsefulError::fetch(uri, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &ResourceUrl) -> Result<Download, UsefulError> {
        // Validator first: a change in between leads to a refetch, not a stale entry.
        let validator = self.validator(url).await?;
        let bytes = self.body(url).await?;
        let token = validator.unwrap_or_else(|| FreshnessToken::of_content(&bytes));
        Ok(Download {
            bytes,
            token: Some(token),
        })
    }

    async fn freshness(&self, url: &ResourceUrl) -> Result<FreshnessToken, UsefulError> {
        if let Some(token) = self.validator(url).await? {
            return Ok(token);
        }

        debug!(url = url.as_str(), "No validator headers, hashing body for freshness");
        let bytes = self.body(url).await?;
        Ok(FreshnessToken::of_content(&bytes))
    }
}

fn header_token(headers: &HeaderMap) -> Option<FreshnessToken> {
    [ETAG, LAST_MODIFIED]
        .iter()
        .find_map(|name| headers.get(name)?.to_str().ok())
        .map(FreshnessToken::new)
}
