//! Byte transports keyed by URI scheme.
//!
//! A [`Downloader`] fetches the raw bytes of a resource and reports a
//! [`FreshnessToken`] that changes whenever the content does. The crate ships
//! [`LocalDownloader`] for `file` and [`HttpDownloader`] for `http` and `https`;
//! host programs register their own for other schemes through
//! [`ResourceLoader::register_downloader`](super::ResourceLoader::register_downloader).

mod http;
mod local;

pub use http::HttpDownloader;
pub use local::LocalDownloader;

use super::{FreshnessToken, ResourceUrl};
use crate::core::UsefulError;
use async_trait::async_trait;

/// Result of a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Raw content
    pub bytes: Vec<u8>,
    /// Token reported by the transport; a content hash is used when absent
    pub token: Option<FreshnessToken>,
}

/// Transport for one or more URI schemes.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch the resource content.
    async fn download(&self, url: &ResourceUrl) -> Result<Download, UsefulError>;

    /// Cheaply determine the current freshness token of the resource.
    async fn freshness(&self, url: &ResourceUrl) -> Result<FreshnessToken, UsefulError>;
}
