//! Uniform resource loading
//!
//! A resource is anything addressable by `[scheme://]path`: a local file, an HTTP
//! endpoint, or whatever scheme a host program registers. Loading goes through three
//! steps, each replaceable:
//!
//! 1. a [`Downloader`] chosen by scheme fetches the bytes,
//! 2. the [`MimeTypes`] table guesses the mimetype from the extension (or the caller
//!    forces one),
//! 3. a parser from [`Parsers`] turns the bytes into a [`ValueGraph`].
//!
//! [`ResourceLoader`] wires these together and implements [`FetchParse`], the
//! capability the [`ResourceCache`](crate::cache::ResourceCache) is written against.
//!
//! # Examples
//!
//! ```rust,no_run
//! use useful::resource::{FetchParse, ResourceLoader};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let loader = ResourceLoader::new();
//! let fetched = loader.fetch_parse("config/app.yaml").await?;
//! println!("{} (token {})", fetched.value.root_json(), fetched.token);
//! # Ok(())
//! # }
//! ```

pub mod downloaders;
mod loader;
pub mod mimetypes;
pub mod parsers;
mod url;

pub use downloaders::{Download, Downloader, HttpDownloader, LocalDownloader};
pub use loader::ResourceLoader;
pub use mimetypes::MimeTypes;
pub use parsers::{Parser, Parsers};
pub use url::{DEFAULT_SCHEME, ResourceUrl};

use crate::core::UsefulError;
use crate::utils::sha256_hex;
use crate::value::ValueGraph;
use async_trait::async_trait;
use std::fmt;

/// Opaque value that changes whenever a resource's content changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FreshnessToken(String);

impl FreshnessToken {
    /// Wrap a transport-provided token such as an ETag.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token derived from the content itself.
    pub fn of_content(bytes: &[u8]) -> Self {
        Self(sha256_hex(bytes))
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FreshnessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsed content together with the token it was fetched at.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Parsed document
    pub value: ValueGraph,
    /// Freshness token of the fetched content
    pub token: FreshnessToken,
}

/// Fetch-and-parse capability.
///
/// `check_freshness` must be cheaper than `fetch_parse` where the transport allows
/// it, and must return the same token `fetch_parse` would for unchanged content.
#[async_trait]
pub trait FetchParse: Send + Sync {
    /// Download and parse `uri`.
    async fn fetch_parse(&self, uri: &str) -> Result<Fetched, UsefulError>;

    /// Current freshness token of `uri`.
    async fn check_freshness(&self, uri: &str) -> Result<FreshnessToken, UsefulError>;
}

#[async_trait]
impl<F: FetchParse + ?Sized> FetchParse for std::sync::Arc<F> {
    async fn fetch_parse(&self, uri: &str) -> Result<Fetched, UsefulError> {
        (**self).fetch_parse(uri).await
    }

    async fn check_freshness(&self, uri: &str) -> Result<FreshnessToken, UsefulError> {
        (**self).check_freshness(uri).await
    }
}
