use super::downloaders::{Downloader, HttpDownloader, LocalDownloader};
use super::mimetypes::MimeTypes;
use super::parsers::Parsers;
use super::url::ResourceUrl;
use super::{FetchParse, Fetched, FreshnessToken};
use crate::core::UsefulError;
use crate::value::ValueGraph;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// The standard [`FetchParse`] implementation.
///
/// Holds a downloader per scheme, a mimetype table and a parser registry. All three
/// are plain values owned by the loader, so two loaders can be configured
/// differently in one process.
#[derive(Clone)]
pub struct ResourceLoader {
    downloaders: HashMap<String, Arc<dyn Downloader>>,
    mimetypes: MimeTypes,
    parsers: Parsers,
    forced_mimetype: Option<String>,
}

impl Default for ResourceLoader {
    fn default() -> Self {
        let http: Arc<dyn Downloader> = Arc::new(HttpDownloader::default());
        let mut loader = Self {
            downloaders: HashMap::new(),
            mimetypes: MimeTypes::default(),
            parsers: Parsers::default(),
            forced_mimetype: None,
        };
        loader.register_downloader("file", Arc::new(LocalDownloader));
        loader.register_downloader("http", Arc::clone(&http));
        loader.register_downloader("https", http);
        loader
    }
}

impl fmt::Debug for ResourceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<&String> = self.downloaders.keys().collect();
        schemes.sort_unstable();
        f.debug_struct("ResourceLoader")
            .field("schemes", &schemes)
            .field("mimetypes", &self.mimetypes)
            .field("parsers", &self.parsers)
            .field("forced_mimetype", &self.forced_mimetype)
            .finish()
    }
}

impl ResourceLoader {
    /// Loader with the built-in downloaders, mimetypes and parsers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every resource as `mimetype` regardless of its extension.
    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.forced_mimetype = Some(mimetype.into());
        self
    }

    /// Use `downloader` for `scheme`, replacing any previous one.
    pub fn register_downloader(&mut self, scheme: &str, downloader: Arc<dyn Downloader>) -> &mut Self {
        self.downloaders.insert(scheme.to_ascii_lowercase(), downloader);
        self
    }

    /// Mutable access to the extension table.
    pub fn mimetypes_mut(&mut self) -> &mut MimeTypes {
        &mut self.mimetypes
    }

    /// The extension table.
    pub fn mimetypes(&self) -> &MimeTypes {
        &self.mimetypes
    }

    /// Register a parser for `mimetype` and map `extensions` to it.
    pub fn add_parser<F>(&mut self, mimetype: &str, parser: F, extensions: &[&str]) -> &mut Self
    where
        F: Fn(&[u8]) -> anyhow::Result<ValueGraph> + Send + Sync + 'static,
    {
        self.parsers.add(mimetype, parser);
        for ext in extensions {
            self.mimetypes.add_type(mimetype, ext);
        }
        self
    }

    /// Drop the parser for `mimetype` and every extension mapped to it.
    pub fn remove_parser(&mut self, mimetype: &str) -> &mut Self {
        self.parsers.remove(mimetype);
        self.mimetypes.remove_type(mimetype);
        self
    }

    /// Fetch and parse `uri`, returning only the document.
    pub async fn load(&self, uri: &str) -> Result<ValueGraph, UsefulError> {
        self.fetch_parse(uri).await.map(|fetched| fetched.value)
    }

    /// Fetch and parse `uri` as `mimetype`, overriding any guess.
    pub async fn load_as(&self, uri: &str, mimetype: Option<&str>) -> Result<Fetched, UsefulError> {
        let url = ResourceUrl::parse(uri);
        let downloader = self.downloader(&url)?;

        debug!(url = uri, "Download resource");
        let started = Instant::now();
        let download = downloader.download(&url).await?;

        let mimetype = mimetype
            .or(self.forced_mimetype.as_deref())
            .or_else(|| self.mimetypes.guess_type(&url));
        debug!(url = uri, mimetype = ?mimetype, "Parse resource");

        let value = self
            .parsers
            .parse(mimetype, &download.bytes)
            .map_err(|e| UsefulError::parse(uri, mimetype.unwrap_or("bytes"), format!("{e:#}")))?;

        debug!(
            url = uri,
            bytes = download.bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Finished reading resource"
        );

        let token = download
            .token
            .unwrap_or_else(|| FreshnessToken::of_content(&download.bytes));
        Ok(Fetched { value, token })
    }

    fn downloader(&self, url: &ResourceUrl) -> Result<&Arc<dyn Downloader>, UsefulError> {
        self.downloaders
            .get(url.scheme())
            .ok_or_else(|| UsefulError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            })
    }
}

#[async_trait]
impl FetchParse for ResourceLoader {
    async fn fetch_parse(&self, uri: &str) -> Result<Fetched, UsefulError> {
        self.load_as(uri, None).await
    }

    async fn check_freshness(&self, uri: &str) -> Result<FreshnessToken, UsefulError> {
        let url = ResourceUrl::parse(uri);
        self.downloader(&url)?.freshness(&url).await
    }
}
