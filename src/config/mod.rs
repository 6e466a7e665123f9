//! Configuration loading
//!
//! A service's configuration can come from three places, picked by
//! [`ConfigSource`]:
//!
//! 1. **Literal** - an in-memory [`ValueGraph`], built as is
//! 2. **Environment variable** - the variable holds the URI of the document
//! 3. **URI** - any location the [`ResourceLoader`](crate::resource::ResourceLoader)
//!    understands
//!
//! [`ConfigLoader`] loads documents through a [`ResourceCache`] whose hook runs the
//! object builder (after normalizing generic markers, when enabled), so the cached
//! value is the finished object graph. Reloading an unchanged document returns the very same
//! objects.
//!
//! # Example
//!
//! ```rust,no_run
//! use useful::config::{ConfigLoader, ConfigSource};
//! use useful::creator::{Arguments, DottedPathResolver, TypeRegistry};
//! use useful::resource::ResourceLoader;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut registry = TypeRegistry::new();
//! registry.register("app.Database", |args: Arguments| Ok(Database { url: args.string("url")? }));
//!
//! let loader = ConfigLoader::new(ResourceLoader::new(), DottedPathResolver::new(registry));
//! // APP_CONFIG=/etc/app/config.yaml, or a path/URI directly
//! let config = loader.load(ConfigSource::detect("APP_CONFIG")).await?;
//! let db = config.get_path("storage.primary")?.downcast::<Database>();
//! # Ok(())
//! # }
//! ```

use crate::cache::{CachePolicy, ResourceCache};
use crate::core::UsefulError;
use crate::creator::{BuiltValue, GenericMarkers, ObjectBuilder, Resolver};
use crate::resource::FetchParse;
use crate::value::ValueGraph;
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Where a configuration document comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// An in-memory document
    Literal(ValueGraph),
    /// Name of an environment variable holding the document URI
    Env(String),
    /// URI of the document
    Url(String),
}

impl ConfigSource {
    /// `Env` when an environment variable named `value` exists, `Url` otherwise.
    pub fn detect(value: &str) -> Self {
        if std::env::var_os(value).is_some() {
            Self::Env(value.to_string())
        } else {
            Self::Url(value.to_string())
        }
    }

    /// A literal source from a JSON value.
    pub fn from_json(value: &serde_json::Value) -> Self {
        Self::Literal(ValueGraph::from_json(value))
    }
}

impl From<ValueGraph> for ConfigSource {
    fn from(graph: ValueGraph) -> Self {
        Self::Literal(graph)
    }
}

/// Loads configuration documents into built object graphs.
///
/// Only the shorthand marker form is recognized unless generic markers are enabled
/// with [`with_generic_markers`](Self::with_generic_markers).
#[derive(Clone)]
pub struct ConfigLoader {
    fetcher: Arc<dyn FetchParse>,
    resolver: Arc<dyn Resolver>,
    generic: Option<GenericMarkers>,
    cache: ResourceCache<BuiltValue>,
    policy: CachePolicy,
}

impl ConfigLoader {
    /// Loader fetching through `fetcher` and building with `resolver`.
    ///
    /// Documents are refetched on every load until a policy is set with
    /// [`with_policy`](Self::with_policy).
    pub fn new(fetcher: impl FetchParse + 'static, resolver: impl Resolver + 'static) -> Self {
        let fetcher: Arc<dyn FetchParse> = Arc::new(fetcher);
        let resolver: Arc<dyn Resolver> = Arc::new(resolver);
        let cache = build_cache(&fetcher, &resolver, None);

        Self {
            fetcher,
            resolver,
            generic: None,
            cache,
            policy: CachePolicy::Never,
        }
    }

    /// Also accept the `{class: {module, name}, params}` marker form.
    ///
    /// Starts from an empty cache.
    pub fn with_generic_markers(mut self, markers: GenericMarkers) -> Self {
        self.cache = build_cache(&self.fetcher, &self.resolver, Some(markers.clone()));
        self.generic = Some(markers);
        self
    }

    /// Cache policy for URI and environment sources.
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The underlying cache, e.g. to [`invalidate`](ResourceCache::invalidate) a URI.
    pub fn cache(&self) -> &ResourceCache<BuiltValue> {
        &self.cache
    }

    /// Load and build a configuration.
    ///
    /// # Errors
    ///
    /// - [`UsefulError::MissingEnvVar`] when an `Env` source names an unset variable
    /// - any fetch, parse or construction error, unchanged
    pub async fn load(&self, source: ConfigSource) -> Result<Arc<BuiltValue>> {
        match source {
            ConfigSource::Literal(graph) => {
                debug!("Building literal configuration");
                Ok(Arc::new(self.build(graph)?))
            }
            ConfigSource::Env(name) => self.from_env(&name).await,
            ConfigSource::Url(uri) => self.from_url(&uri).await,
        }
    }

    /// Load the document whose URI is stored in the environment variable `name`.
    pub async fn from_env(&self, name: &str) -> Result<Arc<BuiltValue>> {
        let uri = std::env::var(name).map_err(|_| UsefulError::MissingEnvVar {
            name: name.to_string(),
        })?;
        debug!(variable = name, url = %uri, "Configuration location taken from environment");
        self.from_url(&uri).await
    }

    /// Load the document at `uri`.
    pub async fn from_url(&self, uri: &str) -> Result<Arc<BuiltValue>> {
        debug!(url = uri, policy = ?self.policy, "Loading configuration");
        self.cache.load(uri, self.policy).await
    }

    /// Build an in-memory document.
    pub fn build(&self, graph: ValueGraph) -> Result<BuiltValue, UsefulError> {
        build(graph, self.generic.as_ref(), self.resolver.as_ref())
    }
}

fn build_cache(
    fetcher: &Arc<dyn FetchParse>,
    resolver: &Arc<dyn Resolver>,
    generic: Option<GenericMarkers>,
) -> ResourceCache<BuiltValue> {
    let resolver = Arc::clone(resolver);
    ResourceCache::from_parts(
        Arc::clone(fetcher),
        Arc::new(move |graph: ValueGraph| -> Result<BuiltValue> {
            Ok(build(graph, generic.as_ref(), resolver.as_ref())?)
        }),
    )
}

fn build(
    mut graph: ValueGraph,
    generic: Option<&GenericMarkers>,
    resolver: &dyn Resolver,
) -> Result<BuiltValue, UsefulError> {
    if let Some(generic) = generic {
        generic.normalize(&mut graph);
    }
    ObjectBuilder::new(resolver).create(&graph, graph.root())
}
