//! useful - resource loading and configuration-driven object graphs
//!
//! A small utility layer for microservice-style programs. It does two jobs:
//!
//! - **Resource loading**: fetch bytes from the local filesystem, HTTP(S) or any
//!   scheme a host registers, parse them by extension, and keep them in a
//!   freshness-aware cache that revalidates by content token.
//! - **Object creation**: turn configuration mappings such as
//!   `{"app.Database": {"url": "..."}}` into live objects, sharing one instance
//!   wherever the document aliases one sub-tree (YAML anchors).
//!
//! # Architecture Overview
//!
//! ```text
//!  URI ──► ResourceLoader ──► ValueGraph ──► ResourceCache ──► hook ──► Arc<T>
//!          (downloader,        (arena,         (per-URI lock,
//!           mimetype,           shared          Never / Revalidate /
//!           parser)             NodeIds)        Ttl)
//!
//!  ValueGraph ──► GenericMarkers::normalize ──► ObjectBuilder ──► BuiltValue
//!                                               (Resolver)         │
//!                                                                  ▼
//!                                                          placeholder::inject
//! ```
//!
//! [`config::ConfigLoader`] wires the two halves together: the cache hook runs the
//! builder, so reloading an unchanged document hands back the same objects.
//!
//! # Core Modules
//!
//! - [`value`] - arena-allocated configuration documents
//! - [`creator`] - resolvers, the object builder, generic markers and placeholders
//! - [`resource`] - downloaders, mimetypes, parsers and the [`resource::FetchParse`] seam
//! - [`cache`] - time-windowed cache over any fetcher
//! - [`config`] - configuration sources and the loader
//!
//! # Supporting Modules
//!
//! - [`core`] - error types and CLI error presentation
//! - [`dictionary`] - flatten and unflatten nested documents
//! - [`time`] - ISO 8601 helpers
//! - [`utils`] - checksums and retries
//! - [`logging`] - tracing subscriber setup
//! - [`cli`] - the `useful` binary
//!
//! # Example
//!
//! ```rust,no_run
//! use useful::cache::CachePolicy;
//! use useful::config::{ConfigLoader, ConfigSource};
//! use useful::creator::{Arguments, DottedPathResolver, TypeRegistry};
//! use useful::resource::ResourceLoader;
//!
//! struct Pool {
//!     size: i64,
//! }
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut registry = TypeRegistry::new();
//! registry.register("db.Pool", |args: Arguments| Ok(Pool { size: args.i64("size")? }));
//!
//! let loader = ConfigLoader::new(ResourceLoader::new(), DottedPathResolver::new(registry))
//!     .with_policy(CachePolicy::from_secs(30));
//! let config = loader.load(ConfigSource::detect("config/service.yaml")).await?;
//! let pool = config.get_path("storage.pool")?.downcast::<Pool>();
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod creator;
pub mod dictionary;
pub mod logging;
pub mod resource;
pub mod time;
pub mod utils;
pub mod value;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
