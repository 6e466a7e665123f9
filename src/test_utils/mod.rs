//! Test utilities for useful
//!
//! Helpers shared by unit tests and the integration suite:
//! - [`init_test_logging`] installs a test-friendly tracing subscriber once
//! - [`StubFetcher`] is an in-memory [`FetchParse`](crate::resource::FetchParse)
//!   that counts calls, for exercising the cache without I/O
//! - [`fixtures`] writes configuration files into temporary directories
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use useful::cache::{CachePolicy, ResourceCache};
//! use useful::test_utils::StubFetcher;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let fetcher = StubFetcher::new();
//! fetcher.set("mem://a", json!({"k": 1}), "v1");
//!
//! let cache = ResourceCache::new(fetcher.clone());
//! cache.load("mem://a", CachePolicy::Revalidate).await?;
//! assert_eq!(fetcher.fetch_count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
mod stub;

pub use fixtures::ConfigFixture;
pub use stub::StubFetcher;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise `RUST_LOG`
/// when set, otherwise installs nothing.
///
/// ```bash
/// RUST_LOG=useful=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
