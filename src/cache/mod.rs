//! Freshness-aware resource cache
//!
//! [`ResourceCache`] sits in front of a [`FetchParse`] implementation and decides,
//! per call, whether a resource has to be downloaded again. The decision is driven by
//! a [`CachePolicy`]:
//!
//! | Policy        | Entry present and younger than TTL | Otherwise                         |
//! |---------------|------------------------------------|-----------------------------------|
//! | `Never`       | n/a, the cache is bypassed         | full fetch every call             |
//! | `Revalidate`  | n/a                                | freshness check, fetch on change  |
//! | `Ttl(d)`      | stored value, no I/O               | freshness check, fetch on change  |
//!
//! An optional hook turns the parsed [`ValueGraph`] into the value actually cached
//! (for example a built object graph). A cache hit runs neither parser nor hook.
//!
//! # Concurrency
//!
//! Each URI has its own async mutex, stored in a [`DashMap`]. At most one freshness
//! check or fetch is in flight per URI; waiters observe the result of the call that
//! held the lock. Different URIs never wait on each other. The map shard lock is
//! never held across an `.await`.
//!
//! Time is read from [`tokio::time::Instant`], so tests can drive TTL expiry with a
//! paused clock.
//!
//! # Failure handling
//!
//! A failed freshness check, fetch or hook propagates its error and leaves the entry
//! exactly as it was. A URI whose first load fails is not kept in the map. Nothing is retried here; wrap calls in
//! [`retry`](crate::utils::retry) to opt in.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use useful::cache::{CachePolicy, ResourceCache};
//! use useful::resource::ResourceLoader;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cache = ResourceCache::new(ResourceLoader::new());
//! let policy = CachePolicy::Ttl(Duration::from_secs(30));
//!
//! let first = cache.load("config/app.yaml", policy).await?;
//! // Within 30 seconds: no I/O at all.
//! let second = cache.load("config/app.yaml", policy).await?;
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! # Ok(())
//! # }
//! ```

use crate::resource::{FetchParse, FreshnessToken};
use crate::value::ValueGraph;
use anyhow::Result;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// How a [`ResourceCache::load`] call may use the stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Always fetch; the cache is neither read nor written
    #[default]
    Never,
    /// Check freshness on every call and fetch only when the token changed
    Revalidate,
    /// Serve the stored value without I/O while it was checked less than this long ago
    Ttl(Duration),
}

impl CachePolicy {
    /// Map a signed timeout in seconds: negative is `Never`, zero is `Revalidate`,
    /// positive is `Ttl`.
    pub fn from_secs(timeout: i64) -> Self {
        match timeout {
            t if t < 0 => Self::Never,
            0 => Self::Revalidate,
            t => Self::Ttl(Duration::from_secs(t.unsigned_abs())),
        }
    }

    /// Fractional variant of [`from_secs`](Self::from_secs). `NaN` is `Never`.
    pub fn from_secs_f64(timeout: f64) -> Self {
        if timeout.is_nan() || timeout < 0.0 {
            Self::Never
        } else if timeout == 0.0 {
            Self::Revalidate
        } else {
            Self::Ttl(Duration::try_from_secs_f64(timeout).unwrap_or(Duration::MAX))
        }
    }
}

type Hook<T> = Arc<dyn Fn(ValueGraph) -> Result<T> + Send + Sync>;

struct CacheEntry<T> {
    last_checked_at: Instant,
    token: FreshnessToken,
    value: Arc<T>,
}

type Slot<T> = Arc<Mutex<Option<CacheEntry<T>>>>;

/// Time-windowed cache over a [`FetchParse`] capability.
///
/// Entries live as long as the cache value (and its clones). Clones share entries
/// and locks.
pub struct ResourceCache<T = ValueGraph> {
    fetcher: Arc<dyn FetchParse>,
    hook: Hook<T>,

    /// Per-URI slots. The async mutex serializes checks and fetches of one URI;
    /// `None` until the first successful load.
    entries: Arc<DashMap<String, Slot<T>>>,
}

impl<T> Clone for ResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            hook: Arc::clone(&self.hook),
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> fmt::Debug for ResourceCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("uris", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl ResourceCache<ValueGraph> {
    /// Cache parsed documents as they are.
    pub fn new(fetcher: impl FetchParse + 'static) -> Self {
        Self::with_hook(fetcher, Ok)
    }
}

impl<T: Send + Sync + 'static> ResourceCache<T> {
    /// Cache the result of `hook` applied to every freshly parsed document.
    pub fn with_hook<F>(fetcher: impl FetchParse + 'static, hook: F) -> Self
    where
        F: Fn(ValueGraph) -> Result<T> + Send + Sync + 'static,
    {
        Self::from_parts(Arc::new(fetcher), Arc::new(hook))
    }

    /// Build from an already shared fetcher and hook.
    pub fn from_parts(fetcher: Arc<dyn FetchParse>, hook: Hook<T>) -> Self {
        Self {
            fetcher,
            hook,
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Load `uri` according to `policy`.
    ///
    /// # Errors
    ///
    /// Propagates fetcher errors ([`UsefulError`](crate::core::UsefulError)) and hook
    /// errors unchanged. The stored entry is not modified on error.
    pub async fn load(&self, uri: &str, policy: CachePolicy) -> Result<Arc<T>> {
        let ttl = match policy {
            CachePolicy::Never => {
                debug!(url = uri, "Cache bypassed");
                return self.fetch(uri).await.map(|(value, _)| value);
            }
            CachePolicy::Revalidate => None,
            CachePolicy::Ttl(ttl) => Some(ttl),
        };

        let slot = self.slot(uri);
        let mut guard = slot.lock().await;
        let now = Instant::now();

        let Some(entry) = guard.as_mut() else {
            debug!(url = uri, "Cache miss");
            let (value, token) = match self.fetch(uri).await {
                Ok(fetched) => fetched,
                Err(error) => {
                    self.release_empty(uri, &slot);
                    return Err(error);
                }
            };
            *guard = Some(CacheEntry {
                last_checked_at: now,
                token,
                value: Arc::clone(&value),
            });
            return Ok(value);
        };

        if let Some(ttl) = ttl {
            let age = now.saturating_duration_since(entry.last_checked_at);
            if age < ttl {
                debug!(url = uri, age_ms = age.as_millis() as u64, "Cache hit within TTL");
                return Ok(Arc::clone(&entry.value));
            }
        }

        let token = self.fetcher.check_freshness(uri).await?;
        if token == entry.token {
            debug!(url = uri, "Cached resource is still fresh");
            entry.last_checked_at = now;
            return Ok(Arc::clone(&entry.value));
        }

        debug!(url = uri, old = %entry.token, new = %token, "Cached resource changed, refetching");
        let (value, token) = self.fetch(uri).await?;
        *entry = CacheEntry {
            last_checked_at: now,
            token,
            value: Arc::clone(&value),
        };
        Ok(value)
    }

    /// Forget `uri`. Returns whether it was tracked.
    pub fn invalidate(&self, uri: &str) -> bool {
        self.entries.remove(uri).is_some()
    }

    /// Number of URIs holding a cached value.
    ///
    /// Waits for in-flight loads to finish.
    pub async fn len(&self) -> usize {
        let slots: Vec<Slot<T>> = self.entries.iter().map(|slot| Arc::clone(slot.value())).collect();
        let mut count = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }

    /// `true` when nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn slot(&self, uri: &str) -> Slot<T> {
        Arc::clone(self.entries.entry(uri.to_string()).or_default().value())
    }

    /// Drop the slot of a URI whose first load failed. Called with the slot locked;
    /// a slot other callers already hold stays in the map.
    fn release_empty(&self, uri: &str, slot: &Slot<T>) {
        self.entries
            .remove_if(uri, |_, current| Arc::ptr_eq(current, slot) && Arc::strong_count(slot) == 2);
    }

    async fn fetch(&self, uri: &str) -> Result<(Arc<T>, FreshnessToken)> {
        let fetched = self.fetcher.fetch_parse(uri).await?;
        let value = (self.hook)(fetched.value)?;
        Ok((Arc::new(value), fetched.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UsefulError;
    use crate::test_utils::StubFetcher;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const URI: &str = "mem://config.yaml";

    fn stub() -> StubFetcher {
        let fetcher = StubFetcher::new();
        fetcher.set(URI, json!({"version": 1}), "v1");
        fetcher
    }

    #[test]
    fn test_policy_from_secs() {
        assert_eq!(CachePolicy::from_secs(-1), CachePolicy::Never);
        assert_eq!(CachePolicy::from_secs(0), CachePolicy::Revalidate);
        assert_eq!(CachePolicy::from_secs(5), CachePolicy::Ttl(Duration::from_secs(5)));
        assert_eq!(CachePolicy::from_secs_f64(f64::NAN), CachePolicy::Never);
        assert_eq!(CachePolicy::from_secs_f64(0.5), CachePolicy::Ttl(Duration::from_millis(500)));
        assert_eq!(CachePolicy::default(), CachePolicy::Never);
    }

    #[tokio::test]
    async fn test_never_always_fetches() {
        let fetcher = stub();
        let cache = ResourceCache::new(fetcher.clone());

        cache.load(URI, CachePolicy::Never).await.unwrap();
        cache.load(URI, CachePolicy::Never).await.unwrap();

        assert_eq!(fetcher.fetch_count(), 2);
        assert_eq!(fetcher.check_count(), 0);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_serves_without_io() {
        let fetcher = stub();
        let cache = ResourceCache::new(fetcher.clone());
        let policy = CachePolicy::Ttl(Duration::from_secs(5));

        let first = cache.load(URI, policy).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        let second = cache.load(URI, policy).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.fetch_count(), 1);
        assert_eq!(fetcher.check_count(), 0);

        tokio::time::advance(Duration::from_secs(5)).await;
        let third = cache.load(URI, policy).await.unwrap();
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(fetcher.fetch_count(), 1);
        assert_eq!(fetcher.check_count(), 1);

        // The check restarted the window.
        tokio::time::advance(Duration::from_secs(4)).await;
        cache.load(URI, policy).await.unwrap();
        assert_eq!(fetcher.check_count(), 1);
    }

    #[tokio::test]
    async fn test_revalidate_refetches_on_change() {
        let fetcher = stub();
        let cache = ResourceCache::new(fetcher.clone());

        cache.load(URI, CachePolicy::Revalidate).await.unwrap();
        let unchanged = cache.load(URI, CachePolicy::Revalidate).await.unwrap();
        assert_eq!(fetcher.fetch_count(), 1);
        assert_eq!(fetcher.check_count(), 1);
        assert_eq!(unchanged.root_json(), json!({"version": 1}));

        fetcher.set(URI, json!({"version": 2}), "v2");
        let changed = cache.load(URI, CachePolicy::Revalidate).await.unwrap();
        assert_eq!(fetcher.fetch_count(), 2);
        assert_eq!(changed.root_json(), json!({"version": 2}));
    }

    #[tokio::test]
    async fn test_failed_check_keeps_entry() {
        let fetcher = stub();
        let cache = ResourceCache::new(fetcher.clone());
        let original = cache.load(URI, CachePolicy::Revalidate).await.unwrap();

        fetcher.fail(URI, "connection reset");
        let error = cache.load(URI, CachePolicy::Revalidate).await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<UsefulError>(),
            Some(UsefulError::FetchError { .. })
        ));

        fetcher.set(URI, json!({"version": 1}), "v1");
        let again = cache.load(URI, CachePolicy::Revalidate).await.unwrap();
        assert!(Arc::ptr_eq(&original, &again));
        assert_eq!(fetcher.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_hook_runs_once_per_fetch() {
        let fetcher = stub();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = ResourceCache::with_hook(fetcher.clone(), move |graph: ValueGraph| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(graph.root_json().to_string())
        });

        let value = cache.load(URI, CachePolicy::Revalidate).await.unwrap();
        cache.load(URI, CachePolicy::Revalidate).await.unwrap();

        assert_eq!(*value, r#"{"version":1}"#);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_hook_keeps_entry() {
        let fetcher = stub();
        let cache = ResourceCache::with_hook(fetcher.clone(), |graph: ValueGraph| {
            let json = graph.root_json();
            anyhow::ensure!(json["version"] != 2, "version 2 is rejected");
            Ok(json)
        });

        let original = cache.load(URI, CachePolicy::Revalidate).await.unwrap();
        fetcher.set(URI, json!({"version": 2}), "v2");
        let error = cache.load(URI, CachePolicy::Revalidate).await.unwrap_err();
        assert!(error.to_string().contains("rejected"));

        fetcher.set(URI, json!({"version": 1}), "v1");
        let again = cache.load(URI, CachePolicy::Revalidate).await.unwrap();
        assert!(Arc::ptr_eq(&original, &again));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_fetch_in_flight_per_uri() {
        let fetcher = stub();
        fetcher.set_delay(Duration::from_millis(100));
        let cache = ResourceCache::new(fetcher.clone());

        let loads = (0..8).map(|_| cache.load(URI, CachePolicy::Revalidate));
        let results = futures::future::join_all(loads).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(fetcher.fetch_count(), 1);
        assert_eq!(fetcher.check_count(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_uris_load_in_parallel() {
        let fetcher = stub();
        fetcher.set("mem://other.yaml", json!({}), "o1");
        fetcher.set_delay(Duration::from_millis(100));
        let cache = ResourceCache::new(fetcher.clone());

        let started = Instant::now();
        let (a, b) = tokio::join!(
            cache.load(URI, CachePolicy::Revalidate),
            cache.load("mem://other.yaml", CachePolicy::Revalidate)
        );
        a.unwrap();
        b.unwrap();

        assert!(started.elapsed() < Duration::from_millis(200));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_failed_first_load_leaves_no_slot() {
        let fetcher = StubFetcher::new();
        let cache = ResourceCache::new(fetcher.clone());

        for i in 0..3 {
            let uri = format!("mem://missing-{i}.yaml");
            fetcher.fail(&uri, "gone");
            assert!(cache.load(&uri, CachePolicy::Revalidate).await.is_err());
        }
        assert!(cache.entries.is_empty());

        fetcher.set("mem://missing-0.yaml", json!({"version": 1}), "v1");
        cache.load("mem://missing-0.yaml", CachePolicy::Revalidate).await.unwrap();
        assert_eq!(cache.entries.len(), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_with_waiters_keeps_slot_shared() {
        let fetcher = StubFetcher::new();
        fetcher.fail(URI, "gone");
        fetcher.set_delay(Duration::from_millis(100));
        let cache = ResourceCache::new(fetcher.clone());

        let loads = (0..4).map(|_| cache.load(URI, CachePolicy::Revalidate));
        let results = futures::future::join_all(loads).await;

        assert!(results.iter().all(Result::is_err));
        assert_eq!(fetcher.fetch_count(), 4);
        assert!(cache.entries.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let fetcher = stub();
        let cache = ResourceCache::new(fetcher.clone());
        cache.load(URI, CachePolicy::Revalidate).await.unwrap();

        assert!(cache.invalidate(URI));
        assert!(!cache.invalidate(URI));
        cache.load(URI, CachePolicy::Revalidate).await.unwrap();
        assert_eq!(fetcher.fetch_count(), 2);
    }
}
