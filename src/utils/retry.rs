//! Opt-in retries with a fixed delay.
//!
//! Nothing else in the crate retries on its own. Callers that want a flaky download
//! or constructor to be attempted again wrap it explicitly:
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use useful::resource::ResourceLoader;
//! use useful::utils::retry;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let loader = ResourceLoader::new();
//! let graph = retry(3, Duration::from_millis(500), || loader.load("https://example.com/app.yaml")).await?;
//! # Ok(())
//! # }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;

/// Run `operation` once and then up to `retries` more times while it fails,
/// sleeping `delay` between attempts.
///
/// Every failure is logged at warn level. The last error is returned when all
/// attempts fail.
pub async fn retry<T, E, F, Fut>(retries: usize, delay: Duration, mut operation: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = retries + 1;
    let mut attempt = 0;

    let strategy = FixedInterval::new(delay).take(retries);
    Retry::start(strategy, || {
        attempt += 1;
        let current = attempt;
        let future = operation();
        async move {
            future.await.inspect_err(|error| {
                if current == attempts {
                    tracing::warn!(
                        attempt = current,
                        attempts,
                        "All retries failed: {error}"
                    );
                } else {
                    tracing::warn!(
                        attempt = current,
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Caught error, retrying: {error}"
                    );
                }
            })
        }
    })
    .await
}
