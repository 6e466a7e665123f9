//! Many tasks loading through one shared cache.

use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use useful::cache::{CachePolicy, ResourceCache};
use useful::test_utils::StubFetcher;

#[tokio::test(start_paused = true)]
async fn test_concurrent_loads_share_one_fetch_per_uri() {
    let fetcher = StubFetcher::new();
    fetcher.set_delay(Duration::from_millis(50));
    for i in 0..4 {
        fetcher.set(&format!("mem://doc-{i}"), json!({"doc": i}), "v1");
    }
    let cache = ResourceCache::new(fetcher.clone());

    let tasks = (0..32).map(|n| {
        let cache = cache.clone();
        tokio::spawn(async move {
            let uri = format!("mem://doc-{}", n % 4);
            cache.load(&uri, CachePolicy::from_secs(60)).await
        })
    });
    let results = join_all(tasks).await;

    for result in results {
        result.unwrap().unwrap();
    }
    for i in 0..4 {
        assert_eq!(fetcher.fetch_count_for(&format!("mem://doc-{i}")), 1);
    }
    assert_eq!(fetcher.fetch_count(), 4);
    assert_eq!(cache.len().await, 4);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_revalidation_returns_same_value() {
    let fetcher = StubFetcher::new();
    fetcher.set("mem://app", json!({"k": "v"}), "v1");
    let cache = ResourceCache::new(fetcher.clone());
    let first = cache.load("mem://app", CachePolicy::Revalidate).await.unwrap();

    fetcher.set_delay(Duration::from_millis(10));
    let loads = (0..8).map(|_| cache.load("mem://app", CachePolicy::Revalidate));
    let values = join_all(loads).await;

    for value in values {
        assert!(Arc::ptr_eq(&first, &value.unwrap()));
    }
    assert_eq!(fetcher.fetch_count(), 1);
    assert_eq!(fetcher.check_count(), 8);
}
