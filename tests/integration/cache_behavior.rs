//! Cache regimes over real files, with time driven by a paused clock.

use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use useful::cache::{CachePolicy, ResourceCache};
use useful::resource::ResourceLoader;
use useful::test_utils::ConfigFixture;
use useful::value::ValueGraph;

/// Cache whose hook counts how often a document was fetched and parsed.
fn counting_cache(parsed: Arc<AtomicUsize>) -> ResourceCache<serde_json::Value> {
    ResourceCache::with_hook(ResourceLoader::new(), move |graph: ValueGraph| {
        parsed.fetch_add(1, Ordering::SeqCst);
        Ok(graph.root_json())
    })
}

#[tokio::test(start_paused = true)]
async fn test_ttl_serves_without_io_inside_window() -> Result<()> {
    let fixture = ConfigFixture::new()?;
    let uri = fixture.write("app.json", r#"{"version": 1}"#)?;
    let parsed = Arc::new(AtomicUsize::new(0));
    let cache = counting_cache(Arc::clone(&parsed));
    let policy = CachePolicy::from_secs(5);

    let first = cache.load(&uri, policy).await?;
    fixture.write("app.json", r#"{"version": 2}"#)?;

    tokio::time::advance(Duration::from_secs(1)).await;
    let second = cache.load(&uri, policy).await?;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second["version"], 1);
    assert_eq!(parsed.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(5)).await;
    let third = cache.load(&uri, policy).await?;
    assert_eq!(third["version"], 2);
    assert_eq!(parsed.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn test_revalidate_refetches_only_changed_content() -> Result<()> {
    let fixture = ConfigFixture::new()?;
    let uri = fixture.write("app.yaml", "name: one\n")?;
    let parsed = Arc::new(AtomicUsize::new(0));
    let cache = counting_cache(Arc::clone(&parsed));

    let first = cache.load(&uri, CachePolicy::Revalidate).await?;
    let again = cache.load(&uri, CachePolicy::Revalidate).await?;
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(parsed.load(Ordering::SeqCst), 1);

    fixture.write("app.yaml", "name: two\n")?;
    let changed = cache.load(&uri, CachePolicy::Revalidate).await?;
    assert_eq!(changed["name"], "two");
    assert_eq!(parsed.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn test_never_always_fetches() -> Result<()> {
    let fixture = ConfigFixture::new()?;
    let uri = fixture.write("data.csv", "a,b\n1,2\n")?;
    let parsed = Arc::new(AtomicUsize::new(0));
    let cache = counting_cache(Arc::clone(&parsed));

    for _ in 0..3 {
        let rows = cache.load(&uri, CachePolicy::from_secs(-1)).await?;
        assert_eq!(*rows, serde_json::json!([["a", "b"], ["1", "2"]]));
    }
    assert_eq!(parsed.load(Ordering::SeqCst), 3);
    assert!(cache.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn test_missing_file_keeps_previous_entry() -> Result<()> {
    let fixture = ConfigFixture::new()?;
    let uri = fixture.write("app.json", r#"{"ok": true}"#)?;
    let cache = counting_cache(Arc::default());

    cache.load(&uri, CachePolicy::Revalidate).await?;
    std::fs::remove_file(fixture.file("app.json"))?;

    assert!(cache.load(&uri, CachePolicy::Revalidate).await.is_err());
    assert_eq!(cache.len().await, 1);

    fixture.write("app.json", r#"{"ok": true}"#)?;
    let value = cache.load(&uri, CachePolicy::Revalidate).await?;
    assert_eq!(value["ok"], true);
    Ok(())
}
