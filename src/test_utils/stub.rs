use crate::core::UsefulError;
use crate::resource::{FetchParse, Fetched, FreshnessToken};
use crate::value::ValueGraph;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
enum Document {
    Ready { value: ValueGraph, token: FreshnessToken },
    Failing { reason: String },
}

#[derive(Default)]
struct State {
    documents: Mutex<HashMap<String, Document>>,
    fetches: Mutex<HashMap<String, usize>>,
    fetch_total: AtomicUsize,
    check_total: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

/// In-memory [`FetchParse`] with call counters.
///
/// Clones share state, so a test keeps one handle for assertions and hands another
/// to the code under test.
#[derive(Clone, Default)]
pub struct StubFetcher {
    state: Arc<State>,
}

impl StubFetcher {
    /// A fetcher that knows no documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `value` for `uri` with freshness `token`.
    pub fn set(&self, uri: &str, value: serde_json::Value, token: &str) {
        self.set_graph(uri, ValueGraph::from_json(&value), token);
    }

    /// Serve an already built graph for `uri`.
    pub fn set_graph(&self, uri: &str, value: ValueGraph, token: &str) {
        self.documents().insert(
            uri.to_string(),
            Document::Ready {
                value,
                token: FreshnessToken::new(token),
            },
        );
    }

    /// Make every fetch and freshness check of `uri` fail.
    pub fn fail(&self, uri: &str, reason: &str) {
        self.documents().insert(
            uri.to_string(),
            Document::Failing {
                reason: reason.to_string(),
            },
        );
    }

    /// Sleep this long inside every call, to make concurrent calls overlap.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    /// Number of `fetch_parse` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.state.fetch_total.load(Ordering::SeqCst)
    }

    /// Number of `fetch_parse` calls for one URI.
    pub fn fetch_count_for(&self, uri: &str) -> usize {
        self.fetches().get(uri).copied().unwrap_or_default()
    }

    /// Number of `check_freshness` calls so far.
    pub fn check_count(&self) -> usize {
        self.state.check_total.load(Ordering::SeqCst)
    }

    fn documents(&self) -> std::sync::MutexGuard<'_, HashMap<String, Document>> {
        self.state.documents.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fetches(&self) -> std::sync::MutexGuard<'_, HashMap<String, usize>> {
        self.state.fetches.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn pause(&self) {
        let delay = *self.state.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn lookup(&self, uri: &str) -> Result<(ValueGraph, FreshnessToken), UsefulError> {
        match self.documents().get(uri).cloned() {
            Some(Document::Ready { value, token }) => Ok((value, token)),
            Some(Document::Failing { reason }) => Err(UsefulError::fetch(uri, reason)),
            None => Err(UsefulError::fetch(uri, "no such document")),
        }
    }
}

#[async_trait]
impl FetchParse for StubFetcher {
    async fn fetch_parse(&self, uri: &str) -> Result<Fetched, UsefulError> {
        self.state.fetch_total.fetch_add(1, Ordering::SeqCst);
        *self.fetches().entry(uri.to_string()).or_default() += 1;
        self.pause().await;

        let (value, token) = self.lookup(uri)?;
        Ok(Fetched { value, token })
    }

    async fn check_freshness(&self, uri: &str) -> Result<FreshnessToken, UsefulError> {
        self.state.check_total.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        self.lookup(uri).map(|(_, token)| token)
    }
}
