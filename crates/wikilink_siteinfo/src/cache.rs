//! Process-lifetime descriptor cache with single-flight fetches.
//!
//! Concurrent lookups for the same uncached key await one shared fetch
//! instead of issuing duplicates. Negative results are cached too, so a
//! misbehaving wiki is probed once per process lifetime unless refreshed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use wikilink_domain::site::SiteDescriptor;

type Entry = Arc<OnceCell<Option<Arc<SiteDescriptor>>>>;

#[derive(Default)]
pub struct SiteCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl SiteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached descriptor for `key`, fetching it at most once.
    /// Callers racing on an uncached key all await the same in-flight
    /// fetch.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Option<Arc<SiteDescriptor>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<Arc<SiteDescriptor>>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(key.to_owned()).or_default())
        };
        cell.get_or_init(fetch).await.clone()
    }

    /// Replaces the whole entry for `key` with a freshly fetched value.
    /// Readers holding the previous `Arc` keep a consistent snapshot.
    pub async fn refresh<F, Fut>(&self, key: &str, fetch: F) -> Option<Arc<SiteDescriptor>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<Arc<SiteDescriptor>>>,
    {
        let value = fetch().await;
        let cell = Arc::new(OnceCell::new_with(Some(value.clone())));
        self.entries.lock().await.insert(key.to_owned(), cell);
        value
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dummy_site() -> Arc<SiteDescriptor> {
        Arc::new(SiteDescriptor {
            url_pattern: "https://example.org/wiki/$1".into(),
            api_url: "https://example.org/w/api.php".into(),
            namespaces: vec![],
            interwiki: Default::default(),
            magic_words: vec![],
            case_sensitive: false,
            main_page: "Main Page".into(),
            lang: "en".into(),
        })
    }

    #[tokio::test]
    async fn test_fetch_happens_once() {
        let cache = SiteCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let got = cache
                .get_or_fetch("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Some(dummy_site())
                })
                .await;
            assert!(got.is_some());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let cache = Arc::new(SiteCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            Some(dummy_site())
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch("k", || fetch(Arc::clone(&calls))),
            cache.get_or_fetch("k", || fetch(Arc::clone(&calls))),
        );
        assert!(a.is_some() && b.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_negative_result_is_cached() {
        let cache = SiteCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let got = cache
                .get_or_fetch("down", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    None
                })
                .await;
            assert!(got.is_none());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_replaces_whole_entry() {
        let cache = SiteCache::new();
        let first = cache.get_or_fetch("k", || async { None }).await;
        assert!(first.is_none());

        let refreshed = cache.refresh("k", || async { Some(dummy_site()) }).await;
        assert!(refreshed.is_some());

        // A later lookup sees the refreshed value without fetching.
        let got = cache
            .get_or_fetch("k", || async {
                panic!("should not fetch after refresh")
            })
            .await;
        assert!(got.is_some());
    }
}
