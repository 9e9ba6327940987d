// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Enhancement Cache
//!
//! Memoizes free-text query rewrites and collapses concurrent identical
//! requests into a single outbound call.
//!
//! # Flow
//!
//! ```text
//! enhance(query)
//!       │
//!       ├─→ empty / "*" / disabled → query
//!       │
//!       ├─→ completed hit          → cached rewrite
//!       │
//!       ├─→ in-flight hit          → await the same OnceCell
//!       │
//!       └─→ miss: register OnceCell, call enhancer under timeout
//!                │
//!                ├─→ rewrite     → cache + return
//!                └─→ any failure → cache + return query
//! ```
//!
//! Both maps sit behind one mutex that is never held across an await, so
//! there is no instant where a key is in neither map while its call settles.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::QueryEnhancementConfig;
use crate::metrics;
use crate::request::{SearchRequest, MATCH_ALL};

use super::enhancer::QueryEnhancer;

#[derive(Default)]
struct CacheState {
    /// raw query → rewrite (or the raw query itself after a failure)
    completed: HashMap<String, String>,
    /// raw query → pending call shared by every concurrent caller
    in_flight: HashMap<String, Arc<OnceCell<String>>>,
}

/// Single-flight, timeout-bounded query enhancement cache.
pub struct QueryEnhancementCache {
    enhancer: Arc<dyn QueryEnhancer>,
    enabled: bool,
    timeout: Duration,
    state: Mutex<CacheState>,
    /// Served from `completed`
    hits: AtomicU64,
    /// Outbound calls started
    misses: AtomicU64,
    /// Callers that joined an in-flight call
    coalesced: AtomicU64,
    /// Outbound calls that fell back to the original query
    fallbacks: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub fallbacks: u64,
    /// Current number of completed entries
    pub entry_count: usize,
    /// Calls currently in flight
    pub in_flight: usize,
}

impl QueryEnhancementCache {
    pub fn new(enhancer: Arc<dyn QueryEnhancer>, config: &QueryEnhancementConfig) -> Self {
        Self {
            enhancer,
            enabled: config.enabled,
            timeout: config.timeout(),
            state: Mutex::new(CacheState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enhanced text for `query`, or `query` itself. Never fails.
    pub async fn enhance(&self, query: &str) -> String {
        if query.is_empty() || query == MATCH_ALL || !self.enabled {
            return query.to_string();
        }

        let cell = {
            let mut state = self.state.lock();
            if let Some(cached) = state.completed.get(query) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_enhancement("hit");
                debug!(query = %query, "Using cached query enhancement");
                return cached.clone();
            }
            match state.in_flight.get(query) {
                Some(pending) => {
                    self.coalesced.fetch_add(1, Ordering::Relaxed);
                    metrics::record_enhancement("coalesced");
                    debug!(query = %query, "Waiting for in-flight query enhancement");
                    Arc::clone(pending)
                }
                None => {
                    let pending = Arc::new(OnceCell::new());
                    state.in_flight.insert(query.to_string(), Arc::clone(&pending));
                    pending
                }
            }
        };

        cell.get_or_init(|| self.perform(query)).await.clone()
    }

    /// Outbound call plus settle. Runs at most once per in-flight cell.
    async fn perform(&self, query: &str) -> String {
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(query = %query, "Calling query enhancement service");

        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.enhancer.enhance(query)).await {
            Ok(Ok(Some(rewritten))) => {
                debug!(query = %query, enhanced = %rewritten, "Query enhanced");
                metrics::record_enhancement("success");
                rewritten
            }
            Ok(Ok(None)) => {
                debug!(query = %query, "No enhancement returned");
                metrics::record_enhancement("no_rewrite");
                query.to_string()
            }
            Ok(Err(e)) => {
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                metrics::record_enhancement("error");
                warn!(query = %query, error = %e, "Query enhancement failed, using original query");
                query.to_string()
            }
            Err(_) => {
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                metrics::record_enhancement("timeout");
                warn!(
                    query = %query,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Query enhancement timed out, using original query"
                );
                query.to_string()
            }
        };
        metrics::record_enhancement_latency(start.elapsed());

        let mut state = self.state.lock();
        state.completed.insert(query.to_string(), result.clone());
        state.in_flight.remove(query);
        metrics::set_enhancement_cache_entries(state.completed.len());
        result
    }

    /// Enhance every distinct query in the batch concurrently.
    ///
    /// Requests whose query did not change are returned borrowed; only the
    /// rewritten ones are copied. Order and length always match the input.
    pub async fn enhance_all<'r>(&self, requests: &'r [SearchRequest]) -> Vec<Cow<'r, SearchRequest>> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = requests
            .iter()
            .filter_map(SearchRequest::enhanceable_query)
            .filter(|q| seen.insert(*q))
            .collect();

        if unique.is_empty() || !self.enabled {
            return requests.iter().map(Cow::Borrowed).collect();
        }

        debug!(
            requests = requests.len(),
            unique_queries = unique.len(),
            "Enhancing search requests"
        );

        let enhanced = join_all(unique.iter().map(|q| self.enhance(q))).await;
        let lookup: HashMap<&str, String> = unique.into_iter().zip(enhanced).collect();

        requests
            .iter()
            .map(|request| {
                match request
                    .enhanceable_query()
                    .and_then(|q| lookup.get(q).filter(|enhanced| enhanced.as_str() != q))
                {
                    Some(enhanced) => Cow::Owned(request.with_query(enhanced.as_str())),
                    None => Cow::Borrowed(request),
                }
            })
            .collect()
    }

    /// Cached value without triggering a call.
    pub fn get(&self, query: &str) -> Option<String> {
        self.state.lock().completed.get(query).cloned()
    }

    pub fn stats(&self) -> EnhancementCacheStats {
        let state = self.state.lock();
        EnhancementCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            entry_count: state.completed.len(),
            in_flight: state.in_flight.len(),
        }
    }

    /// Empty both maps. Calls already running still settle, into a fresh map.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.completed.clear();
        state.in_flight.clear();
        metrics::set_enhancement_cache_entries(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhancement::EnhancementError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    /// Scripted enhancer that counts calls.
    struct MockEnhancer {
        calls: AtomicUsize,
        delay: fn(&str) -> Duration,
        reply: fn(&str) -> Result<Option<String>, EnhancementError>,
    }

    fn no_delay(_: &str) -> Duration {
        Duration::ZERO
    }

    impl MockEnhancer {
        fn new(reply: fn(&str) -> Result<Option<String>, EnhancementError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: no_delay,
                reply,
            }
        }

        /// Delay per query text.
        fn with_delay(mut self, delay: fn(&str) -> Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueryEnhancer for MockEnhancer {
        async fn enhance(&self, query: &str) -> Result<Option<String>, EnhancementError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = (self.delay)(query);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            (self.reply)(query)
        }
    }

    fn upper(q: &str) -> Result<Option<String>, EnhancementError> {
        Ok(Some(q.to_uppercase()))
    }

    fn enabled() -> QueryEnhancementConfig {
        QueryEnhancementConfig {
            enabled: true,
            url: "http://enhancer.test".into(),
            timeout: 5000,
        }
    }

    fn cache(enhancer: &Arc<MockEnhancer>) -> QueryEnhancementCache {
        QueryEnhancementCache::new(enhancer.clone(), &enabled())
    }

    fn request(index: &str, query: Option<&str>) -> SearchRequest {
        serde_json::from_value(json!({ "indexName": index, "params": { "query": query } })).unwrap()
    }

    #[tokio::test]
    async fn test_empty_and_wildcard_skip_call() {
        let enhancer = Arc::new(MockEnhancer::new(upper));
        let cache = cache(&enhancer);

        assert_eq!(cache.enhance("").await, "");
        assert_eq!(cache.enhance("*").await, "*");
        assert_eq!(enhancer.calls(), 0);
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[tokio::test]
    async fn test_disabled_skips_call() {
        let enhancer = Arc::new(MockEnhancer::new(upper));
        let cache = QueryEnhancementCache::new(enhancer.clone(), &QueryEnhancementConfig::default());

        assert_eq!(cache.enhance("shoes").await, "shoes");
        assert_eq!(enhancer.calls(), 0);
    }

    #[tokio::test]
    async fn test_cached_result_reused() {
        let enhancer = Arc::new(MockEnhancer::new(upper));
        let cache = cache(&enhancer);

        assert_eq!(cache.enhance("shoes").await, "SHOES");
        assert_eq!(cache.enhance("shoes").await, "SHOES");
        assert_eq!(enhancer.calls(), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_identical_queries_single_flight() {
        let enhancer = Arc::new(MockEnhancer::new(upper).with_delay(|_| Duration::from_millis(100)));
        let cache = cache(&enhancer);

        let (a, b, c) = tokio::join!(cache.enhance("shoes"), cache.enhance("shoes"), cache.enhance("shoes"));
        assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("SHOES", "SHOES", "SHOES"));
        assert_eq!(enhancer.calls(), 1);
        assert_eq!(cache.stats().coalesced, 2);
        assert_eq!(cache.stats().in_flight, 0);
    }

    #[tokio::test]
    async fn test_error_falls_back_and_is_cached() {
        fn fail(_: &str) -> Result<Option<String>, EnhancementError> {
            Err(EnhancementError::Status(500))
        }
        let enhancer = Arc::new(MockEnhancer::new(fail));
        let cache = cache(&enhancer);

        assert_eq!(cache.enhance("original query").await, "original query");
        assert_eq!(cache.get("original query").as_deref(), Some("original query"));
        assert_eq!(cache.enhance("original query").await, "original query");
        assert_eq!(enhancer.calls(), 1);
        assert_eq!(cache.stats().fallbacks, 1);
    }

    #[tokio::test]
    async fn test_no_rewrite_returns_original() {
        fn none(_: &str) -> Result<Option<String>, EnhancementError> {
            Ok(None)
        }
        let enhancer = Arc::new(MockEnhancer::new(none));
        let cache = cache(&enhancer);
        assert_eq!(cache.enhance("original query").await, "original query");
        assert_eq!(cache.stats().fallbacks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let enhancer = Arc::new(MockEnhancer::new(upper).with_delay(|_| Duration::from_secs(6)));
        let cache = cache(&enhancer);

        assert_eq!(cache.enhance("original query").await, "original query");
        assert_eq!(cache.get("original query").as_deref(), Some("original query"));
        assert_eq!(cache.stats().fallbacks, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_only_affects_its_own_query() {
        fn bang(q: &str) -> Result<Option<String>, EnhancementError> {
            Ok(Some(format!("{}!", q)))
        }
        fn by_query(q: &str) -> Duration {
            match q {
                "slow" => Duration::from_secs(6),
                "mid" => Duration::from_millis(300),
                _ => Duration::from_millis(10),
            }
        }
        let enhancer = Arc::new(MockEnhancer::new(bang).with_delay(by_query));
        let cache = cache(&enhancer);

        let requests = vec![
            request("a", Some("slow")),
            request("b", Some("mid")),
            request("c", Some("fast")),
        ];
        let enhanced = cache.enhance_all(&requests).await;

        let queries: Vec<_> = enhanced.iter().map(|r| r.params.query.as_deref()).collect();
        assert_eq!(queries, vec![Some("slow"), Some("mid!"), Some("fast!")]);
        assert_eq!(enhancer.calls(), 3);

        let stats = cache.stats();
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.entry_count, 3);
        assert_eq!(cache.get("mid").as_deref(), Some("mid!"));
    }

    #[tokio::test]
    async fn test_clear_empties_cache() {
        let enhancer = Arc::new(MockEnhancer::new(upper));
        let cache = cache(&enhancer);

        cache.enhance("shoes").await;
        cache.clear();
        assert_eq!(cache.stats().entry_count, 0);
        cache.enhance("shoes").await;
        assert_eq!(enhancer.calls(), 2);
    }

    #[tokio::test]
    async fn test_enhance_all_dedups_and_preserves_identity() {
        fn only_shoes(q: &str) -> Result<Option<String>, EnhancementError> {
            Ok((q == "shoes").then(|| "SHOES".to_string()))
        }
        let enhancer = Arc::new(MockEnhancer::new(only_shoes));
        let cache = cache(&enhancer);

        let requests = vec![
            request("a", Some("shoes")),
            request("b", Some("socks")),
            request("c", Some("shoes")),
            request("d", None),
            request("e", Some("*")),
        ];
        let enhanced = cache.enhance_all(&requests).await;

        assert_eq!(enhanced.len(), 5);
        assert_eq!(enhancer.calls(), 2);
        assert!(matches!(enhanced[0], Cow::Owned(_)));
        assert_eq!(enhanced[0].params.query.as_deref(), Some("SHOES"));
        assert!(matches!(enhanced[1], Cow::Borrowed(_)));
        assert_eq!(enhanced[2].params.query.as_deref(), Some("SHOES"));
        assert_eq!(enhanced[2].index_name, "c");
        assert!(matches!(enhanced[3], Cow::Borrowed(_)));
        assert!(matches!(enhanced[4], Cow::Borrowed(_)));

        // originals untouched
        assert_eq!(requests[0].params.query.as_deref(), Some("shoes"));
    }

    #[tokio::test]
    async fn test_enhance_all_without_queries() {
        let enhancer = Arc::new(MockEnhancer::new(upper));
        let cache = cache(&enhancer);
        let requests = vec![request("a", None), request("b", Some(""))];

        let enhanced = cache.enhance_all(&requests).await;
        assert!(enhanced.iter().all(|r| matches!(r, Cow::Borrowed(_))));
        assert_eq!(enhancer.calls(), 0);
    }
}
