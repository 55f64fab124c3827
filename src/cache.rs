//! TTL cache for query responses.
//!
//! Responses of the query endpoint are cached under a key derived from the
//! connection string and the normalized query text. Entries expire after the
//! configured TTL; reads never return an expired entry and a background task
//! sweeps the map periodically so abandoned keys do not accumulate.

use crate::models::QueryResponse;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Sweep interval for the background cleanup task.
const CLEANUP_INTERVAL_SECS: u64 = 30;

struct CacheEntry {
    response: QueryResponse,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() > ttl
    }
}

/// Build the cache key for a query. The query text is normalized so casing
/// and surrounding whitespace do not defeat the cache; the connection string
/// participates raw because it selects the data source.
pub fn cache_key(connection_string: Option<&str>, query: &str) -> String {
    format!(
        "{}\n{}",
        connection_string.unwrap_or(""),
        query.trim().to_lowercase()
    )
}

#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl QueryCache {
    /// Create a new cache with the given entry TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Look up a cached response. Returns a copy flagged as a cache hit.
    pub async fn get(&self, key: &str) -> Option<QueryResponse> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.is_expired(self.ttl) {
            return None;
        }
        let mut response = entry.response.clone();
        response.mark_cache_hit();
        debug!(key_len = key.len(), "Cache hit");
        Some(response)
    }

    /// Store a response.
    pub async fn put(&self, key: String, response: QueryResponse) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                response,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        info!(dropped, "Cache cleared");
    }

    /// Number of live (non-expired) entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries
            .values()
            .filter(|e| !e.is_expired(self.ttl))
            .count()
    }

    /// Whether the cache holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove expired entries.
    pub async fn sweep(&self) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(self.ttl));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "Swept expired cache entries");
        }
    }

    /// Start a background task to sweep expired entries.
    ///
    /// This should be called once when the server starts.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));
            loop {
                interval.tick().await;
                self.sweep().await;
            }
        });
    }
}
