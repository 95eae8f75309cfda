//! Time-boxed in-memory cache of raw UEX responses.
//!
//! Entries are keyed by endpoint plus the query pairs sent with it, so
//! `commodities_prices?id_terminal=1` and `?id_commodity=1` never collide.
//! Values are kept as `serde_json::Value` and decoded by the caller.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use serde_json::Value;
use tokio::sync::Mutex;

/// UEX refreshes prices every few minutes; five minutes keeps a search consistent.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    endpoint: String,
    params: Vec<(String, String)>,
}

impl CacheKey {
    pub fn new(endpoint: &str, params: &[(&str, String)]) -> Self {
        let mut params: Vec<(String, String)> = params
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect();
        params.sort();
        Self {
            endpoint: endpoint.trim_matches('/').to_string(),
            params,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

struct Cached<T> {
    value: T,
    fetched_at: Instant,
}

impl<T: Clone> Cached<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    fn if_fresh(&self, ttl: Duration) -> Option<T> {
        (self.fetched_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

/// A TTL of zero disables caching.
pub struct ResponseCache {
    entries: Mutex<HashMap<CacheKey, Cached<Value>>>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut entries = self.entries.lock().await;
        match entries.get(key).map(|entry| entry.if_fresh(self.ttl)) {
            Some(Some(value)) => Some(value),
            Some(None) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: CacheKey, value: Value) {
        if self.ttl.is_zero() {
            return;
        }
        let ttl = self.ttl;
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.if_fresh(ttl).is_some());
        entries.insert(key, Cached::new(value));
    }

    /// Drop every entry for `endpoint`, whatever its parameters.
    pub async fn invalidate(&self, endpoint: &str) {
        let endpoint = endpoint.trim_matches('/');
        self.entries
            .lock()
            .await
            .retain(|key, _| key.endpoint() != endpoint);
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
