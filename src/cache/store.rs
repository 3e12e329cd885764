//! Rendered-page storage with a fixed time-to-live.

use std::sync::RwLock;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use http_body_util::BodyExt;
use lru::LruCache;
use metrics::counter;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use super::config::PageCacheConfig;
use super::lock::{rw_read, rw_write};
use super::{
    METRIC_PAGE_CACHE_EXPIRED, METRIC_PAGE_CACHE_HIT, METRIC_PAGE_CACHE_MISS,
    METRIC_PAGE_CACHE_PURGE,
};

const SOURCE: &str = "cache::store";

/// Fully buffered HTTP response.
#[derive(Clone, Debug)]
pub struct CachedResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl CachedResponse {
    pub fn new(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        let headers = headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Self {
            status,
            headers,
            body,
        }
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.append(name, value);
        }

        response
    }
}

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("failed to buffer response body: {0}")]
    Buffer(String),
}

/// Only plain `200 OK` responses that do not set cookies are stored; a
/// cookie would leak one visitor's session to everyone else.
pub fn should_store_response(response: &Response) -> bool {
    response.status() == StatusCode::OK && !response.headers().contains_key(header::SET_COOKIE)
}

/// Collect the body so it can be both stored and sent.
pub async fn buffer_response(
    response: Response,
) -> Result<(Response, CachedResponse), (Response, CacheStoreError)> {
    let (parts, body) = response.into_parts();
    match BodyExt::collect(body).await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            let cached = CachedResponse::new(parts.status, &parts.headers, bytes.clone());
            let rebuilt = Response::from_parts(parts, Body::from(bytes));
            Ok((rebuilt, cached))
        }
        Err(error) => {
            let rebuilt = Response::from_parts(parts, Body::empty());
            Err((rebuilt, CacheStoreError::Buffer(error.to_string())))
        }
    }
}

struct Entry {
    response: CachedResponse,
    stored_at: Instant,
}

/// Process-wide page cache. Starts empty, keeps nothing across restarts.
///
/// Entries are never invalidated by writes; a page stays as rendered until
/// its TTL runs out or `clear` is called.
pub struct PageCache {
    config: PageCacheConfig,
    entries: RwLock<LruCache<String, Entry>>,
}

impl PageCache {
    pub fn new(config: PageCacheConfig) -> Self {
        let entries = RwLock::new(LruCache::new(config.capacity_non_zero()));
        Self { config, entries }
    }

    pub fn config(&self) -> &PageCacheConfig {
        &self.config
    }

    /// Key for a request target: `<prefix>:<path>`, plus `?<query>` when a
    /// query string is present. Visitor identity never takes part.
    pub fn key_for(&self, path: &str, query: Option<&str>) -> String {
        match query {
            Some(query) if !query.is_empty() => {
                format!("{}:{path}?{query}", self.config.key_prefix)
            }
            _ => format!("{}:{path}", self.config.key_prefix),
        }
    }

    /// Look up a live entry. Expired entries are dropped and reported as a miss.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        let mut entries = rw_write(&self.entries, SOURCE, "get");

        let Some(entry) = entries.get(key) else {
            counter!(METRIC_PAGE_CACHE_MISS).increment(1);
            debug!(target: "jotter::cache", key, outcome = "miss");
            return None;
        };

        if entry.stored_at.elapsed() >= self.config.ttl {
            entries.pop(key);
            counter!(METRIC_PAGE_CACHE_EXPIRED).increment(1);
            counter!(METRIC_PAGE_CACHE_MISS).increment(1);
            debug!(target: "jotter::cache", key, outcome = "expired");
            return None;
        }

        counter!(METRIC_PAGE_CACHE_HIT).increment(1);
        debug!(target: "jotter::cache", key, outcome = "hit");
        Some(entry.response.clone())
    }

    pub fn put(&self, key: String, response: CachedResponse) {
        let entry = Entry {
            response,
            stored_at: Instant::now(),
        };
        if let Some((evicted, _)) = rw_write(&self.entries, SOURCE, "put").push(key, entry) {
            debug!(target: "jotter::cache", key = %evicted, outcome = "replaced_or_evicted");
        }
    }

    /// Drop every entry so the next request renders afresh.
    pub fn clear(&self) {
        let mut entries = rw_write(&self.entries, SOURCE, "clear");
        let purged = entries.len();
        entries.clear();
        counter!(METRIC_PAGE_CACHE_PURGE).increment(1);
        debug!(target: "jotter::cache", purged, "page cache cleared");
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
