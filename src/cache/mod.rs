//! Page cache for the global post listing.
//!
//! Rendered responses are kept for a fixed time-to-live under a static key
//! prefix. Writes never invalidate entries, so visitors may see a listing
//! that is up to one TTL old; `PageCache::clear` forces a fresh render.
//!
//! ```toml
//! [cache]
//! enabled = true
//! index_ttl_seconds = 20
//! capacity = 256
//! key_prefix = "index_page"
//! ```

mod config;
mod lock;
mod middleware;
mod store;

pub use config::PageCacheConfig;
pub use middleware::page_cache_layer;
pub use store::{CacheStoreError, CachedResponse, PageCache, buffer_response, should_store_response};

pub const METRIC_PAGE_CACHE_HIT: &str = "jotter_page_cache_hit_total";
pub const METRIC_PAGE_CACHE_MISS: &str = "jotter_page_cache_miss_total";
pub const METRIC_PAGE_CACHE_EXPIRED: &str = "jotter_page_cache_expired_total";
pub const METRIC_PAGE_CACHE_PURGE: &str = "jotter_page_cache_purge_total";
