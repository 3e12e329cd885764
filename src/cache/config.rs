//! Page cache configuration.

use std::{num::NonZeroUsize, time::Duration};

use crate::config::CacheSettings;

const DEFAULT_TTL_SECS: u64 = 20;
const DEFAULT_CAPACITY: usize = 256;
const DEFAULT_KEY_PREFIX: &str = "index_page";

#[derive(Debug, Clone)]
pub struct PageCacheConfig {
    /// Install the middleware at all.
    pub enabled: bool,
    /// Lifetime of a stored page, measured from when it was stored.
    pub ttl: Duration,
    /// Maximum number of stored pages before LRU eviction.
    pub capacity: usize,
    /// Static prefix of every key.
    pub key_prefix: String,
}

impl Default for PageCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            capacity: DEFAULT_CAPACITY,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl From<&CacheSettings> for PageCacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: settings.index_ttl,
            capacity: settings.capacity.get() as usize,
            key_prefix: settings.key_prefix.clone(),
        }
    }
}

impl PageCacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = PageCacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl, Duration::from_secs(20));
        assert_eq!(config.capacity, 256);
        assert_eq!(config.key_prefix, "index_page");
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = PageCacheConfig {
            capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.capacity_non_zero().get(), 1);
    }
}
