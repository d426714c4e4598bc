//! Memoized stored-path → URL resolution.
//!
//! Resolved URLs live for the whole process and are never invalidated: a
//! stored path always maps to the same URL, so a racing first resolution
//! just writes the same value twice.
//!
//! The cache is a service handed to the resolver rather than a global, so
//! tests and embedders can inject their own. [`MemoryUrlCache`] is a cheap
//! cloneable handle; every clone sees the same entries.

use crate::types::StoredPath;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Key-value store for resolved URLs.
pub trait UrlCache {
    fn get(&self, path: &StoredPath) -> Option<String>;
    fn set(&self, path: &StoredPath, url: String);
}

/// Process-lifetime in-memory cache.
#[derive(Debug, Clone, Default)]
pub struct MemoryUrlCache {
    entries: Arc<RwLock<HashMap<StoredPath, String>>>,
}

impl MemoryUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UrlCache for MemoryUrlCache {
    fn get(&self, path: &StoredPath) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    fn set(&self, path: &StoredPath, url: String) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.clone(), url);
    }
}

/// Outcome counts for a resolver's lifetime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub placeholders: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn placeholder(&mut self) {
        self.placeholders += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses + self.placeholders
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.placeholders > 0 {
            write!(
                f,
                "{} cached, {} resolved, {} placeholder ({} total)",
                self.hits,
                self.misses,
                self.placeholders,
                self.total()
            )
        } else if self.hits > 0 {
            write!(
                f,
                "{} cached, {} resolved ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} resolved", self.misses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_miss_then_hit() {
        let cache = MemoryUrlCache::new();
        let path = StoredPath::new("news/a.jpg");
        assert_eq!(cache.get(&path), None);

        cache.set(&path, "https://cdn/news/a.jpg".into());
        assert_eq!(cache.get(&path).as_deref(), Some("https://cdn/news/a.jpg"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clones_share_entries() {
        let cache = MemoryUrlCache::new();
        let other = cache.clone();
        other.set(&StoredPath::new("a"), "u".into());
        assert_eq!(cache.get(&StoredPath::new("a")).as_deref(), Some("u"));
    }

    #[test]
    fn set_is_idempotent() {
        let cache = MemoryUrlCache::new();
        let path = StoredPath::new("a");
        cache.set(&path, "u".into());
        cache.set(&path, "u".into());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_stats_display_only_misses() {
        let stats = CacheStats {
            misses: 3,
            ..CacheStats::default()
        };
        assert_eq!(stats.to_string(), "3 resolved");
    }

    #[test]
    fn cache_stats_display_with_hits() {
        let stats = CacheStats {
            hits: 4,
            misses: 1,
            placeholders: 0,
        };
        assert_eq!(stats.to_string(), "4 cached, 1 resolved (5 total)");
    }

    #[test]
    fn cache_stats_display_with_placeholders() {
        let mut stats = CacheStats::default();
        stats.hit();
        stats.miss();
        stats.placeholder();
        stats.placeholder();
        assert_eq!(
            stats.to_string(),
            "1 cached, 1 resolved, 2 placeholder (4 total)"
        );
    }
}
