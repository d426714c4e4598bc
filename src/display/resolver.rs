//! Stored path → URL, through sentinels, cache, and the path rule.
//!
//! Resolution order:
//!
//! 1. Empty path or reserved sentinel: placeholder. Neither the cache nor
//!    the rule is consulted.
//! 2. Cache hit: the cached URL.
//! 3. Miss: the rule computes the URL, which is cached before returning.

use super::cache::{CacheStats, MemoryUrlCache, UrlCache};
use crate::config::DisplayConfig;
use crate::types::StoredPath;
use std::cell::Cell;

/// Maps a stored path to a URL. Pure and synchronous.
pub trait PathRule {
    fn resolve(&self, path: &StoredPath) -> String;
}

impl<F> PathRule for F
where
    F: Fn(&StoredPath) -> String,
{
    fn resolve(&self, path: &StoredPath) -> String {
        self(path)
    }
}

/// Joins stored paths onto an asset root. Absolute URLs pass through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrlRule {
    base: String,
}

impl BaseUrlRule {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl PathRule for BaseUrlRule {
    fn resolve(&self, path: &StoredPath) -> String {
        let path = path.as_str().trim();
        if is_absolute(path) {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn is_absolute(path: &str) -> bool {
    ["http://", "https://", "data:", "blob:"]
        .iter()
        .any(|scheme| path.starts_with(scheme))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Url(String),
    Placeholder,
}

pub struct DisplayResolver<C: UrlCache = MemoryUrlCache> {
    cache: C,
    rule: Box<dyn PathRule>,
    sentinels: Vec<String>,
    stats: Cell<CacheStats>,
}

impl DisplayResolver<MemoryUrlCache> {
    /// Fresh in-memory cache, [`BaseUrlRule`] on the configured asset root.
    pub fn from_config(config: &DisplayConfig) -> Self {
        Self::new(
            MemoryUrlCache::new(),
            BaseUrlRule::new(config.asset_base_url.clone()),
        )
        .with_sentinels(config.sentinels.clone())
    }
}

impl<C: UrlCache> DisplayResolver<C> {
    pub fn new(cache: C, rule: impl PathRule + 'static) -> Self {
        Self {
            cache,
            rule: Box::new(rule),
            sentinels: Vec::new(),
            stats: Cell::new(CacheStats::default()),
        }
    }

    /// Reserved stored paths that render the placeholder. A sentinel ending
    /// in `://` reserves the whole scheme; any other must match exactly.
    pub fn with_sentinels(mut self, sentinels: Vec<String>) -> Self {
        self.sentinels = sentinels
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.get()
    }

    pub fn is_sentinel(&self, path: &StoredPath) -> bool {
        let path = path.as_str().trim();
        self.sentinels.iter().any(|s| {
            if s.ends_with("://") {
                path.starts_with(s.as_str())
            } else {
                path == s.as_str()
            }
        })
    }

    pub fn resolve(&self, path: &StoredPath) -> Resolution {
        if path.is_empty() || self.is_sentinel(path) {
            tracing::debug!(%path, "No image, using placeholder");
            self.record(CacheStats::placeholder);
            return Resolution::Placeholder;
        }

        if let Some(url) = self.cache.get(path) {
            tracing::debug!(%path, "URL cache hit");
            self.record(CacheStats::hit);
            return Resolution::Url(url);
        }

        let url = self.rule.resolve(path);
        tracing::debug!(%path, %url, "URL cache miss");
        self.cache.set(path, url.clone());
        self.record(CacheStats::miss);
        Resolution::Url(url)
    }

    /// Count a placeholder shown after a load failure.
    pub(crate) fn record_fallback(&self) {
        self.record(CacheStats::placeholder);
    }

    fn record(&self, f: fn(&mut CacheStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn counting_rule() -> (Rc<Cell<u32>>, impl Fn(&StoredPath) -> String + 'static) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let rule = move |p: &StoredPath| {
            counter.set(counter.get() + 1);
            format!("https://cdn.test/{p}")
        };
        (calls, rule)
    }

    fn sentinels() -> Vec<String> {
        vec!["placeholder://".into(), "test-image".into(), "default-image".into()]
    }

    #[test]
    fn same_path_resolves_once() {
        let (calls, rule) = counting_rule();
        let resolver = DisplayResolver::new(MemoryUrlCache::new(), rule);
        let path = StoredPath::new("news/abc123.jpg");

        let first = resolver.resolve(&path);
        let second = resolver.resolve(&path);

        assert_eq!(first, second);
        assert_eq!(
            first,
            Resolution::Url("https://cdn.test/news/abc123.jpg".into())
        );
        assert_eq!(calls.get(), 1);
        assert_eq!(resolver.stats().hits, 1);
        assert_eq!(resolver.stats().misses, 1);
    }

    #[test]
    fn empty_and_sentinel_paths_skip_rule_and_cache() {
        let (calls, rule) = counting_rule();
        let resolver =
            DisplayResolver::new(MemoryUrlCache::new(), rule).with_sentinels(sentinels());

        for raw in ["", "   ", "placeholder://news", "test-image", " default-image "] {
            assert_eq!(
                resolver.resolve(&StoredPath::new(raw)),
                Resolution::Placeholder,
                "{raw:?}"
            );
        }
        assert_eq!(calls.get(), 0);
        assert!(resolver.cache().is_empty());
        assert_eq!(resolver.stats().placeholders, 5);
    }

    #[test]
    fn paths_that_only_start_with_a_token_reach_the_rule() {
        let (calls, rule) = counting_rule();
        let resolver =
            DisplayResolver::new(MemoryUrlCache::new(), rule).with_sentinels(sentinels());

        for raw in ["test-images/2024/a.jpg", "default-image-team-logo.png", "placeholder:/x"] {
            assert_eq!(
                resolver.resolve(&StoredPath::new(raw)),
                Resolution::Url(format!("https://cdn.test/{raw}")),
                "{raw:?}"
            );
        }
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn shared_cache_serves_other_resolvers() {
        let cache = MemoryUrlCache::new();
        let (first_calls, first_rule) = counting_rule();
        let (second_calls, second_rule) = counting_rule();
        let a = DisplayResolver::new(cache.clone(), first_rule);
        let b = DisplayResolver::new(cache, second_rule);

        let path = StoredPath::new("game/g.png");
        assert_eq!(a.resolve(&path), b.resolve(&path));
        assert_eq!(first_calls.get(), 1);
        assert_eq!(second_calls.get(), 0);
    }

    #[test]
    fn base_url_rule_joins_and_passes_absolute() {
        let rule = BaseUrlRule::new("https://assets.test/static/");
        assert_eq!(
            rule.resolve(&StoredPath::new("/member/a.jpg")),
            "https://assets.test/static/member/a.jpg"
        );
        for absolute in ["https://x.test/a.jpg", "http://x/a", "data:image/png;base64,AA", "blob:abc"] {
            assert_eq!(rule.resolve(&StoredPath::new(absolute)), absolute);
        }
    }

    #[test]
    fn from_config_uses_asset_root_and_sentinels() {
        let resolver = DisplayResolver::from_config(&DisplayConfig::default());
        assert_eq!(
            resolver.resolve(&StoredPath::new("news/a.jpg")),
            Resolution::Url("http://localhost:8080/static/news/a.jpg".into())
        );
        assert!(resolver.is_sentinel(&StoredPath::new("test-image")));
    }
}
