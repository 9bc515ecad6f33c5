//! Transform caching.
//!
//! Provides LRU-based caching of transform results using BLAKE3 hashes of
//! `(path, source)` for cache keys. A file whose text returns to an earlier
//! state, or a file moved back and forth, is not re-transformed.
//!
//! # Examples
//!
//! ```
//! use studio_linker::TransformCache;
//!
//! let mut cache = TransformCache::new(64);
//! let first = cache.get_or_transform("/A.jsx", "export default 1;").unwrap();
//! let second = cache.get_or_transform("/A.jsx", "export default 1;").unwrap();
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! assert_eq!(cache.stats().hits, 1);
//! ```

use blake3::Hasher;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use studio_core::Result;
use studio_transform::TransformOutput;

/// Cache key for transform results.
///
/// The path is part of the key because the transform depends on it (JSX is
/// disabled for `.ts` files).
///
/// # Examples
///
/// ```
/// use studio_linker::TransformCache;
///
/// let a = TransformCache::key_for("/A.jsx", "x");
/// let b = TransformCache::key_for("/A.jsx", "x");
/// let c = TransformCache::key_for("/B.jsx", "x");
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the cache key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that ran the transformer.
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache of transform results.
///
/// Failed transforms are not cached; the error is cheap to reproduce and
/// must carry the current path.
pub struct TransformCache {
    entries: LruCache<CacheKey, Arc<TransformOutput>>,
    stats: CacheStats,
}

impl std::fmt::Debug for TransformCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("stats", &self.stats)
            .finish()
    }
}

impl TransformCache {
    /// Creates a cache holding up to `capacity` results.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Generates the cache key for a module's source.
    #[must_use]
    pub fn key_for(path: &str, source: &str) -> CacheKey {
        let mut hasher = Hasher::new();
        hasher.update(path.as_bytes());
        hasher.update(&[0]);
        hasher.update(source.as_bytes());
        CacheKey(hasher.finalize().to_hex().to_string())
    }

    /// Gets a result from the cache, updating LRU order on hit.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<TransformOutput>> {
        self.entries.get(key).cloned()
    }

    /// Inserts a result, evicting the least recently used one if full.
    pub fn insert(&mut self, key: CacheKey, output: Arc<TransformOutput>) {
        self.entries.put(key, output);
    }

    /// Returns the cached result for `(path, source)` or transforms it.
    ///
    /// # Errors
    ///
    /// Returns the transformer's `Error::TransformSyntaxError`.
    pub fn get_or_transform(&mut self, path: &str, source: &str) -> Result<Arc<TransformOutput>> {
        let key = Self::key_for(path, source);
        if let Some(output) = self.get(&key) {
            self.stats.hits += 1;
            return Ok(output);
        }

        self.stats.misses += 1;
        let output = Arc::new(studio_transform::transform(path, source)?);
        self.insert(key, Arc::clone(&output));
        Ok(output)
    }

    /// Number of cached results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of cached results.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Hit and miss counters since creation.
    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drops every cached result. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_miss_then_hit() {
        let mut cache = TransformCache::new(4);
        cache.get_or_transform("/A.jsx", "export default 1;").unwrap();
        cache.get_or_transform("/A.jsx", "export default 1;").unwrap();
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
        assert!((cache.stats().hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache = TransformCache::new(4);
        assert!(cache.get_or_transform("/A.jsx", "<div>").is_err());
        assert!(cache.get_or_transform("/A.jsx", "<div>").is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = TransformCache::new(2);
        cache.get_or_transform("/A.js", "1;").unwrap();
        cache.get_or_transform("/B.js", "2;").unwrap();
        cache.get_or_transform("/A.js", "1;").unwrap();
        cache.get_or_transform("/C.js", "3;").unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&TransformCache::key_for("/A.js", "1;")).is_some());
        assert!(cache.get(&TransformCache::key_for("/B.js", "2;")).is_none());
    }

    #[test]
    fn test_zero_capacity_is_one() {
        assert_eq!(TransformCache::new(0).capacity(), 1);
    }

    #[test]
    fn test_key_is_hex() {
        let key = TransformCache::key_for("/A.jsx", "");
        assert_eq!(key.as_str().len(), 64);
        assert!(key.to_string().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
