//! Render-result memoization
//!
//! Wraps an expensive, deterministic render function with a [`RecencyCache`]
//! so repeated requests for the same key skip recomputation. Failed renders
//! are handed back to the caller and never stored, so the next identical
//! request renders again.
//!
//! Misses are not coalesced: two requests for the same key that both miss
//! will both invoke the render function.

use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;

use crate::lru::{CacheStats, RecencyCache};

/// Memoizes render output keyed by a caller-defined projection of the input.
///
/// # Example
///
/// ```
/// use std::num::NonZeroUsize;
/// use pdfchat_cache::Memoizer;
///
/// let mut memo = Memoizer::with_capacity(NonZeroUsize::new(16).unwrap());
///
/// let first: Result<String, ()> = memo.get_or_render(3, || Ok("three".to_string()));
/// let second: Result<String, ()> = memo.get_or_render(3, || unreachable!());
///
/// assert_eq!(first, second);
/// assert_eq!(memo.render_count(), 1);
/// ```
#[derive(Debug)]
pub struct Memoizer<K, V> {
    cache: RecencyCache<K, V>,
    renders: u64,
}

impl<K, V> Memoizer<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a memoizer backed by an existing cache
    pub fn new(cache: RecencyCache<K, V>) -> Self {
        Self { cache, renders: 0 }
    }

    /// Create a memoizer with a fresh cache of the given capacity
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self::new(RecencyCache::new(capacity))
    }

    /// Return the cached output for `key`, or run `render` and cache its result.
    ///
    /// On a hit `render` is not invoked. On a miss it is invoked exactly once;
    /// an `Ok` value is stored before being returned, an `Err` is returned
    /// without touching the cache.
    pub fn get_or_render<E, F>(&mut self, key: K, render: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.cache.get(&key) {
            return Ok(value.clone());
        }

        self.renders += 1;
        tracing::trace!(renders = self.renders, "render cache miss");
        let value = render()?;
        self.cache.set(key, value.clone());
        Ok(value)
    }

    /// Asynchronous variant of [`Memoizer::get_or_render`].
    ///
    /// The result is stored only once the render future has completed
    /// successfully; readers never observe a partial entry.
    pub async fn get_or_render_async<E, F, Fut>(&mut self, key: K, render: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.cache.get(&key) {
            return Ok(value.clone());
        }

        self.renders += 1;
        tracing::trace!(renders = self.renders, "render cache miss (async)");
        let value = render().await?;
        self.cache.set(key, value.clone());
        Ok(value)
    }

    /// Cached output for `key`, marking it as recently used
    pub fn cached(&mut self, key: &K) -> Option<V> {
        self.cache.get(key).cloned()
    }

    /// Returns true if output for `key` is cached, without touching recency
    pub fn contains(&self, key: &K) -> bool {
        self.cache.has(key)
    }

    /// Drop the cached output for `key`
    pub fn invalidate(&mut self, key: &K) -> Option<V> {
        self.cache.remove(key)
    }

    /// Drop every cached entry for which `keep` returns false
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.cache.retain(keep);
    }

    /// Drop all cached output
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Number of times the underlying render function has been invoked
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// Statistics of the backing cache
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Read access to the backing cache
    pub fn cache(&self) -> &RecencyCache<K, V> {
        &self.cache
    }
}
