//! Bounded recency cache with LRU eviction
//!
//! Entries live in a slab of nodes linked into a doubly-linked recency list,
//! with a hash index from key to slot. The head of the list is the least
//! recently used entry and the tail the most recently used, so lookups,
//! refreshes and evictions are all O(1).

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

use crate::error::CacheError;

/// Sentinel slot index marking the end of the recency list
const NIL: usize = usize::MAX;

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries currently in cache
    pub entries: usize,

    /// Maximum number of entries allowed
    pub capacity: usize,

    /// Number of `get` calls that found an entry
    pub hits: u64,

    /// Number of `get` calls that found nothing
    pub misses: u64,

    /// Number of entries evicted to stay within capacity
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate how full the cache is (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.entries as f64 / self.capacity as f64
        }
    }
}

struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Fixed-capacity key/value store with least-recently-used eviction.
///
/// `get` and `set` mark a key as most recently used; `has` and `peek` do not.
/// When an insertion of a new key would exceed the capacity, the least
/// recently used entry is evicted first.
///
/// # Example
///
/// ```
/// use std::num::NonZeroUsize;
/// use pdfchat_cache::RecencyCache;
///
/// let mut cache = RecencyCache::new(NonZeroUsize::new(2).unwrap());
/// cache.set("a", 1);
/// cache.set("b", 2);
///
/// // Touch "a" so that "b" becomes the eviction candidate
/// assert_eq!(cache.get("a"), Some(&1));
/// cache.set("c", 3);
///
/// assert!(!cache.has("b"));
/// assert_eq!(cache.len(), 2);
/// ```
pub struct RecencyCache<K, V> {
    index: HashMap<K, usize>,
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    capacity: NonZeroUsize,
    stats: CacheStats,
}

impl<K, V> RecencyCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty cache holding at most `capacity` entries
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity.get()),
            slots: Vec::with_capacity(capacity.get()),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            capacity,
            stats: CacheStats {
                capacity: capacity.get(),
                ..Default::default()
            },
        }
    }

    /// Create a cache from a plain count, rejecting a capacity of zero
    pub fn try_new(capacity: usize) -> Result<Self, CacheError> {
        NonZeroUsize::new(capacity)
            .map(Self::new)
            .ok_or(CacheError::ZeroCapacity)
    }

    /// Retrieve a value and mark its key as most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key).copied() {
            Some(slot) => {
                self.touch(slot);
                self.stats.hits += 1;
                self.slots[slot].as_ref().map(|node| &node.value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Retrieve a value without touching recency or statistics
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.slots[slot].as_ref().map(|node| &node.value)
    }

    /// Membership test that leaves the recency order untouched
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Insert or replace an entry and mark it as most recently used.
    ///
    /// Replacing an existing key discards the old value and never evicts.
    /// Inserting a new key into a full cache evicts the least recently used
    /// entry, which is returned.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&slot) = self.index.get(&key) {
            if let Some(node) = self.slots[slot].as_mut() {
                node.value = value;
            }
            self.touch(slot);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity.get() {
            self.evict_lru()
        } else {
            None
        };

        let node = Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, slot);
        self.attach_back(slot);
        self.stats.entries = self.index.len();

        evicted
    }

    /// Remove an entry, returning its value
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.index.remove(key)?;
        let node = self.release(slot)?;
        self.stats.entries = self.index.len();
        Some(node.value)
    }

    /// Keep only the entries for which `keep` returns true
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let doomed: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, node)| match node {
                Some(node) if !keep(&node.key, &node.value) => Some(slot),
                _ => None,
            })
            .collect();

        for slot in doomed {
            if let Some(node) = self.release(slot) {
                self.index.remove(&node.key);
            }
        }
        self.stats.entries = self.index.len();
    }

    /// Remove all entries. Hit/miss counters are kept.
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
        self.stats.entries = 0;
    }

    /// Change the capacity, evicting least recently used entries if the
    /// cache now holds too many
    pub fn resize(&mut self, capacity: NonZeroUsize) {
        self.capacity = capacity;
        self.stats.capacity = capacity.get();

        let mut evicted = 0usize;
        while self.index.len() > capacity.get() {
            if self.evict_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        if evicted > 0 {
            tracing::debug!(capacity = capacity.get(), evicted, "shrunk recency cache");
        }
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Get current cache statistics
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Iterate over entries from least to most recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cursor: self.head,
            remaining: self.index.len(),
        }
    }

    /// Move a slot to the most recently used end of the list
    fn touch(&mut self, slot: usize) {
        if self.tail != slot {
            self.detach(slot);
            self.attach_back(slot);
        }
    }

    /// Evict the least recently used entry
    fn evict_lru(&mut self) -> Option<(K, V)> {
        if self.head == NIL {
            return None;
        }
        let node = self.release(self.head)?;
        self.index.remove(&node.key);
        self.stats.entries = self.index.len();
        self.stats.evictions += 1;
        tracing::trace!(
            entries = self.stats.entries,
            capacity = self.capacity.get(),
            "evicted least recently used entry"
        );
        Some((node.key, node.value))
    }

    /// Unlink a slot, free it and hand back its node
    fn release(&mut self, slot: usize) -> Option<Node<K, V>> {
        self.detach(slot);
        let node = self.slots[slot].take()?;
        self.free.push(slot);
        Some(node)
    }

    fn detach(&mut self, slot: usize) {
        let (prev, next) = match self.slots[slot].as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        if prev == NIL {
            self.head = next;
        } else if let Some(node) = self.slots[prev].as_mut() {
            node.next = next;
        }

        if next == NIL {
            self.tail = prev;
        } else if let Some(node) = self.slots[next].as_mut() {
            node.prev = prev;
        }

        if let Some(node) = self.slots[slot].as_mut() {
            node.prev = NIL;
            node.next = NIL;
        }
    }

    fn attach_back(&mut self, slot: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.slots[slot].as_mut() {
            node.prev = old_tail;
            node.next = NIL;
        }

        if old_tail == NIL {
            self.head = slot;
        } else if let Some(node) = self.slots[old_tail].as_mut() {
            node.next = slot;
        }
        self.tail = slot;
    }
}

impl<K, V> fmt::Debug for RecencyCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecencyCache")
            .field("len", &self.index.len())
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Iterator over cache entries, least recently used first
pub struct Iter<'a, K, V> {
    slots: &'a [Option<Node<K, V>>],
    cursor: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let node = self.slots.get(self.cursor)?.as_ref()?;
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
