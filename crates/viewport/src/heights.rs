//! Measured item heights
//!
//! The window calculator only reads heights through [`HeightLookup`]. Writes
//! happen in the measuring code, once an item has been laid out, through
//! [`ItemHeights::record`].

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Read-only access to measured item heights.
///
/// `None` means the item has not been measured yet; the calculator then
/// falls back to the caller's estimate.
pub trait HeightLookup<T: ?Sized> {
    fn height_of(&self, item: &T) -> Option<f64>;
}

impl<T, K> HeightLookup<T> for HashMap<K, f64>
where
    T: Hash + Eq + ?Sized,
    K: Hash + Eq + Borrow<T>,
{
    fn height_of(&self, item: &T) -> Option<f64> {
        self.get(item).copied()
    }
}

impl<T, K> HeightLookup<T> for BTreeMap<K, f64>
where
    T: Ord + ?Sized,
    K: Ord + Borrow<T>,
{
    fn height_of(&self, item: &T) -> Option<f64> {
        self.get(item).copied()
    }
}

/// Lookup with no measurements; every item uses the estimate
#[derive(Debug, Clone, Copy, Default)]
pub struct Unmeasured;

impl<T: ?Sized> HeightLookup<T> for Unmeasured {
    fn height_of(&self, _item: &T) -> Option<f64> {
        None
    }
}

/// Measured heights keyed by stable item identifier.
///
/// Entries never expire. A stale height after a reflow is corrected by
/// recording the new measurement.
#[derive(Debug, Clone)]
pub struct ItemHeights<K> {
    heights: HashMap<K, f64>,
}

impl<K> Default for ItemHeights<K> {
    fn default() -> Self {
        Self {
            heights: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq> ItemHeights<K> {
    /// Create an empty height record
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a measured height.
    ///
    /// Returns true if the stored height changed. Measurements that are not
    /// finite or are negative are ignored.
    pub fn record(&mut self, id: K, height: f64) -> bool {
        if !height.is_finite() || height < 0.0 {
            tracing::trace!(height, "ignoring invalid height measurement");
            return false;
        }
        match self.heights.insert(id, height) {
            Some(previous) => previous != height,
            None => true,
        }
    }

    /// Measured height for `id`, if any
    pub fn get<Q>(&self, id: &Q) -> Option<f64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.heights.get(id).copied()
    }

    /// Forget the measurement for `id`
    pub fn forget<Q>(&mut self, id: &Q) -> Option<f64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.heights.remove(id)
    }

    /// Number of measured items
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Returns true if nothing has been measured
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Forget all measurements
    pub fn clear(&mut self) {
        self.heights.clear();
    }
}

impl<T, K> HeightLookup<T> for ItemHeights<K>
where
    T: Hash + Eq + ?Sized,
    K: Hash + Eq + Borrow<T>,
{
    fn height_of(&self, item: &T) -> Option<f64> {
        self.heights.get(item).copied()
    }
}

impl<K: Hash + Eq> FromIterator<(K, f64)> for ItemHeights<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut heights = Self::new();
        for (id, height) in iter {
            heights.record(id, height);
        }
        heights
    }
}

impl<H, T> HeightLookup<T> for &H
where
    H: HeightLookup<T> + ?Sized,
    T: ?Sized,
{
    fn height_of(&self, item: &T) -> Option<f64> {
        (**self).height_of(item)
    }
}
