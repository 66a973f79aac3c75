//! Window range and spacer types

use std::ops::Range;

/// Half-open index interval `[start, end)` of items to keep mounted.
///
/// Always satisfies `start <= end`; the calculator also guarantees
/// `end <= item_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    /// The empty range at index 0
    pub const EMPTY: VisibleRange = VisibleRange { start: 0, end: 0 };

    /// Create a range, swapping the bounds if they are reversed
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Number of items in the range
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the range holds no items
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if `index` falls inside the range
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    /// The indices covered by the range
    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Restrict the range to a list of `len` items
    pub fn clamp_to(&self, len: usize) -> Self {
        let end = self.end.min(len);
        Self {
            start: self.start.min(end),
            end,
        }
    }
}

impl From<Range<usize>> for VisibleRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<VisibleRange> for Range<usize> {
    fn from(range: VisibleRange) -> Self {
        range.start..range.end
    }
}

/// Spacer heights in pixels above and below the mounted items
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    /// Combined height of the items before the range
    pub top: f64,
    /// Combined height of the items after the range
    pub bottom: f64,
}

impl Padding {
    /// Combined spacer height
    pub fn total(&self) -> f64 {
        self.top + self.bottom
    }

    /// Check that the spacers plus the mounted items add up to the full list
    /// height, within `tolerance` pixels.
    pub fn reconciles(&self, mounted_height: f64, total_height: f64, tolerance: f64) -> bool {
        (self.top + mounted_height + self.bottom - total_height).abs() <= tolerance
    }
}

/// Everything the list needs to lay itself out for one scroll position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowLayout {
    pub range: VisibleRange,
    pub padding: Padding,
}
