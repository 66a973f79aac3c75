//! Virtual window calculation
//!
//! Decides which contiguous slice of a long, ordered item list should be
//! mounted for the current scroll position, and how tall the spacers above
//! and below that slice must be to keep the scrollbar geometry correct.
//!
//! Heights come from a [`HeightLookup`]; items that have not been measured yet
//! use the caller's estimate. The lookup is only borrowed, never written.
//!
//! Preconditions (not checked): `viewport_height > 0`, the estimate is
//! positive and finite, and measured heights are non-negative and finite.

use crate::config::WindowConfig;
use crate::heights::HeightLookup;
use crate::range::{Padding, VisibleRange, WindowLayout};

#[inline]
fn height_of<T, H>(item: &T, heights: &H, estimated_item_height: f64) -> f64
where
    H: HeightLookup<T> + ?Sized,
{
    heights.height_of(item).unwrap_or(estimated_item_height)
}

#[inline]
fn sum_heights<T, H>(items: &[T], heights: &H, estimated_item_height: f64) -> f64
where
    H: HeightLookup<T> + ?Sized,
{
    items
        .iter()
        .fold(0.0, |acc, item| acc + height_of(item, heights, estimated_item_height))
}

/// Total content height of the list
pub fn total_height<T, H>(items: Option<&[T]>, heights: &H, estimated_item_height: f64) -> f64
where
    H: HeightLookup<T> + ?Sized,
{
    sum_heights(items.unwrap_or(&[]), heights, estimated_item_height)
}

/// Vertical offset of the top edge of item `index`.
///
/// Indices past the end give the total content height.
pub fn offset_of<T, H>(
    items: Option<&[T]>,
    index: usize,
    heights: &H,
    estimated_item_height: f64,
) -> f64
where
    H: HeightLookup<T> + ?Sized,
{
    let items = items.unwrap_or(&[]);
    sum_heights(&items[..index.min(items.len())], heights, estimated_item_height)
}

/// Compute the range of items to mount.
///
/// Policy:
/// - an absent or empty list gives `0..0`;
/// - a single item, or a list whose total height fits in the viewport, is
///   mounted entirely;
/// - otherwise the range covers every item intersecting
///   `(scroll_offset, scroll_offset + viewport_height)`, widened by
///   `buffer_size` items on each side and clamped to the list;
/// - a scroll offset past the end of the content pins the window to the
///   last item, and a negative offset behaves like 0.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use pdfchat_viewport::{calculate_visible_range, VisibleRange};
///
/// let items: Vec<u32> = (0..100).collect();
/// let heights: HashMap<u32, f64> = HashMap::new();
///
/// // 50px items, 200px viewport scrolled to 500px: items 10..14 are visible
/// let range = calculate_visible_range(500.0, 200.0, Some(&items), &heights, 2, 50.0);
/// assert_eq!(range, VisibleRange::new(8, 16));
/// ```
pub fn calculate_visible_range<T, H>(
    scroll_offset: f64,
    viewport_height: f64,
    items: Option<&[T]>,
    heights: &H,
    buffer_size: usize,
    estimated_item_height: f64,
) -> VisibleRange
where
    H: HeightLookup<T> + ?Sized,
{
    let items = match items {
        Some(items) if !items.is_empty() => items,
        _ => return VisibleRange::EMPTY,
    };
    let len = items.len();

    if len == 1 || fits_in_viewport(items, heights, estimated_item_height, viewport_height) {
        return VisibleRange::new(0, len);
    }

    let scroll_offset = scroll_offset.max(0.0);
    let viewport_bottom = scroll_offset + viewport_height;

    let mut accumulated = 0.0;
    let mut first_visible = None;
    let mut end_visible = len;
    for (index, item) in items.iter().enumerate() {
        accumulated += height_of(item, heights, estimated_item_height);
        if first_visible.is_none() && accumulated > scroll_offset {
            first_visible = Some(index);
        }
        if first_visible.is_some() && accumulated >= viewport_bottom {
            end_visible = index + 1;
            break;
        }
    }

    // Scrolled past the content: keep the tail mounted
    let first_visible = first_visible.unwrap_or(len - 1);

    VisibleRange::new(
        first_visible.saturating_sub(buffer_size),
        end_visible.saturating_add(buffer_size).min(len),
    )
}

/// Returns true if the whole list is no taller than the viewport.
/// Stops scanning as soon as the viewport height is exceeded.
fn fits_in_viewport<T, H>(
    items: &[T],
    heights: &H,
    estimated_item_height: f64,
    viewport_height: f64,
) -> bool
where
    H: HeightLookup<T> + ?Sized,
{
    let mut accumulated = 0.0;
    for item in items {
        accumulated += height_of(item, heights, estimated_item_height);
        if accumulated > viewport_height {
            return false;
        }
    }
    true
}

/// Compute the spacer heights for a mounted range.
///
/// `top` sums every item before `range.start` and `bottom` every item from
/// `range.end` on. A range starting at 0 has a top of exactly 0.0 and a range
/// ending at the list length has a bottom of exactly 0.0. Ranges reaching past
/// the list are clamped to it.
pub fn compute_padding<T, H>(
    items: Option<&[T]>,
    range: VisibleRange,
    heights: &H,
    estimated_item_height: f64,
) -> Padding
where
    H: HeightLookup<T> + ?Sized,
{
    let items = items.unwrap_or(&[]);
    let range = range.clamp_to(items.len());

    Padding {
        top: sum_heights(&items[..range.start], heights, estimated_item_height),
        bottom: sum_heights(&items[range.end..], heights, estimated_item_height),
    }
}

/// Window calculator bound to a [`WindowConfig`].
///
/// # Example
///
/// ```
/// use pdfchat_viewport::{ItemHeights, VirtualWindow, WindowConfig};
///
/// let window = VirtualWindow::new(WindowConfig::default().with_buffer_size(1));
/// let messages = ["m1", "m2", "m3", "m4", "m5", "m6"];
/// let mut heights = ItemHeights::new();
/// for id in messages {
///     heights.record(id, 300.0);
/// }
///
/// let layout = window.layout(650.0, 400.0, Some(&messages), &heights);
/// assert_eq!(layout.range.indices(), 1..5);
/// assert_eq!(layout.padding.top, 300.0);
/// assert_eq!(layout.padding.bottom, 300.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VirtualWindow {
    config: WindowConfig,
}

impl VirtualWindow {
    /// Create a calculator using `config`
    pub fn new(config: WindowConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Replace the configuration
    pub fn set_config(&mut self, config: WindowConfig) {
        self.config = config;
    }

    /// Range of items to mount, see [`calculate_visible_range`]
    pub fn visible_range<T, H>(
        &self,
        scroll_offset: f64,
        viewport_height: f64,
        items: Option<&[T]>,
        heights: &H,
    ) -> VisibleRange
    where
        H: HeightLookup<T> + ?Sized,
    {
        calculate_visible_range(
            scroll_offset,
            viewport_height,
            items,
            heights,
            self.config.buffer_size,
            self.config.estimated_item_height,
        )
    }

    /// Spacer heights for a range, see [`compute_padding`]
    pub fn padding<T, H>(&self, items: Option<&[T]>, range: VisibleRange, heights: &H) -> Padding
    where
        H: HeightLookup<T> + ?Sized,
    {
        compute_padding(items, range, heights, self.config.estimated_item_height)
    }

    /// Range and spacers for one scroll position
    pub fn layout<T, H>(
        &self,
        scroll_offset: f64,
        viewport_height: f64,
        items: Option<&[T]>,
        heights: &H,
    ) -> WindowLayout
    where
        H: HeightLookup<T> + ?Sized,
    {
        let range = self.visible_range(scroll_offset, viewport_height, items, heights);
        let padding = self.padding(items, range, heights);
        tracing::trace!(
            scroll_offset,
            start = range.start,
            end = range.end,
            padding_top = padding.top,
            padding_bottom = padding.bottom,
            "computed virtual window"
        );
        WindowLayout { range, padding }
    }

    /// Total content height of the list
    pub fn total_height<T, H>(&self, items: Option<&[T]>, heights: &H) -> f64
    where
        H: HeightLookup<T> + ?Sized,
    {
        total_height(items, heights, self.config.estimated_item_height)
    }

    /// Check that a layout's spacers and mounted items add up to the list
    /// height within the configured tolerance
    pub fn reconciles<T, H>(&self, items: Option<&[T]>, layout: &WindowLayout, heights: &H) -> bool
    where
        H: HeightLookup<T> + ?Sized,
    {
        let all = items.unwrap_or(&[]);
        let range = layout.range.clamp_to(all.len());
        let mounted = sum_heights(
            &all[range.start..range.end],
            heights,
            self.config.estimated_item_height,
        );
        layout.padding.reconciles(
            mounted,
            self.total_height(items, heights),
            self.config.reconcile_tolerance,
        )
    }
}
