//! Rendered page bitmap cache
//!
//! Page rasterization is memoized by page number and a quantized zoom scale.
//! Scales are rounded to a fixed number of steps per unit so that
//! floating-point zoom values that differ only by noise share one entry.

use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::config::CacheConfig;
use crate::error::RenderError;
use crate::lru::CacheStats;
use crate::memo::Memoizer;

/// Default number of quantization steps per unit of scale (hundredths)
pub const DEFAULT_SCALE_STEPS: u32 = 100;

/// Renders a single PDF page to an encoded bitmap.
///
/// Implemented by the PDF engine; the cache only calls it on a miss.
pub trait PageRasterizer {
    /// Render `page` (zero-based) at `scale`, where 1.0 is the page's natural size
    fn rasterize(&self, page: u32, scale: f32) -> Result<PageBitmap, RenderError>;
}

impl<F> PageRasterizer for F
where
    F: Fn(u32, f32) -> Result<PageBitmap, RenderError>,
{
    fn rasterize(&self, page: u32, scale: f32) -> Result<PageBitmap, RenderError> {
        self(page, scale)
    }
}

/// An encoded page bitmap. Cloning shares the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBitmap {
    /// Width of the bitmap in pixels
    pub width: u32,

    /// Height of the bitmap in pixels
    pub height: u32,

    /// Encoded image data
    pub data: Arc<[u8]>,
}

impl PageBitmap {
    /// Create a new page bitmap
    pub fn new(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
        }
    }

    /// Size of the encoded data in bytes
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// Cache key for a rendered page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageKey {
    /// Zero-based page number
    pub page: u32,

    /// Scale rounded to `steps` per unit
    pub scale_bucket: u32,
}

impl PageKey {
    /// Build a key, quantizing `scale` to `steps` per unit
    pub fn new(page: u32, scale: f32, steps: u32) -> Result<Self, RenderError> {
        Ok(Self {
            page,
            scale_bucket: quantize_scale(scale, steps)?,
        })
    }

    /// The scale this key stands for
    pub fn scale(&self, steps: u32) -> f32 {
        self.scale_bucket as f32 / steps.max(1) as f32
    }
}

/// Round a zoom scale to a whole number of `steps` per unit.
///
/// Scales that are not finite, not positive, or that round to zero are rejected.
pub fn quantize_scale(scale: f32, steps: u32) -> Result<u32, RenderError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RenderError::InvalidScale(scale));
    }
    let bucket = (f64::from(scale) * f64::from(steps.max(1))).round();
    if bucket < 1.0 || bucket > f64::from(u32::MAX) {
        return Err(RenderError::InvalidScale(scale));
    }
    Ok(bucket as u32)
}

/// Memoized page renderer owning its rasterizer and its cache.
///
/// # Example
///
/// ```
/// use std::num::NonZeroUsize;
/// use pdfchat_cache::{PageBitmap, PageRenderCache, RenderError};
///
/// let rasterize = |page: u32, scale: f32| -> Result<PageBitmap, RenderError> {
///     let side = (100.0 * scale) as u32;
///     Ok(PageBitmap::new(side, side, vec![page as u8; 4]))
/// };
/// let mut pages = PageRenderCache::new(rasterize, NonZeroUsize::new(8).unwrap());
///
/// let bitmap = pages.render(0, 1.5).unwrap();
/// assert_eq!(bitmap.width, 150);
/// assert!(pages.is_cached(0, 1.5));
/// ```
pub struct PageRenderCache<R> {
    rasterizer: R,
    memo: Memoizer<PageKey, PageBitmap>,
    scale_steps: u32,
}

impl<R: PageRasterizer> PageRenderCache<R> {
    /// Create a page cache holding at most `capacity` bitmaps
    pub fn new(rasterizer: R, capacity: NonZeroUsize) -> Self {
        Self::with_memoizer(rasterizer, Memoizer::with_capacity(capacity))
    }

    /// Create a page cache sized and quantized from `config`
    pub fn from_config(rasterizer: R, config: &CacheConfig) -> Self {
        Self::new(rasterizer, config.page_cache_capacity).with_scale_steps(config.scale_steps)
    }

    /// Create a page cache around an existing memoizer
    pub fn with_memoizer(rasterizer: R, memo: Memoizer<PageKey, PageBitmap>) -> Self {
        Self {
            rasterizer,
            memo,
            scale_steps: DEFAULT_SCALE_STEPS,
        }
    }

    /// Set the number of quantization steps per unit of scale
    pub fn with_scale_steps(mut self, steps: u32) -> Self {
        self.scale_steps = steps.max(1);
        self
    }

    /// Render a page, reusing a cached bitmap when one exists.
    ///
    /// The rasterizer receives the quantized scale so that the cached bitmap
    /// matches every request that maps to the same key.
    pub fn render(&mut self, page: u32, scale: f32) -> Result<PageBitmap, RenderError> {
        let key = PageKey::new(page, scale, self.scale_steps)?;
        let quantized = key.scale(self.scale_steps);
        let rasterizer = &self.rasterizer;
        self.memo.get_or_render(key, || rasterizer.rasterize(page, quantized))
    }

    /// Returns true if a bitmap for this page and scale is cached
    pub fn is_cached(&self, page: u32, scale: f32) -> bool {
        PageKey::new(page, scale, self.scale_steps)
            .map(|key| self.memo.contains(&key))
            .unwrap_or(false)
    }

    /// Drop every cached bitmap of `page`, at all scales
    pub fn invalidate_page(&mut self, page: u32) {
        self.memo.retain(|key, _| key.page != page);
    }

    /// Drop all cached bitmaps
    pub fn clear(&mut self) {
        self.memo.clear();
    }

    /// Number of times the rasterizer has been invoked
    pub fn render_count(&self) -> u64 {
        self.memo.render_count()
    }

    /// Number of cached bitmaps
    pub fn len(&self) -> usize {
        self.memo.cache().len()
    }

    /// Returns true if no bitmaps are cached
    pub fn is_empty(&self) -> bool {
        self.memo.cache().is_empty()
    }

    /// Get current cache statistics
    pub fn stats(&self) -> CacheStats {
        self.memo.stats()
    }

    /// Quantization steps per unit of scale
    pub fn scale_steps(&self) -> u32 {
        self.scale_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Rasterizer that records every call and fails for selected pages
    struct SpyRasterizer {
        calls: RefCell<Vec<(u32, f32)>>,
        failing: RefCell<Vec<u32>>,
        page_count: u32,
    }

    impl SpyRasterizer {
        fn new(page_count: u32) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                failing: RefCell::new(Vec::new()),
                page_count,
            }
        }
    }

    impl PageRasterizer for &SpyRasterizer {
        fn rasterize(&self, page: u32, scale: f32) -> Result<PageBitmap, RenderError> {
            self.calls.borrow_mut().push((page, scale));
            if page >= self.page_count {
                return Err(RenderError::PageOutOfRange {
                    page,
                    page_count: self.page_count,
                });
            }
            if self.failing.borrow().contains(&page) {
                return Err(RenderError::Failed("canvas lost".to_string()));
            }
            let side = (612.0 * scale).round() as u32;
            Ok(PageBitmap::new(side, side, vec![page as u8; 16]))
        }
    }

    fn cache(spy: &SpyRasterizer, capacity: usize) -> PageRenderCache<&SpyRasterizer> {
        PageRenderCache::new(spy, NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_quantize_scale() {
        assert_eq!(quantize_scale(1.0, 100).unwrap(), 100);
        assert_eq!(quantize_scale(1.5, 100).unwrap(), 150);
        assert_eq!(quantize_scale(1.004, 100).unwrap(), 100);
        assert_eq!(quantize_scale(1.006, 100).unwrap(), 101);
        assert_eq!(quantize_scale(0.1 + 0.2, 100).unwrap(), 30);
    }

    #[test]
    fn test_quantize_rejects_bad_scales() {
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY, 0.001] {
            assert!(quantize_scale(scale, 100).is_err(), "scale {scale} accepted");
        }
    }

    #[test]
    fn test_page_key() {
        let key = PageKey::new(3, 1.25, 100).unwrap();
        assert_eq!(key.page, 3);
        assert_eq!(key.scale_bucket, 125);
        assert!((key.scale(100) - 1.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_render_hit_skips_rasterizer() {
        let spy = SpyRasterizer::new(10);
        let mut pages = cache(&spy, 8);

        let first = pages.render(2, 1.0).unwrap();
        let second = pages.render(2, 1.0).unwrap();

        assert_eq!(first, second);
        assert_eq!(spy.calls.borrow().len(), 1);
        assert_eq!(pages.render_count(), 1);
    }

    #[test]
    fn test_near_identical_scales_share_entry() {
        let spy = SpyRasterizer::new(10);
        let mut pages = cache(&spy, 8);

        pages.render(0, 1.2).unwrap();
        pages.render(0, 1.2000001).unwrap();
        pages.render(0, 1.199999).unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(spy.calls.borrow().len(), 1);
        // Rasterized at the quantized scale
        assert!((spy.calls.borrow()[0].1 - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_scales_are_independent_entries() {
        let spy = SpyRasterizer::new(10);
        let mut pages = cache(&spy, 8);

        let small = pages.render(4, 1.0).unwrap();
        let large = pages.render(4, 2.0).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(small.width, 612);
        assert_eq!(large.width, 1224);
        assert!(pages.is_cached(4, 1.0));
        assert!(pages.is_cached(4, 2.0));
        assert!(!pages.is_cached(5, 1.0));
    }

    #[test]
    fn test_failure_not_cached() {
        let spy = SpyRasterizer::new(10);
        spy.failing.borrow_mut().push(1);
        let mut pages = cache(&spy, 8);

        assert_eq!(
            pages.render(1, 1.0),
            Err(RenderError::Failed("canvas lost".to_string()))
        );
        assert!(!pages.is_cached(1, 1.0));

        spy.failing.borrow_mut().clear();
        assert!(pages.render(1, 1.0).is_ok());
        assert_eq!(spy.calls.borrow().len(), 2);
    }

    #[test]
    fn test_out_of_range_page() {
        let spy = SpyRasterizer::new(2);
        let mut pages = cache(&spy, 8);

        assert_eq!(
            pages.render(5, 1.0),
            Err(RenderError::PageOutOfRange {
                page: 5,
                page_count: 2
            })
        );
        assert!(pages.is_empty());
    }

    #[test]
    fn test_invalid_scale_never_reaches_rasterizer() {
        let spy = SpyRasterizer::new(2);
        let mut pages = cache(&spy, 8);

        assert_eq!(pages.render(0, 0.0), Err(RenderError::InvalidScale(0.0)));
        assert!(spy.calls.borrow().is_empty());
        assert!(!pages.is_cached(0, f32::NAN));
    }

    #[test]
    fn test_invalidate_page() {
        let spy = SpyRasterizer::new(10);
        let mut pages = cache(&spy, 8);
        pages.render(0, 1.0).unwrap();
        pages.render(0, 2.0).unwrap();
        pages.render(1, 1.0).unwrap();

        pages.invalidate_page(0);

        assert_eq!(pages.len(), 1);
        assert!(pages.is_cached(1, 1.0));
        assert!(!pages.is_cached(0, 2.0));
    }

    #[test]
    fn test_scroll_through_document_stays_bounded() {
        let spy = SpyRasterizer::new(500);
        let mut pages = cache(&spy, 20);

        for page in 0..500 {
            pages.render(page, 1.0).unwrap();
            assert!(pages.len() <= 20);
        }

        // Scrolling back over the last few pages hits the cache
        let before = pages.render_count();
        for page in 490..500 {
            pages.render(page, 1.0).unwrap();
        }
        assert_eq!(pages.render_count(), before);
        assert_eq!(pages.stats().evictions, 480);
    }

    #[test]
    fn test_closure_rasterizer_and_custom_steps() {
        let rasterize = |_page: u32, scale: f32| {
            Ok::<_, RenderError>(PageBitmap::new(1, 1, vec![(scale * 10.0) as u8]))
        };
        let mut pages = PageRenderCache::new(rasterize, NonZeroUsize::new(4).unwrap())
            .with_scale_steps(10);

        pages.render(0, 1.04).unwrap();
        pages.render(0, 0.96).unwrap();

        assert_eq!(pages.scale_steps(), 10);
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_from_config() {
        let spy = SpyRasterizer::new(10);
        let config = CacheConfig::default()
            .with_page_capacity(NonZeroUsize::new(2).unwrap())
            .with_scale_steps(4);
        let mut pages = PageRenderCache::from_config(&spy, &config);

        // 1.2 and 1.3 both quantize to 1.25 in quarter steps
        pages.render(3, 1.2).unwrap();
        pages.render(3, 1.3).unwrap();
        assert_eq!(spy.calls.borrow().as_slice(), &[(3, 1.25)]);

        for page in 0..3 {
            pages.render(page, 1.0).unwrap();
        }
        assert_eq!(pages.len(), 2);
    }
}
