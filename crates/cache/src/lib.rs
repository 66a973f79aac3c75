//! pdfchat render caches
//!
//! Bounded LRU caching for expensive, deterministic render output: rasterized
//! PDF page bitmaps and typeset math formulas.
//!
//! Each concern owns its own cache instance, injected through a constructor.
//! Failed renders are returned to the caller and never cached, so an identical
//! request after a failure always renders again.
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroUsize;
//! use pdfchat_cache::{CacheConfig, FormulaCache, MathMode, RenderError};
//!
//! let config = CacheConfig::default();
//! let typeset = |expr: &str, _mode: MathMode| -> Result<String, RenderError> {
//!     Ok(format!("<math>{expr}</math>"))
//! };
//! let mut formulas = FormulaCache::new(typeset, config.formula_cache_capacity);
//!
//! formulas.render("a^2 + b^2", MathMode::Display).unwrap();
//! formulas.render("a^2 + b^2", MathMode::Display).unwrap();
//! assert_eq!(formulas.render_count(), 1);
//! ```

pub mod config;
pub mod error;
pub mod formula;
pub mod lru;
pub mod memo;
pub mod page;

pub use config::CacheConfig;
pub use error::{CacheError, ConfigError, RenderError};
pub use formula::{normalize_expression, FormulaCache, FormulaKey, FormulaRenderer, MathMode};
pub use lru::{CacheStats, RecencyCache};
pub use memo::Memoizer;
pub use page::{quantize_scale, PageBitmap, PageKey, PageRasterizer, PageRenderCache};
