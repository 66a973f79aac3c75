//! Formula typesetting cache
//!
//! Typeset markup is memoized by display mode and normalized expression
//! text. A failed typeset can be turned into a visible placeholder for the
//! current call, but the placeholder is never cached.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::config::CacheConfig;
use crate::error::RenderError;
use crate::lru::CacheStats;
use crate::memo::Memoizer;

/// How a formula is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathMode {
    /// Rendered within a line of text
    Inline,
    /// Rendered as its own centered block
    Display,
}

impl fmt::Display for MathMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathMode::Inline => write!(f, "inline"),
            MathMode::Display => write!(f, "display"),
        }
    }
}

/// Typesets a formula expression into markup.
///
/// Implemented by the math engine; the cache only calls it on a miss.
pub trait FormulaRenderer {
    fn typeset(&self, expression: &str, mode: MathMode) -> Result<String, RenderError>;
}

impl<F> FormulaRenderer for F
where
    F: Fn(&str, MathMode) -> Result<String, RenderError>,
{
    fn typeset(&self, expression: &str, mode: MathMode) -> Result<String, RenderError> {
        self(expression, mode)
    }
}

/// Cache key for typeset output
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormulaKey {
    pub mode: MathMode,
    pub expression: String,
}

impl FormulaKey {
    /// Build a key from raw source text
    pub fn new(expression: &str, mode: MathMode) -> Self {
        Self {
            mode,
            expression: normalize_expression(expression),
        }
    }
}

/// Trim an expression and collapse every run of whitespace to one space
pub fn normalize_expression(expression: &str) -> String {
    expression.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Memoized formula typesetter owning its renderer and its cache.
///
/// # Example
///
/// ```
/// use std::num::NonZeroUsize;
/// use pdfchat_cache::{FormulaCache, MathMode, RenderError};
///
/// let typeset = |expr: &str, mode: MathMode| -> Result<String, RenderError> {
///     Ok(format!("<math class=\"{mode}\">{expr}</math>"))
/// };
/// let mut formulas = FormulaCache::new(typeset, NonZeroUsize::new(64).unwrap());
///
/// let markup = formulas.render("x^2  +  1", MathMode::Inline).unwrap();
/// assert_eq!(&*markup, "<math class=\"inline\">x^2 + 1</math>");
/// assert!(formulas.is_cached("x^2 + 1", MathMode::Inline));
/// ```
pub struct FormulaCache<R> {
    renderer: R,
    memo: Memoizer<FormulaKey, Arc<str>>,
}

impl<R: FormulaRenderer> FormulaCache<R> {
    /// Create a formula cache holding at most `capacity` entries
    pub fn new(renderer: R, capacity: NonZeroUsize) -> Self {
        Self::with_memoizer(renderer, Memoizer::with_capacity(capacity))
    }

    /// Create a formula cache sized from `config`
    pub fn from_config(renderer: R, config: &CacheConfig) -> Self {
        Self::new(renderer, config.formula_cache_capacity)
    }

    /// Create a formula cache around an existing memoizer
    pub fn with_memoizer(renderer: R, memo: Memoizer<FormulaKey, Arc<str>>) -> Self {
        Self { renderer, memo }
    }

    /// Typeset an expression, reusing cached markup when available.
    ///
    /// The renderer sees the normalized expression.
    pub fn render(&mut self, expression: &str, mode: MathMode) -> Result<Arc<str>, RenderError> {
        let key = FormulaKey::new(expression, mode);
        if key.expression.is_empty() {
            return Err(RenderError::EmptyExpression);
        }

        let renderer = &self.renderer;
        let source = key.expression.clone();
        self.memo.get_or_render(key, || {
            renderer
                .typeset(&source, mode)
                .map(Arc::<str>::from)
        })
    }

    /// Typeset an expression, falling back to an error placeholder.
    ///
    /// The placeholder is returned for this call only; the next request for
    /// the same expression tries the renderer again.
    pub fn render_or_placeholder(&mut self, expression: &str, mode: MathMode) -> Arc<str> {
        match self.render(expression, mode) {
            Ok(markup) => markup,
            Err(err) => placeholder(expression, mode, &err).into(),
        }
    }

    /// Returns true if markup for this expression and mode is cached
    pub fn is_cached(&self, expression: &str, mode: MathMode) -> bool {
        self.memo.contains(&FormulaKey::new(expression, mode))
    }

    /// Drop all cached markup
    pub fn clear(&mut self) {
        self.memo.clear();
    }

    /// Number of times the renderer has been invoked
    pub fn render_count(&self) -> u64 {
        self.memo.render_count()
    }

    /// Number of cached formulas
    pub fn len(&self) -> usize {
        self.memo.cache().len()
    }

    /// Returns true if no formulas are cached
    pub fn is_empty(&self) -> bool {
        self.memo.cache().is_empty()
    }

    /// Get current cache statistics
    pub fn stats(&self) -> CacheStats {
        self.memo.stats()
    }
}

/// Markup shown in place of a formula that failed to typeset
fn placeholder(expression: &str, mode: MathMode, err: &RenderError) -> String {
    let tag = match mode {
        MathMode::Inline => "span",
        MathMode::Display => "div",
    };
    format!(
        "<{tag} class=\"math-error\" title=\"{}\">{}</{tag}>",
        html_escape::encode_double_quoted_attribute(&err.to_string()),
        html_escape::encode_text(expression.trim()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct SpyRenderer {
        calls: RefCell<Vec<(String, MathMode)>>,
        fail_next: Cell<bool>,
    }

    impl SpyRenderer {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_next: Cell::new(false),
            }
        }
    }

    impl FormulaRenderer for &SpyRenderer {
        fn typeset(&self, expression: &str, mode: MathMode) -> Result<String, RenderError> {
            self.calls.borrow_mut().push((expression.to_string(), mode));
            if self.fail_next.replace(false) {
                return Err(RenderError::Failed(format!("undefined control sequence in {expression}")));
            }
            Ok(format!("<{mode}>{expression}</{mode}>"))
        }
    }

    fn cache(spy: &SpyRenderer) -> FormulaCache<&SpyRenderer> {
        FormulaCache::new(spy, NonZeroUsize::new(16).unwrap())
    }

    #[test]
    fn test_normalize_expression() {
        assert_eq!(normalize_expression("  a +\n\tb  "), "a + b");
        assert_eq!(normalize_expression("\\frac{1}{2}"), "\\frac{1}{2}");
        assert_eq!(normalize_expression(" \n "), "");
    }

    #[test]
    fn test_hit_skips_renderer() {
        let spy = SpyRenderer::new();
        let mut formulas = cache(&spy);

        let first = formulas.render("E = mc^2", MathMode::Inline).unwrap();
        let second = formulas.render("E  =  mc^2 ", MathMode::Inline).unwrap();

        assert_eq!(first, second);
        assert_eq!(spy.calls.borrow().len(), 1);
        assert_eq!(formulas.render_count(), 1);
    }

    #[test]
    fn test_modes_are_independent() {
        let spy = SpyRenderer::new();
        let mut formulas = cache(&spy);

        let inline = formulas.render("x", MathMode::Inline).unwrap();
        let display = formulas.render("x", MathMode::Display).unwrap();

        assert_ne!(inline, display);
        assert_eq!(formulas.len(), 2);
        assert!(formulas.is_cached("x", MathMode::Inline));
        assert!(formulas.is_cached("x", MathMode::Display));
    }

    #[test]
    fn test_failure_retries_on_next_request() {
        let spy = SpyRenderer::new();
        let mut formulas = cache(&spy);
        spy.fail_next.set(true);

        assert!(formulas.render("\\foo", MathMode::Display).is_err());
        assert!(!formulas.is_cached("\\foo", MathMode::Display));

        let markup = formulas.render("\\foo", MathMode::Display).unwrap();
        assert_eq!(&*markup, "<display>\\foo</display>");
        assert_eq!(spy.calls.borrow().len(), 2);
    }

    #[test]
    fn test_placeholder_is_not_cached() {
        let spy = SpyRenderer::new();
        let mut formulas = cache(&spy);
        spy.fail_next.set(true);

        let fallback = formulas.render_or_placeholder("a < b", MathMode::Inline);
        assert!(fallback.starts_with("<span class=\"math-error\""));
        assert!(fallback.contains("a &lt; b"));
        assert!(formulas.is_empty());

        let markup = formulas.render_or_placeholder("a < b", MathMode::Inline);
        assert_eq!(&*markup, "<inline>a < b</inline>");
        assert_eq!(formulas.len(), 1);
    }

    #[test]
    fn test_display_placeholder_uses_block() {
        let err = RenderError::Failed("bad \"token\"".to_string());
        let markup = placeholder("\\x", MathMode::Display, &err);

        assert!(markup.starts_with("<div class=\"math-error\""));
        assert!(markup.ends_with("</div>"));
        assert!(!markup.contains("\"token\""));
    }

    #[test]
    fn test_empty_expression_rejected() {
        let spy = SpyRenderer::new();
        let mut formulas = cache(&spy);

        assert_eq!(
            formulas.render("   ", MathMode::Inline),
            Err(RenderError::EmptyExpression)
        );
        assert!(spy.calls.borrow().is_empty());
    }

    #[test]
    fn test_streaming_rerender_hits_cache() {
        let spy = SpyRenderer::new();
        let mut formulas = cache(&spy);

        // A streamed message re-renders the same formulas on every token
        for _ in 0..50 {
            formulas.render("\\sum_{i=0}^n i", MathMode::Display).unwrap();
            formulas.render("n", MathMode::Inline).unwrap();
        }

        assert_eq!(formulas.render_count(), 2);
        assert_eq!(formulas.stats().hits, 98);
    }

    #[test]
    fn test_clear() {
        let spy = SpyRenderer::new();
        let mut formulas = cache(&spy);
        formulas.render("y", MathMode::Inline).unwrap();

        formulas.clear();

        assert!(formulas.is_empty());
        formulas.render("y", MathMode::Inline).unwrap();
        assert_eq!(formulas.render_count(), 2);
    }

    #[test]
    fn test_from_config_capacity() {
        let spy = SpyRenderer::new();
        let config = CacheConfig::default().with_formula_capacity(NonZeroUsize::new(2).unwrap());
        let mut formulas = FormulaCache::from_config(&spy, &config);

        for expression in ["a", "b", "c"] {
            formulas.render(expression, MathMode::Inline).unwrap();
        }

        assert_eq!(formulas.len(), 2);
        assert!(!formulas.is_cached("a", MathMode::Inline));
        assert!(formulas.is_cached("c", MathMode::Inline));
    }
}
