//! Error types for the cache crate.

use std::io;

use thiserror::Error;

/// Errors raised while constructing a cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A cache must be able to hold at least one entry
    #[error("cache capacity must be at least 1")]
    ZeroCapacity,
}

/// Errors reported by an underlying render function.
///
/// These are surfaced to the caller of a memoized render and are never stored
/// in a cache, so the next identical request renders again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// The zoom scale cannot be turned into a stable cache key
    #[error("invalid render scale: {0}")]
    InvalidScale(f32),

    /// The requested page does not exist in the document
    #[error("page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },

    /// A formula with no content was submitted for typesetting
    #[error("formula expression is empty")]
    EmptyExpression,

    /// The rendering backend failed
    #[error("render failed: {0}")]
    Failed(String),
}

/// Errors that can occur while loading or saving cache configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid value for a configuration parameter
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),

    /// I/O error reading or writing the configuration file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
