//! pdfchat message list virtualization
//!
//! Computes which slice of a long chat transcript to mount for the current
//! scroll position, given item heights that are only partially known, plus
//! the spacer heights that keep the scrollbar geometry correct.
//!
//! Every function here is pure and synchronous, cheap enough to call on each
//! scroll or resize event. Measured heights are read through
//! [`HeightLookup`] and never modified.
//!
//! # Example
//!
//! ```
//! use pdfchat_viewport::{ItemHeights, VirtualWindow, WindowConfig};
//!
//! let window = VirtualWindow::new(WindowConfig::default());
//! let messages: Vec<String> = (0..1_000).map(|i| format!("msg-{i}")).collect();
//! let mut heights = ItemHeights::new();
//! heights.record("msg-0".to_string(), 48.0);
//!
//! let layout = window.layout(12_000.0, 800.0, Some(&messages), &heights);
//! assert!(layout.range.len() < messages.len());
//! assert!(window.reconciles(Some(&messages), &layout, &heights));
//! ```

pub mod config;
pub mod heights;
pub mod range;
pub mod window;

pub use config::{WindowConfig, WindowConfigError};
pub use heights::{HeightLookup, ItemHeights, Unmeasured};
pub use range::{Padding, VisibleRange, WindowLayout};
pub use window::{
    calculate_visible_range, compute_padding, offset_of, total_height, VirtualWindow,
};
