//! Window calculator configuration.
//!
//! Can be loaded from environment variables, from a flat TOML string, or
//! created programmatically.

use thiserror::Error;

const BUFFER_ENV: &str = "PDFCHAT_WINDOW_BUFFER";
const ESTIMATE_ENV: &str = "PDFCHAT_ESTIMATED_ITEM_HEIGHT";
const TOLERANCE_ENV: &str = "PDFCHAT_RECONCILE_TOLERANCE";

/// Errors that can occur while loading window configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowConfigError {
    /// Invalid value for a configuration parameter
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
}

/// Settings for [`VirtualWindow`](crate::VirtualWindow).
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    /// Extra items kept mounted on each side of the visible region
    pub buffer_size: usize,
    /// Height in pixels assumed for items that have not been measured
    pub estimated_item_height: f64,
    /// Allowed mismatch in pixels between spacers plus mounted items and the
    /// full list height while estimates are in use
    pub reconcile_tolerance: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            buffer_size: 5,
            estimated_item_height: 120.0,
            reconcile_tolerance: 5.0,
        }
    }
}

impl WindowConfig {
    /// Sets the buffer size in items.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Sets the estimated item height. Non-positive or non-finite values are ignored.
    pub fn with_estimated_item_height(mut self, height: f64) -> Self {
        if height.is_finite() && height > 0.0 {
            self.estimated_item_height = height;
        }
        self
    }

    /// Sets the reconciliation tolerance. Negative or non-finite values are ignored.
    pub fn with_reconcile_tolerance(mut self, tolerance: f64) -> Self {
        if tolerance.is_finite() && tolerance >= 0.0 {
            self.reconcile_tolerance = tolerance;
        }
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PDFCHAT_WINDOW_BUFFER`: buffer size in items (default: 5)
    /// - `PDFCHAT_ESTIMATED_ITEM_HEIGHT`: estimated height in pixels (default: 120)
    /// - `PDFCHAT_RECONCILE_TOLERANCE`: tolerance in pixels (default: 5)
    pub fn from_env() -> Result<Self, WindowConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var(BUFFER_ENV) {
            config.buffer_size = parse_buffer(BUFFER_ENV, &val)?;
        }
        if let Ok(val) = std::env::var(ESTIMATE_ENV) {
            config.estimated_item_height = parse_estimate(ESTIMATE_ENV, &val)?;
        }
        if let Ok(val) = std::env::var(TOLERANCE_ENV) {
            config.reconcile_tolerance = parse_tolerance(TOLERANCE_ENV, &val)?;
        }

        tracing::debug!(?config, "loaded window config from environment");
        Ok(config)
    }

    /// Parses configuration from a flat TOML string.
    ///
    /// ```toml
    /// buffer_size = 5
    /// estimated_item_height = 120.0
    /// reconcile_tolerance = 5.0
    /// ```
    ///
    /// Comments and unknown keys are ignored.
    pub fn from_toml(toml_str: &str) -> Result<Self, WindowConfigError> {
        let mut config = Self::default();

        for line in toml_str.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"');

                match key {
                    "buffer_size" => config.buffer_size = parse_buffer(key, value)?,
                    "estimated_item_height" => {
                        config.estimated_item_height = parse_estimate(key, value)?
                    }
                    "reconcile_tolerance" => {
                        config.reconcile_tolerance = parse_tolerance(key, value)?
                    }
                    _ => {}
                }
            }
        }

        Ok(config)
    }

    /// Converts configuration to TOML format.
    pub fn to_toml(&self) -> String {
        format!(
            "buffer_size = {}\n\
             estimated_item_height = {:?}\n\
             reconcile_tolerance = {:?}\n",
            self.buffer_size, self.estimated_item_height, self.reconcile_tolerance
        )
    }
}

fn parse_buffer(key: &str, value: &str) -> Result<usize, WindowConfigError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| WindowConfigError::InvalidValue(key.to_string()))
}

fn parse_estimate(key: &str, value: &str) -> Result<f64, WindowConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|height| height.is_finite() && *height > 0.0)
        .ok_or_else(|| WindowConfigError::InvalidValue(key.to_string()))
}

fn parse_tolerance(key: &str, value: &str) -> Result<f64, WindowConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|tolerance| tolerance.is_finite() && *tolerance >= 0.0)
        .ok_or_else(|| WindowConfigError::InvalidValue(key.to_string()))
}
