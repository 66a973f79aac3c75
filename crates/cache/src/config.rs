//! Cache configuration for user-configurable cache capacities.
//!
//! Configuration can be loaded from a file, environment variables, or
//! created programmatically. Capacities are validated here, once, so the
//! caches themselves never see a zero capacity.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::page::DEFAULT_SCALE_STEPS;

const PAGE_CAPACITY_ENV: &str = "PDFCHAT_PAGE_CACHE_CAPACITY";
const FORMULA_CAPACITY_ENV: &str = "PDFCHAT_FORMULA_CACHE_CAPACITY";
const SCALE_STEPS_ENV: &str = "PDFCHAT_SCALE_STEPS";

/// Configuration for the render caches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of rendered page bitmaps kept in memory
    pub page_cache_capacity: NonZeroUsize,
    /// Maximum number of typeset formulas kept in memory
    pub formula_cache_capacity: NonZeroUsize,
    /// Quantization steps per unit of zoom scale for page keys
    pub scale_steps: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_cache_capacity: NonZeroUsize::new(50).unwrap_or(NonZeroUsize::MIN),
            formula_cache_capacity: NonZeroUsize::new(500).unwrap_or(NonZeroUsize::MIN),
            scale_steps: DEFAULT_SCALE_STEPS,
        }
    }
}

impl CacheConfig {
    /// Sets the page bitmap cache capacity.
    pub fn with_page_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.page_cache_capacity = capacity;
        self
    }

    /// Sets the formula cache capacity.
    pub fn with_formula_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.formula_cache_capacity = capacity;
        self
    }

    /// Sets the scale quantization steps (clamped to at least 1).
    pub fn with_scale_steps(mut self, steps: u32) -> Self {
        self.scale_steps = steps.max(1);
        self
    }

    /// Returns the default configuration file path for the current platform.
    ///
    /// - macOS: ~/Library/Application Support/pdfchat/cache.toml
    /// - Linux: ~/.config/pdfchat/cache.toml
    /// - Windows: %APPDATA%\pdfchat\cache.toml
    pub fn default_config_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("pdfchat").join("cache.toml")
        } else {
            PathBuf::from("pdfchat-cache.toml")
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PDFCHAT_PAGE_CACHE_CAPACITY`: page bitmap entries (default: 50)
    /// - `PDFCHAT_FORMULA_CACHE_CAPACITY`: formula entries (default: 500)
    /// - `PDFCHAT_SCALE_STEPS`: scale quantization steps per unit (default: 100)
    ///
    /// # Errors
    /// Returns an error if any variable is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var(PAGE_CAPACITY_ENV) {
            config.page_cache_capacity = parse_capacity(PAGE_CAPACITY_ENV, &val)?;
        }
        if let Ok(val) = std::env::var(FORMULA_CAPACITY_ENV) {
            config.formula_cache_capacity = parse_capacity(FORMULA_CAPACITY_ENV, &val)?;
        }
        if let Ok(val) = std::env::var(SCALE_STEPS_ENV) {
            config.scale_steps = parse_capacity(SCALE_STEPS_ENV, &val)?
                .get()
                .try_into()
                .map_err(|_| ConfigError::InvalidValue(SCALE_STEPS_ENV.to_string()))?;
        }

        tracing::debug!(?config, "loaded cache config from environment");
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// Expected file format:
    /// ```toml
    /// page_cache_capacity = 50
    /// formula_cache_capacity = 500
    /// scale_steps = 100
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a value is invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!(path = %path.as_ref().display(), ?config, "loaded cache config");
        Ok(config)
    }

    /// Parses configuration from a flat TOML string. Unknown keys are ignored.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
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
                    "page_cache_capacity" => {
                        config.page_cache_capacity = parse_capacity(key, value)?;
                    }
                    "formula_cache_capacity" => {
                        config.formula_cache_capacity = parse_capacity(key, value)?;
                    }
                    "scale_steps" => {
                        config.scale_steps = value
                            .parse::<u32>()
                            .ok()
                            .filter(|steps| *steps > 0)
                            .ok_or_else(|| ConfigError::InvalidValue(key.to_string()))?;
                    }
                    _ => {}
                }
            }
        }

        Ok(config)
    }

    /// Saves configuration to a TOML file, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path.as_ref(), self.to_toml())?;
        Ok(())
    }

    /// Converts configuration to TOML format.
    pub fn to_toml(&self) -> String {
        format!(
            "# pdfchat render cache configuration\n\
             page_cache_capacity = {}\n\
             formula_cache_capacity = {}\n\
             scale_steps = {}\n",
            self.page_cache_capacity, self.formula_cache_capacity, self.scale_steps
        )
    }
}

fn parse_capacity(key: &str, value: &str) -> Result<NonZeroUsize, ConfigError> {
    value
        .trim()
        .parse::<NonZeroUsize>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}
