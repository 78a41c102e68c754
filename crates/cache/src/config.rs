//! Cache configuration.
//!
//! The dimension cache is sized by entry count rather than bytes: each entry
//! is a key string plus two integers, so memory is never the limiting factor.
//! Configuration can come from the environment or be built programmatically.

use thiserror::Error;

/// Environment variable overriding the cache capacity.
pub const CAPACITY_ENV: &str = "LIGHTBOX_DIMENSION_CACHE_CAPACITY";

/// Number of entries the cache holds when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 50;

/// Configuration for the dimension cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries retained before LRU eviction kicks in
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Sets the entry capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// - `LIGHTBOX_DIMENSION_CACHE_CAPACITY`: entry capacity (default: 50)
    ///
    /// # Errors
    /// Returns an error if a variable is set to something that is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var(CAPACITY_ENV) {
            config.capacity = parse_capacity(CAPACITY_ENV, &val)?;
        }

        Ok(config)
    }
}

/// Parses a capacity value, rejecting zero.
pub fn parse_capacity(key: &str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidValue(key.to_string())),
        Ok(capacity) => Ok(capacity),
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid value for a configuration parameter
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),

    /// I/O error reading or writing a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("malformed configuration: {0}")]
    Parse(String),
}
