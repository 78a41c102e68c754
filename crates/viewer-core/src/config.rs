//! Viewer configuration.
//!
//! Holds the cache sizing plus the per-view behavior knobs. Configuration can
//! be loaded from a JSON file, from environment variables, or built
//! programmatically.

use std::fs;
use std::path::Path;
use std::time::Duration;

use lightbox_cache::{CacheConfig, ConfigError};
use serde::{Deserialize, Serialize};

pub const LONG_PRESS_ENV: &str = "LIGHTBOX_LONG_PRESS_MS";
pub const DOUBLE_TAP_ENV: &str = "LIGHTBOX_DOUBLE_TAP_ZOOM";

/// Long-press delay handed to the gesture layer by default
pub const DEFAULT_LONG_PRESS_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Dimension cache sizing
    pub cache: CacheConfig,
    /// Passed through untouched to the gesture layer
    pub long_press_delay: Duration,
    /// Whether double-tap toggles zoom
    pub double_tap_to_zoom: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            long_press_delay: DEFAULT_LONG_PRESS_DELAY,
            double_tap_to_zoom: true,
        }
    }
}

/// On-disk representation; missing keys keep their defaults
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    cache_capacity: Option<usize>,
    long_press_ms: Option<u64>,
    double_tap_to_zoom: Option<bool>,
}

impl ViewerConfig {
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = self.cache.with_capacity(capacity);
        self
    }

    pub fn with_long_press_delay(mut self, delay: Duration) -> Self {
        self.long_press_delay = delay;
        self
    }

    pub fn with_double_tap_to_zoom(mut self, enabled: bool) -> Self {
        self.double_tap_to_zoom = enabled;
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// - `LIGHTBOX_DIMENSION_CACHE_CAPACITY`: cache entries (default: 50)
    /// - `LIGHTBOX_LONG_PRESS_MS`: long-press delay in milliseconds (default: 800)
    /// - `LIGHTBOX_DOUBLE_TAP_ZOOM`: `true`/`false`/`1`/`0` (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self {
            cache: CacheConfig::from_env()?,
            ..Self::default()
        };

        if let Ok(val) = std::env::var(LONG_PRESS_ENV) {
            let millis = val
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue(LONG_PRESS_ENV.to_string()))?;
            config.long_press_delay = Duration::from_millis(millis);
        }

        if let Ok(val) = std::env::var(DOUBLE_TAP_ENV) {
            config.double_tap_to_zoom = match val.trim() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => return Err(ConfigError::InvalidValue(DOUBLE_TAP_ENV.to_string())),
            };
        }

        Ok(config)
    }

    /// Loads configuration from a JSON file.
    ///
    /// ```json
    /// { "cache_capacity": 50, "long_press_ms": 800, "double_tap_to_zoom": true }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;

        let mut config = Self::default();
        if let Some(capacity) = file.cache_capacity {
            if capacity == 0 {
                return Err(ConfigError::InvalidValue("cache_capacity".to_string()));
            }
            config.cache.capacity = capacity;
        }
        if let Some(millis) = file.long_press_ms {
            config.long_press_delay = Duration::from_millis(millis);
        }
        if let Some(enabled) = file.double_tap_to_zoom {
            config.double_tap_to_zoom = enabled;
        }

        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        let file = ConfigFile {
            cache_capacity: Some(self.cache.capacity),
            long_press_ms: Some(self.long_press_delay.as_millis() as u64),
            double_tap_to_zoom: Some(self.double_tap_to_zoom),
        };
        serde_json::to_string_pretty(&file).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }
}
