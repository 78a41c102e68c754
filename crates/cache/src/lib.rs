//! Lightbox Dimension Cache
//!
//! Bounded, process-wide memoization of image dimensions with LRU eviction.

pub mod config;
pub mod dimensions;
pub mod ram;

pub use config::{CacheConfig, ConfigError, DEFAULT_CAPACITY};
pub use dimensions::Dimensions;
pub use ram::{CacheStats, DimensionCache};
