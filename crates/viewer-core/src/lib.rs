//! Lightbox Viewer Core
//!
//! Fit-and-center transforms, the two-level zoom state machine and the
//! per-view binding that ties them to resolved image dimensions.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lightbox_cache::{DimensionCache, Dimensions};
//! use lightbox_resolver::{AssetRegistry, DimensionResolver, ImageIdentifier};
//! use lightbox_viewer_core::{ImageView, ViewerConfig, Viewport, ZoomState};
//!
//! let config = ViewerConfig::default();
//! let assets = Arc::new(AssetRegistry::new());
//! let photo = assets.register_dimensions(Dimensions::new(200, 100));
//!
//! let resolver = DimensionResolver::builder()
//!     .cache(DimensionCache::with_config(config.cache))
//!     .assets(assets)
//!     .build();
//!
//! let mut view = ImageView::new(resolver, Viewport::new(800.0, 400.0), &config);
//! if let Some(load) = view.set_image(ImageIdentifier::local(photo)) {
//!     pollster::block_on(load);
//! }
//!
//! let transform = view.transform();
//! assert_eq!((transform.translate_x, transform.translate_y), (300.0, 150.0));
//!
//! assert_eq!(view.toggle_zoom(), ZoomState::Zoomed);
//! assert_eq!(view.transform().scale, 2.0);
//! ```

pub mod config;
pub mod transform;
pub mod view;
pub mod zoom;

pub use config::{ViewerConfig, DEFAULT_LONG_PRESS_DELAY};
pub use transform::{
    compute_layout, compute_transform, fit_ratio, fitted_size, ImageLayout, Transform, Viewport,
};
pub use view::{ImageView, LoadOutcome};
pub use zoom::{ZoomController, ZoomListener, ZoomState};
