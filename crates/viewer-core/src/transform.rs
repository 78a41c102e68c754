//! Fit-and-center transform for an image inside a viewport.
//!
//! The image is scaled down to fit ("contain", never upscaled) and centered.
//! Translation is always computed from the unzoomed fitted size; the zoom
//! level is applied as a multiplier on top so the zoom pivot stays centered.

use lightbox_cache::Dimensions;

use crate::zoom::ZoomState;

/// Size of the display area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
}

impl Transform {
    /// Neutral transform used while dimensions are unknown
    pub const IDENTITY: Transform = Transform {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Fitted image size together with its transform, ready to render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageLayout {
    pub width: f32,
    pub height: f32,
    pub transform: Transform,
}

/// Ratio that fits `dimensions` inside `viewport` without upscaling
pub fn fit_ratio(dimensions: Dimensions, viewport: Viewport) -> Option<f32> {
    if dimensions.is_unknown() || viewport.is_empty() {
        return None;
    }

    let width = viewport.width / dimensions.width as f32;
    let height = viewport.height / dimensions.height as f32;

    Some(width.min(height).min(1.0))
}

/// Size of the image once fitted into the viewport at scale 1
pub fn fitted_size(dimensions: Dimensions, viewport: Viewport) -> Option<(f32, f32)> {
    let ratio = fit_ratio(dimensions, viewport)?;
    Some((
        dimensions.width as f32 * ratio,
        dimensions.height as f32 * ratio,
    ))
}

pub fn compute_transform(
    dimensions: Option<Dimensions>,
    viewport: Viewport,
    zoom: ZoomState,
) -> Transform {
    compute_layout(dimensions, viewport, zoom)
        .map(|layout| layout.transform)
        .unwrap_or(Transform::IDENTITY)
}

/// Layout for the image, or `None` while its dimensions are unknown
pub fn compute_layout(
    dimensions: Option<Dimensions>,
    viewport: Viewport,
    zoom: ZoomState,
) -> Option<ImageLayout> {
    let (width, height) = fitted_size(dimensions?, viewport)?;

    Some(ImageLayout {
        width,
        height,
        transform: Transform {
            translate_x: (viewport.width - width) / 2.0,
            translate_y: (viewport.height - height) / 2.0,
            scale: zoom.scale(),
        },
    })
}
