//! Pixel dimensions of an image.

use std::fmt;

/// Intrinsic width and height of an image in pixels.
///
/// `{0, 0}` is the "unknown" sentinel: a resolution that could not determine
/// the size produces it instead of an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,
}

impl Dimensions {
    /// Sentinel for dimensions that could not be determined
    pub const UNKNOWN: Dimensions = Dimensions { width: 0, height: 0 };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either side is zero.
    ///
    /// A zero-sized image cannot be laid out, so it is treated the same as the
    /// sentinel.
    pub fn is_unknown(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width divided by height, or `None` for unknown dimensions.
    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.is_unknown() {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
