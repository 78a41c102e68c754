//! Per-instance image view state.
//!
//! An [`ImageView`] ties one displayed image to the shared resolver: it owns
//! the zoom state, the viewport, and the dimensions slot that a pending
//! resolution fills in. Switching images or dropping the view cancels the
//! outstanding load so a late result never lands on the wrong image.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use lightbox_cache::Dimensions;
use lightbox_resolver::{CancellationToken, DimensionResolver, ImageIdentifier, Resolution};

use crate::config::ViewerConfig;
use crate::transform::{compute_layout, compute_transform, ImageLayout, Transform, Viewport};
use crate::zoom::{ZoomController, ZoomState};

type DimensionsSlot = Arc<Mutex<Option<Dimensions>>>;

/// What happened to a load once its resolution finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Dimensions were stored on the view
    Applied(Dimensions),
    /// The view moved on or was dropped; the result was only cached
    Discarded(Dimensions),
}

#[derive(Debug)]
pub struct ImageView {
    resolver: DimensionResolver,
    viewport: Viewport,
    zoom: ZoomController,
    long_press_delay: Duration,
    image: Option<ImageIdentifier>,
    dimensions: DimensionsSlot,
    load: CancellationToken,
}

impl ImageView {
    pub fn new(resolver: DimensionResolver, viewport: Viewport, config: &ViewerConfig) -> Self {
        let mut zoom = ZoomController::new();
        zoom.set_enabled(config.double_tap_to_zoom);

        Self {
            resolver,
            viewport,
            zoom,
            long_press_delay: config.long_press_delay,
            image: None,
            dimensions: Arc::new(Mutex::new(None)),
            load: CancellationToken::new(),
        }
    }

    /// Show `image`, returning the load the host must drive to completion
    ///
    /// Returns `None` when `image` is already shown. Otherwise the previous
    /// load is cancelled, the dimensions are cleared and zoom goes back to
    /// `Normal`.
    pub fn set_image(
        &mut self,
        image: ImageIdentifier,
    ) -> Option<impl Future<Output = LoadOutcome> + 'static> {
        if self.image.as_ref() == Some(&image) {
            return None;
        }

        self.load.cancel();
        let token = CancellationToken::new();
        self.load = token.clone();

        // A fresh slot per load: a stale load can only ever write into the
        // slot of the image it was started for.
        let slot: DimensionsSlot = Arc::new(Mutex::new(None));
        self.dimensions = Arc::clone(&slot);

        self.zoom.reset();
        self.image = Some(image.clone());

        let resolver = self.resolver.clone();
        Some(async move {
            match resolver.resolve_with(&image, &token).await {
                Resolution::Ready(dimensions) => {
                    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(dimensions);
                    LoadOutcome::Applied(dimensions)
                }
                Resolution::Discarded(dimensions) => LoadOutcome::Discarded(dimensions),
            }
        })
    }

    pub fn image(&self) -> Option<&ImageIdentifier> {
        self.image.as_ref()
    }

    /// Resolved dimensions, `None` until the current load has been applied
    pub fn dimensions(&self) -> Option<Dimensions> {
        *self
            .dimensions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// `true` while the host should show a loading indicator
    ///
    /// Unknown dimensions keep the view loading indefinitely.
    pub fn is_loading(&self) -> bool {
        self.dimensions().map_or(true, |dims| dims.is_unknown())
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn transform(&self) -> Transform {
        compute_transform(self.dimensions(), self.viewport, self.zoom.state())
    }

    pub fn layout(&self) -> Option<ImageLayout> {
        compute_layout(self.dimensions(), self.viewport, self.zoom.state())
    }

    pub fn zoom_state(&self) -> ZoomState {
        self.zoom.state()
    }

    /// Double-tap / double-click handler
    pub fn toggle_zoom(&mut self) -> ZoomState {
        self.zoom.toggle()
    }

    /// Register the listener notified with the new "is zoomed" value
    pub fn on_zoom(&mut self, listener: impl FnMut(bool) + 'static) {
        self.zoom.set_listener(listener);
    }

    pub fn set_double_tap_to_zoom(&mut self, enabled: bool) {
        self.zoom.set_enabled(enabled);
    }

    pub fn long_press_delay(&self) -> Duration {
        self.long_press_delay
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        self.load.cancel();
    }
}
