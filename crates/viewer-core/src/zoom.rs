//! Two-level zoom state machine.
//!
//! An image view is either fitted (`Normal`, scale 1) or magnified (`Zoomed`,
//! scale 2). Only an explicit toggle moves between the two; continuous pinch
//! scaling is layered on top by the gesture code and never stored here.

use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ZoomState {
    #[default]
    Normal,
    Zoomed,
}

impl ZoomState {
    pub const NORMAL_SCALE: f32 = 1.0;
    pub const ZOOMED_SCALE: f32 = 2.0;

    pub fn scale(self) -> f32 {
        match self {
            Self::Normal => Self::NORMAL_SCALE,
            Self::Zoomed => Self::ZOOMED_SCALE,
        }
    }

    pub fn is_zoomed(self) -> bool {
        self == Self::Zoomed
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Normal => Self::Zoomed,
            Self::Zoomed => Self::Normal,
        }
    }
}

/// Receives the new "is zoomed" value after every toggle
pub type ZoomListener = Box<dyn FnMut(bool)>;

/// Zoom state of one image view plus its change listener
pub struct ZoomController {
    state: ZoomState,
    enabled: bool,
    listener: Option<ZoomListener>,
}

impl ZoomController {
    pub fn new() -> Self {
        Self {
            state: ZoomState::Normal,
            enabled: true,
            listener: None,
        }
    }

    pub fn state(&self) -> ZoomState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable double-tap zoom; disabling does not unzoom
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_listener(&mut self, listener: impl FnMut(bool) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Flip between `Normal` and `Zoomed` and notify the listener once
    ///
    /// No-op while disabled.
    pub fn toggle(&mut self) -> ZoomState {
        if !self.enabled {
            return self.state;
        }

        self.state = self.state.toggled();
        tracing::debug!(state = ?self.state, "zoom toggled");

        if let Some(listener) = self.listener.as_mut() {
            listener(self.state.is_zoomed());
        }

        self.state
    }

    /// Return to `Normal` without notifying, used when the image changes
    pub fn reset(&mut self) {
        self.state = ZoomState::Normal;
    }
}

impl Default for ZoomController {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ZoomController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoomController")
            .field("state", &self.state)
            .field("enabled", &self.enabled)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording() -> (ZoomController, Rc<RefCell<Vec<bool>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut zoom = ZoomController::new();
        zoom.set_listener(move |zoomed| sink.borrow_mut().push(zoomed));
        (zoom, events)
    }

    #[test]
    fn test_scales_are_one_and_two() {
        assert_eq!(ZoomState::Normal.scale(), 1.0);
        assert_eq!(ZoomState::Zoomed.scale(), 2.0);
    }

    #[test]
    fn test_double_toggle_returns_to_normal() {
        assert_eq!(ZoomState::Normal.toggled().toggled(), ZoomState::Normal);

        let (mut zoom, _) = recording();
        zoom.toggle();
        assert_eq!(zoom.toggle(), ZoomState::Normal);
    }

    #[test]
    fn test_each_toggle_notifies_once() {
        let (mut zoom, events) = recording();

        assert_eq!(zoom.toggle(), ZoomState::Zoomed);
        assert_eq!(*events.borrow(), vec![true]);

        assert_eq!(zoom.toggle(), ZoomState::Normal);
        assert_eq!(*events.borrow(), vec![true, false]);
    }

    #[test]
    fn test_reset_is_silent() {
        let (mut zoom, events) = recording();
        zoom.toggle();
        zoom.reset();

        assert_eq!(zoom.state(), ZoomState::Normal);
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn test_disabled_toggle_does_nothing() {
        let (mut zoom, events) = recording();
        zoom.set_enabled(false);

        assert_eq!(zoom.toggle(), ZoomState::Normal);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_cleared_listener_stops_notifications() {
        let (mut zoom, events) = recording();
        assert!(zoom.is_enabled());

        zoom.toggle();
        zoom.clear_listener();
        zoom.toggle();

        assert_eq!(*events.borrow(), vec![true]);
        assert_eq!(zoom.state(), ZoomState::Normal);
    }
}
