//! Cancellation tokens for outstanding resolutions
//!
//! A resolution keeps running after its consumer goes away so the shared
//! cache still gets populated. The token only decides whether the result is
//! applied to the consumer's own state once it arrives.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cancellation token for a single consumer of a resolution
///
/// Clones share the same flag.
///
/// # Example
///
/// ```
/// use lightbox_resolver::CancellationToken;
///
/// let token = CancellationToken::new();
/// let pending = token.clone();
///
/// // The view unmounts before the probe completes
/// token.cancel();
///
/// assert!(pending.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new cancellation token
    ///
    /// The token starts in a non-cancelled state.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel this token
    ///
    /// All clones observe the cancellation. Calling it more than once has no
    /// further effect.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` if `cancel()` has been called on this token or any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
