//! Execution environment detection and the future types probes return.
//!
//! Browser futures wrap JS promises and are not `Send`, so the boxed future
//! types and the thread-safety bounds on probe traits differ per target.

use std::future::Future;

use futures::future::FutureExt;
use lightbox_cache::Dimensions;

use crate::error::ProbeError;

/// Where remote probes run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Browser-like host: probe by loading an image element
    Web,
    /// Native host: probe through a callback-style sizing API
    Native,
}

impl Platform {
    pub const fn current() -> Self {
        if cfg!(target_arch = "wasm32") {
            Platform::Web
        } else {
            Platform::Native
        }
    }
}

/// `Send + Sync` everywhere except wasm32
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSendSync: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}

/// `Send + Sync` everywhere except wasm32
#[cfg(target_arch = "wasm32")]
pub trait MaybeSendSync {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSendSync for T {}

/// Future returned by a remote probe
#[cfg(not(target_arch = "wasm32"))]
pub type ProbeFuture = futures::future::BoxFuture<'static, Result<Dimensions, ProbeError>>;

/// Future returned by a remote probe
#[cfg(target_arch = "wasm32")]
pub type ProbeFuture = futures::future::LocalBoxFuture<'static, Result<Dimensions, ProbeError>>;

#[cfg(not(target_arch = "wasm32"))]
pub fn boxed_probe<F>(future: F) -> ProbeFuture
where
    F: Future<Output = Result<Dimensions, ProbeError>> + Send + 'static,
{
    future.boxed()
}

#[cfg(target_arch = "wasm32")]
pub fn boxed_probe<F>(future: F) -> ProbeFuture
where
    F: Future<Output = Result<Dimensions, ProbeError>> + 'static,
{
    future.boxed_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_tests_run_on_native_platform() {
        assert_eq!(Platform::current(), Platform::Native);
    }

    #[test]
    fn test_boxed_probe_preserves_output() {
        let future = boxed_probe(async { Ok(Dimensions::new(3, 4)) });
        assert_eq!(pollster::block_on(future).unwrap(), Dimensions::new(3, 4));
    }
}
