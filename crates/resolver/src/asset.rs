//! Synchronous metadata lookup for bundled assets.

use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lightbox_cache::Dimensions;

use crate::error::ProbeError;
use crate::identifier::AssetHandle;
use crate::platform::MaybeSendSync;

/// Host facility that reports the size of a bundled asset
///
/// Lookups are synchronous but assumed non-free, which is why the resolver
/// caches their results like any remote probe.
pub trait AssetMetadata: MaybeSendSync {
    fn asset_dimensions(&self, handle: AssetHandle) -> Result<Dimensions, ProbeError>;
}

#[derive(Debug, Clone)]
enum AssetSource {
    /// Size known up front, e.g. baked in at build time
    Known(Dimensions),
    /// Image file whose header is read on lookup
    #[cfg(not(target_arch = "wasm32"))]
    File(PathBuf),
}

/// In-process asset table handing out handles
///
/// # Example
///
/// ```
/// use lightbox_cache::Dimensions;
/// use lightbox_resolver::{AssetMetadata, AssetRegistry};
///
/// let registry = AssetRegistry::new();
/// let logo = registry.register_dimensions(Dimensions::new(120, 40));
///
/// assert_eq!(registry.asset_dimensions(logo).unwrap(), Dimensions::new(120, 40));
/// ```
#[derive(Debug, Default)]
pub struct AssetRegistry {
    state: Mutex<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    assets: HashMap<AssetHandle, AssetSource>,
    last_handle: u32,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, source: AssetSource) -> AssetHandle {
        let mut state = self.lock();
        // Handles start at 1 and are never reused
        state.last_handle += 1;
        let handle = AssetHandle(state.last_handle);
        state.assets.insert(handle, source);
        handle
    }

    /// Register an asset whose size is already known
    pub fn register_dimensions(&self, dimensions: Dimensions) -> AssetHandle {
        self.register(AssetSource::Known(dimensions))
    }

    /// Register an image file; its header is read when the size is requested
    #[cfg(not(target_arch = "wasm32"))]
    pub fn register_file(&self, path: impl Into<PathBuf>) -> AssetHandle {
        self.register(AssetSource::File(path.into()))
    }

    pub fn len(&self) -> usize {
        self.lock().assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().assets.is_empty()
    }
}

impl AssetMetadata for AssetRegistry {
    fn asset_dimensions(&self, handle: AssetHandle) -> Result<Dimensions, ProbeError> {
        // Clone out so file reads happen without holding the lock
        let source = self
            .lock()
            .assets
            .get(&handle)
            .cloned()
            .ok_or(ProbeError::UnknownAsset(handle))?;

        match source {
            AssetSource::Known(dimensions) => Ok(dimensions),
            #[cfg(not(target_arch = "wasm32"))]
            AssetSource::File(path) => image::image_dimensions(&path)
                .map(Dimensions::from)
                .map_err(|err| ProbeError::Decode(format!("{}: {err}", path.display()))),
        }
    }
}
