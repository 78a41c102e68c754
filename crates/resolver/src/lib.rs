//! Lightbox Dimension Resolver
//!
//! Resolves the pixel dimensions of local assets and remote images through a
//! shared [`DimensionCache`](lightbox_cache::DimensionCache).
//!
//! On a cache miss, local assets are looked up synchronously through
//! [`AssetMetadata`] and remote sources are probed asynchronously through a
//! [`RemoteProbe`]: an image element in the browser, a callback-style sizing
//! API ([`PlatformSizer`]) everywhere else. Resolution never fails; when the
//! size cannot be determined the result is
//! [`Dimensions::UNKNOWN`](lightbox_cache::Dimensions::UNKNOWN).
//!
//! # Example
//!
//! ```no_run
//! use lightbox_cache::DimensionCache;
//! use lightbox_resolver::{DimensionResolver, ImageIdentifier};
//!
//! let resolver = DimensionResolver::new(DimensionCache::default());
//! let image = ImageIdentifier::remote("https://example.com/photo.jpg");
//!
//! let dims = pollster::block_on(resolver.resolve(&image));
//! if dims.is_unknown() {
//!     println!("could not size {}", image.cache_key());
//! }
//! ```

mod asset;
#[cfg(target_arch = "wasm32")]
mod browser;
mod cancel;
mod error;
mod identifier;
#[cfg(not(target_arch = "wasm32"))]
mod network;
mod platform;
mod probe;
mod resolver;

pub use asset::{AssetMetadata, AssetRegistry};
#[cfg(target_arch = "wasm32")]
pub use browser::BrowserProbe;
pub use cancel::CancellationToken;
pub use error::ProbeError;
pub use identifier::{AssetHandle, Headers, ImageIdentifier};
#[cfg(not(target_arch = "wasm32"))]
pub use network::{decode_header, NetworkSizer, DEFAULT_MAX_HEADER_BYTES};
pub use platform::{boxed_probe, MaybeSendSync, Platform, ProbeFuture};
pub use probe::{CallbackProbe, FailureCallback, PlatformSizer, RemoteProbe, SizeCallback};
pub use resolver::{default_remote_probe, DimensionResolver, Resolution, ResolverBuilder};
