use thiserror::Error;

use crate::identifier::AssetHandle;

/// Reasons a probe could not report dimensions.
///
/// These never leave the resolver: they are logged and turned into
/// [`Dimensions::UNKNOWN`](lightbox_cache::Dimensions::UNKNOWN).
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no asset registered for handle {0}")]
    UnknownAsset(AssetHandle),

    #[error("request for {uri} failed with status {status}")]
    Status { uri: String, status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not read image header: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported image source: {0}")]
    Unsupported(String),

    /// The platform sizing API dropped both callbacks without calling either
    #[error("probe was dropped before reporting a result")]
    Dropped,
}
