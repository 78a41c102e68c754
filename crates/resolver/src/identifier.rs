//! Image identifiers and their cache keys.

use std::collections::BTreeMap;
use std::fmt;

/// Request headers attached to a remote image
pub type Headers = BTreeMap<String, String>;

/// Opaque process-local reference to a bundled image asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetHandle(pub u32);

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies the image whose dimensions are wanted
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageIdentifier {
    /// Asset bundled with the application, resolved synchronously
    LocalAsset { handle: AssetHandle },

    /// Image behind a URI, optionally fetched with extra request headers
    RemoteSource {
        uri: String,
        headers: Option<Headers>,
    },
}

impl ImageIdentifier {
    pub fn local(handle: AssetHandle) -> Self {
        Self::LocalAsset { handle }
    }

    pub fn remote(uri: impl Into<String>) -> Self {
        Self::RemoteSource {
            uri: uri.into(),
            headers: None,
        }
    }

    pub fn remote_with_headers(uri: impl Into<String>, headers: Headers) -> Self {
        Self::RemoteSource {
            uri: uri.into(),
            headers: Some(headers),
        }
    }

    /// Key under which resolved dimensions are cached
    ///
    /// Local assets use the handle's decimal form; remote sources use the URI
    /// alone, so the same image fetched with different headers shares one
    /// entry.
    pub fn cache_key(&self) -> String {
        match self {
            Self::LocalAsset { handle } => handle.to_string(),
            Self::RemoteSource { uri, .. } => uri.clone(),
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::LocalAsset { .. } => None,
            Self::RemoteSource { uri, .. } => Some(uri),
        }
    }
}

impl From<AssetHandle> for ImageIdentifier {
    fn from(handle: AssetHandle) -> Self {
        Self::local(handle)
    }
}
