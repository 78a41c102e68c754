//! Native sizing API backed by blocking HTTP on IO threads.
//!
//! Each request runs on its own short-lived thread and reads only a bounded
//! prefix of the response before decoding the image header. `file://` URIs
//! are read straight from disk.

use std::io::{Cursor, Read};
use std::path::Path;
use std::thread;

use lightbox_cache::Dimensions;

use crate::error::ProbeError;
use crate::identifier::Headers;
use crate::probe::{FailureCallback, PlatformSizer, SizeCallback};

/// Upper bound on bytes pulled from a response before decoding the header.
pub const DEFAULT_MAX_HEADER_BYTES: u64 = 512 * 1024;

/// [`PlatformSizer`] that fetches images with `ureq`
///
/// Only the first `max_header_bytes` of a response are read up front. Some
/// JPEGs carry EXIF blocks or embedded thumbnails ahead of the frame header;
/// when the prefix is exhausted without a decodable header the rest of the
/// body is read once and decoding is retried.
#[derive(Debug, Clone)]
pub struct NetworkSizer {
    agent: ureq::Agent,
    max_header_bytes: u64,
}

impl Default for NetworkSizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkSizer {
    pub fn new() -> Self {
        Self::with_agent(ureq::Agent::new())
    }

    /// Use a preconfigured agent, e.g. one with proxies or timeouts set
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self {
            agent,
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
        }
    }

    pub fn with_max_header_bytes(mut self, bytes: u64) -> Self {
        self.max_header_bytes = bytes;
        self
    }

    /// Fetch `uri` and decode its dimensions on the calling thread
    pub fn fetch_dimensions(
        &self,
        uri: &str,
        headers: Option<&Headers>,
    ) -> Result<Dimensions, ProbeError> {
        if let Some(path) = uri.strip_prefix("file://") {
            return read_file_dimensions(Path::new(path));
        }

        if !(uri.starts_with("http://") || uri.starts_with("https://")) {
            return Err(ProbeError::Unsupported(uri.to_string()));
        }

        let mut request = self.agent.get(uri);
        for (name, value) in headers.into_iter().flatten() {
            request = request.set(name, value);
        }

        let response = request.call().map_err(|err| match err {
            ureq::Error::Status(status, _) => ProbeError::Status {
                uri: uri.to_string(),
                status,
            },
            ureq::Error::Transport(transport) => ProbeError::Transport(transport.to_string()),
        })?;

        let mut reader = response.into_reader();
        let mut bytes = Vec::new();
        reader
            .by_ref()
            .take(self.max_header_bytes)
            .read_to_end(&mut bytes)?;

        match decode_header(&bytes) {
            Err(err) if bytes.len() as u64 >= self.max_header_bytes => {
                tracing::debug!(uri, error = %err, "no header in prefix; reading full body");
                reader.read_to_end(&mut bytes)?;
                decode_header(&bytes)
            }
            result => result,
        }
    }
}

fn read_file_dimensions(path: &Path) -> Result<Dimensions, ProbeError> {
    image::image_dimensions(path)
        .map(Dimensions::from)
        .map_err(|err| ProbeError::Decode(format!("{}: {err}", path.display())))
}

/// Decode width and height from the leading bytes of an encoded image
pub fn decode_header(bytes: &[u8]) -> Result<Dimensions, ProbeError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
        .map(Dimensions::from)
        .map_err(|err| ProbeError::Decode(err.to_string()))
}

impl PlatformSizer for NetworkSizer {
    fn get_size_with_headers(
        &self,
        uri: &str,
        headers: Option<&Headers>,
        on_success: SizeCallback,
        on_failure: FailureCallback,
    ) {
        let sizer = self.clone();
        let uri = uri.to_string();
        let headers = headers.cloned();

        let spawned = thread::Builder::new()
            .name("lightbox-probe".to_string())
            .spawn(move || match sizer.fetch_dimensions(&uri, headers.as_ref()) {
                Ok(dimensions) => on_success(dimensions.width, dimensions.height),
                Err(err) => on_failure(err),
            });

        // The callbacks went down with the closure, so the waiting probe
        // observes a dropped reply.
        if let Err(err) = spawned {
            tracing::warn!(error = %err, "failed to spawn probe thread");
        }
    }
}
