//! Remote dimension probes.
//!
//! [`RemoteProbe`] is the seam the resolver awaits on. Native hosts usually
//! expose image sizing as a callback API instead of a future; [`CallbackProbe`]
//! adapts any [`PlatformSizer`] to the future-based seam.

use std::sync::{Arc, Mutex, PoisonError};

use futures::channel::oneshot;
use lightbox_cache::Dimensions;

use crate::error::ProbeError;
use crate::identifier::Headers;
use crate::platform::{boxed_probe, MaybeSendSync, ProbeFuture};

/// Asynchronously determines the size of an image behind a URI
///
/// A returned error is terminal for that attempt; the resolver does not
/// retry it.
pub trait RemoteProbe: MaybeSendSync {
    fn probe(&self, uri: &str, headers: Option<&Headers>) -> ProbeFuture;
}

/// Invoked with `(width, height)` once the size is known
pub type SizeCallback = Box<dyn FnOnce(u32, u32) + Send>;

/// Invoked when the size could not be determined
pub type FailureCallback = Box<dyn FnOnce(ProbeError) + Send>;

/// Callback-style platform sizing API
///
/// Implementations call exactly one of the callbacks, possibly from another
/// thread. Dropping both without calling either is reported as
/// [`ProbeError::Dropped`].
pub trait PlatformSizer: MaybeSendSync {
    fn get_size_with_headers(
        &self,
        uri: &str,
        headers: Option<&Headers>,
        on_success: SizeCallback,
        on_failure: FailureCallback,
    );
}

/// Bridges a [`PlatformSizer`] to [`RemoteProbe`]
#[derive(Debug, Clone, Default)]
pub struct CallbackProbe<S> {
    sizer: S,
}

impl<S: PlatformSizer> CallbackProbe<S> {
    pub fn new(sizer: S) -> Self {
        Self { sizer }
    }

    pub fn sizer(&self) -> &S {
        &self.sizer
    }
}

type Reply = Arc<Mutex<Option<oneshot::Sender<Result<Dimensions, ProbeError>>>>>;

fn send_once(reply: &Reply, result: Result<Dimensions, ProbeError>) {
    let sender = reply.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(sender) = sender {
        // The receiver is gone only if the probe future was dropped
        let _ = sender.send(result);
    }
}

impl<S: PlatformSizer> RemoteProbe for CallbackProbe<S> {
    fn probe(&self, uri: &str, headers: Option<&Headers>) -> ProbeFuture {
        let (sender, receiver) = oneshot::channel();
        let reply: Reply = Arc::new(Mutex::new(Some(sender)));
        let failure_reply = Arc::clone(&reply);

        self.sizer.get_size_with_headers(
            uri,
            headers,
            Box::new(move |width, height| send_once(&reply, Ok(Dimensions::new(width, height)))),
            Box::new(move |err| send_once(&failure_reply, Err(err))),
        );

        boxed_probe(async move { receiver.await.unwrap_or(Err(ProbeError::Dropped)) })
    }
}
