//! Dimension resolver
//!
//! Turns an [`ImageIdentifier`] into [`Dimensions`], consulting the shared
//! [`DimensionCache`] first and dispatching to the asset table or the remote
//! probe on a miss. Successful results are cached before they are returned;
//! failures resolve to [`Dimensions::UNKNOWN`] and are left uncached so a
//! later attempt can retry.
//!
//! Concurrent resolutions of the same uncached remote key share a single
//! probe. The probe runs detached from its callers: dropping every waiting
//! future stops the waiting, not the probe, and its result is still cached.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::channel::oneshot;
use futures::future::{self, FutureExt, Shared};
use lightbox_cache::{DimensionCache, Dimensions};
use tracing::Instrument;

use crate::asset::{AssetMetadata, AssetRegistry};
use crate::cancel::CancellationToken;
use crate::error::ProbeError;
use crate::identifier::{AssetHandle, Headers, ImageIdentifier};
use crate::platform::Platform;
use crate::probe::RemoteProbe;

#[cfg(not(target_arch = "wasm32"))]
type PendingFuture = futures::future::BoxFuture<'static, Option<Dimensions>>;

#[cfg(target_arch = "wasm32")]
type PendingFuture = futures::future::LocalBoxFuture<'static, Option<Dimensions>>;

#[cfg(not(target_arch = "wasm32"))]
fn boxed_pending<F>(future: F) -> PendingFuture
where
    F: Future<Output = Option<Dimensions>> + Send + 'static,
{
    future.boxed()
}

#[cfg(target_arch = "wasm32")]
fn boxed_pending<F>(future: F) -> PendingFuture
where
    F: Future<Output = Option<Dimensions>> + 'static,
{
    future.boxed_local()
}

/// Run `job` to completion independently of whoever awaits its result
#[cfg(not(target_arch = "wasm32"))]
fn detach<F>(job: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    std::thread::Builder::new()
        .name("lightbox-resolve".to_string())
        .spawn(move || futures::executor::block_on(job))
        .map(drop)
}

#[cfg(target_arch = "wasm32")]
fn detach<F>(job: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(job);
    Ok(())
}

/// Remote probe matching the current [`Platform`]
pub fn default_remote_probe() -> Arc<dyn RemoteProbe> {
    #[cfg(target_arch = "wasm32")]
    {
        Arc::new(crate::browser::BrowserProbe::new())
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Arc::new(crate::probe::CallbackProbe::new(
            crate::network::NetworkSizer::new(),
        ))
    }
}

/// Result of a resolution made on behalf of a cancellable consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The consumer is still interested; apply the dimensions
    Ready(Dimensions),
    /// The consumer cancelled while the probe was outstanding
    Discarded(Dimensions),
}

impl Resolution {
    pub fn dimensions(&self) -> Dimensions {
        match self {
            Resolution::Ready(dimensions) | Resolution::Discarded(dimensions) => *dimensions,
        }
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self, Resolution::Discarded(_))
    }

    /// Dimensions to apply, or `None` if the consumer is gone
    pub fn applicable(self) -> Option<Dimensions> {
        match self {
            Resolution::Ready(dimensions) => Some(dimensions),
            Resolution::Discarded(_) => None,
        }
    }
}

struct ResolverInner {
    cache: DimensionCache,
    assets: Arc<dyn AssetMetadata>,
    remote: Arc<dyn RemoteProbe>,
    in_flight: Mutex<HashMap<String, Shared<PendingFuture>>>,
}

impl ResolverInner {
    fn in_flight(&self) -> MutexGuard<'_, HashMap<String, Shared<PendingFuture>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolves image dimensions through a shared cache
///
/// Cloning is cheap and clones share both the cache and the set of in-flight
/// probes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lightbox_cache::{DimensionCache, Dimensions};
/// use lightbox_resolver::{AssetRegistry, DimensionResolver, ImageIdentifier};
///
/// let assets = Arc::new(AssetRegistry::new());
/// let handle = assets.register_dimensions(Dimensions::new(300, 200));
///
/// let cache = DimensionCache::default();
/// let resolver = DimensionResolver::builder()
///     .cache(cache.clone())
///     .assets(assets)
///     .build();
///
/// let dims = pollster::block_on(resolver.resolve(&ImageIdentifier::local(handle)));
/// assert_eq!(dims, Dimensions::new(300, 200));
/// assert!(cache.contains("1"));
/// ```
#[derive(Clone)]
pub struct DimensionResolver {
    inner: Arc<ResolverInner>,
}

impl DimensionResolver {
    /// Resolver over `cache` using the platform's default probes
    pub fn new(cache: DimensionCache) -> Self {
        Self::builder().cache(cache).build()
    }

    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    pub fn cache(&self) -> &DimensionCache {
        &self.inner.cache
    }

    /// Number of remote probes currently outstanding
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight().len()
    }

    /// Resolve the dimensions of `identifier`
    ///
    /// Never fails: anything that prevents determining the size yields
    /// [`Dimensions::UNKNOWN`]. A cache hit returns without suspending.
    #[tracing::instrument(skip_all, fields(key = %identifier.cache_key()))]
    pub async fn resolve(&self, identifier: &ImageIdentifier) -> Dimensions {
        let key = identifier.cache_key();

        if let Some(dimensions) = self.inner.cache.get(&key) {
            tracing::debug!(%dimensions, "resolved from cache");
            return dimensions;
        }

        match identifier {
            ImageIdentifier::LocalAsset { handle } => self.resolve_local(key, *handle),
            ImageIdentifier::RemoteSource { uri, .. } if uri.is_empty() => {
                tracing::debug!("empty uri; nothing to probe");
                Dimensions::UNKNOWN
            }
            ImageIdentifier::RemoteSource { uri, headers } => self
                .pending(key, uri, headers.as_ref())
                .await
                .unwrap_or(Dimensions::UNKNOWN),
        }
    }

    /// Resolve on behalf of a consumer that may be torn down meanwhile
    ///
    /// The cache is populated regardless of `token`; the token only decides
    /// whether the result is reported as [`Resolution::Ready`].
    pub async fn resolve_with(
        &self,
        identifier: &ImageIdentifier,
        token: &CancellationToken,
    ) -> Resolution {
        let dimensions = self.resolve(identifier).await;

        if token.is_cancelled() {
            tracing::debug!(key = %identifier.cache_key(), "consumer gone; discarding result");
            Resolution::Discarded(dimensions)
        } else {
            Resolution::Ready(dimensions)
        }
    }

    fn resolve_local(&self, key: String, handle: AssetHandle) -> Dimensions {
        match accept(&key, self.inner.assets.asset_dimensions(handle)) {
            Some(dimensions) => {
                self.inner.cache.set(key, dimensions);
                dimensions
            }
            None => Dimensions::UNKNOWN,
        }
    }

    /// Join the outstanding probe for `key`, starting one if there is none
    fn pending(&self, key: String, uri: &str, headers: Option<&Headers>) -> Shared<PendingFuture> {
        let mut in_flight = self.inner.in_flight();

        if let Some(existing) = in_flight.get(&key) {
            tracing::debug!("joining in-flight probe");
            return existing.clone();
        }

        tracing::debug!(platform = ?Platform::current(), "probing remote source");
        let probe = self.inner.remote.probe(uri, headers);
        let cache = self.inner.cache.clone();
        let owner: Weak<ResolverInner> = Arc::downgrade(&self.inner);
        let task_key = key.clone();

        let (done, result) = oneshot::channel();

        let job = async move {
            let outcome = accept(&task_key, probe.await);
            // Cache before any waiter sees the value
            if let Some(dimensions) = outcome {
                cache.set(task_key.clone(), dimensions);
            }
            if let Some(inner) = owner.upgrade() {
                inner.in_flight().remove(&task_key);
            }
            let _ = done.send(outcome);
        }
        .instrument(tracing::Span::current());

        if let Err(err) = detach(job) {
            tracing::warn!(error = %err, "failed to start probe task");
            return boxed_pending(future::ready(None)).shared();
        }

        let task = boxed_pending(result.map(|outcome| outcome.ok().flatten())).shared();

        in_flight.insert(key, task.clone());
        task
    }
}

impl fmt::Debug for DimensionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DimensionResolver")
            .field("cache", &self.inner.cache.stats())
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

/// Keep only results worth caching, logging the rest
fn accept(key: &str, result: Result<Dimensions, ProbeError>) -> Option<Dimensions> {
    match result {
        Ok(dimensions) if dimensions.is_unknown() => {
            tracing::warn!(key, %dimensions, "probe reported an empty image");
            None
        }
        Ok(dimensions) => Some(dimensions),
        Err(err) => {
            tracing::warn!(key, error = %err, "could not determine image dimensions");
            None
        }
    }
}

/// Wires a [`DimensionResolver`] to its collaborators
#[derive(Default)]
pub struct ResolverBuilder {
    cache: Option<DimensionCache>,
    assets: Option<Arc<dyn AssetMetadata>>,
    remote: Option<Arc<dyn RemoteProbe>>,
}

impl ResolverBuilder {
    /// Cache to consult and populate (default: a fresh 50-entry cache)
    pub fn cache(mut self, cache: DimensionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Asset metadata source (default: an empty [`AssetRegistry`])
    pub fn assets<A: AssetMetadata + 'static>(mut self, assets: Arc<A>) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Remote probe (default: [`default_remote_probe`])
    pub fn remote<R: RemoteProbe + 'static>(mut self, remote: Arc<R>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn build(self) -> DimensionResolver {
        let assets: Arc<dyn AssetMetadata> = match self.assets {
            Some(assets) => assets,
            None => Arc::new(AssetRegistry::new()),
        };

        DimensionResolver {
            inner: Arc::new(ResolverInner {
                cache: self.cache.unwrap_or_default(),
                assets,
                remote: self.remote.unwrap_or_else(default_remote_probe),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{boxed_probe, ProbeFuture};
    use futures::channel::oneshot;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// Probe that answers from a script and counts calls per URI
    #[derive(Default)]
    struct ScriptedProbe {
        calls: Mutex<HashMap<String, usize>>,
        answers: Mutex<VecDeque<Result<Dimensions, String>>>,
    }

    impl ScriptedProbe {
        fn answering(answers: Vec<Result<Dimensions, String>>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(HashMap::new()),
                answers: Mutex::new(answers.into()),
            })
        }

        fn calls(&self, uri: &str) -> usize {
            self.calls.lock().unwrap().get(uri).copied().unwrap_or(0)
        }
    }

    impl RemoteProbe for ScriptedProbe {
        fn probe(&self, uri: &str, _headers: Option<&Headers>) -> ProbeFuture {
            *self.calls.lock().unwrap().entry(uri.to_string()).or_default() += 1;
            let answer = self
                .answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("script exhausted".to_string()));
            boxed_probe(async move { answer.map_err(ProbeError::Transport) })
        }
    }

    /// Probe whose answers are released by the test
    #[derive(Default)]
    struct GatedProbe {
        calls: AtomicUsize,
        gates: Mutex<Vec<oneshot::Sender<Result<Dimensions, ProbeError>>>>,
    }

    impl GatedProbe {
        fn release(&self, dimensions: Dimensions) {
            for gate in self.gates.lock().unwrap().drain(..) {
                let _ = gate.send(Ok(dimensions));
            }
        }
    }

    impl RemoteProbe for GatedProbe {
        fn probe(&self, _uri: &str, _headers: Option<&Headers>) -> ProbeFuture {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (sender, receiver) = oneshot::channel();
            self.gates.lock().unwrap().push(sender);
            boxed_probe(async move { receiver.await.unwrap_or(Err(ProbeError::Dropped)) })
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn resolver_with(cache: DimensionCache, probe: Arc<impl RemoteProbe + 'static>) -> DimensionResolver {
        DimensionResolver::builder().cache(cache).remote(probe).build()
    }

    #[test]
    fn test_cached_key_never_probes_again() {
        let probe = ScriptedProbe::answering(vec![Ok(Dimensions::new(800, 600))]);
        let resolver = resolver_with(DimensionCache::new(4), probe.clone());
        let image = ImageIdentifier::remote("http://x/img.png");

        assert_eq!(pollster::block_on(resolver.resolve(&image)), Dimensions::new(800, 600));
        assert_eq!(pollster::block_on(resolver.resolve(&image)), Dimensions::new(800, 600));
        assert_eq!(pollster::block_on(resolver.resolve(&image)), Dimensions::new(800, 600));

        assert_eq!(probe.calls("http://x/img.png"), 1);
        assert_eq!(resolver.in_flight(), 0);
    }

    #[test]
    fn test_preloaded_cache_short_circuits_probe() {
        let cache = DimensionCache::new(4);
        cache.set("http://x/img.png", Dimensions::new(5, 5));
        let probe = ScriptedProbe::answering(vec![]);
        let resolver = resolver_with(cache, probe.clone());

        let dims = pollster::block_on(resolver.resolve(&ImageIdentifier::remote("http://x/img.png")));

        assert_eq!(dims, Dimensions::new(5, 5));
        assert_eq!(probe.calls("http://x/img.png"), 0);
    }

    #[test]
    fn test_failed_probe_is_not_cached_and_retries() {
        let probe = ScriptedProbe::answering(vec![
            Err("offline".to_string()),
            Err("offline".to_string()),
            Ok(Dimensions::new(10, 20)),
        ]);
        let cache = DimensionCache::new(4);
        let resolver = resolver_with(cache.clone(), probe.clone());
        let image = ImageIdentifier::remote("http://x/flaky.png");

        assert_eq!(pollster::block_on(resolver.resolve(&image)), Dimensions::UNKNOWN);
        assert!(!cache.contains("http://x/flaky.png"));
        assert_eq!(pollster::block_on(resolver.resolve(&image)), Dimensions::UNKNOWN);
        assert_eq!(pollster::block_on(resolver.resolve(&image)), Dimensions::new(10, 20));

        assert_eq!(probe.calls("http://x/flaky.png"), 3);
        assert!(cache.contains("http://x/flaky.png"));
    }

    #[test]
    fn test_empty_probe_result_is_not_cached() {
        let probe = ScriptedProbe::answering(vec![Ok(Dimensions::new(0, 40))]);
        let cache = DimensionCache::new(4);
        let resolver = resolver_with(cache.clone(), probe);

        let dims = pollster::block_on(resolver.resolve(&ImageIdentifier::remote("http://x/e.png")));

        assert_eq!(dims, Dimensions::UNKNOWN);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_empty_uri_resolves_unknown_without_probing() {
        let probe = ScriptedProbe::answering(vec![Ok(Dimensions::new(1, 1))]);
        let resolver = resolver_with(DimensionCache::new(4), probe.clone());

        let dims = pollster::block_on(resolver.resolve(&ImageIdentifier::remote("")));

        assert_eq!(dims, Dimensions::UNKNOWN);
        assert_eq!(probe.calls(""), 0);
    }

    #[test]
    fn test_headers_share_the_uri_cache_entry() {
        let probe = ScriptedProbe::answering(vec![Ok(Dimensions::new(3, 3))]);
        let resolver = resolver_with(DimensionCache::new(4), probe.clone());

        let mut headers = Headers::new();
        headers.insert("Cookie".into(), "session=1".into());
        let _ = pollster::block_on(resolver.resolve(&ImageIdentifier::remote("http://x/h.png")));
        let dims = pollster::block_on(
            resolver.resolve(&ImageIdentifier::remote_with_headers("http://x/h.png", headers)),
        );

        assert_eq!(dims, Dimensions::new(3, 3));
        assert_eq!(probe.calls("http://x/h.png"), 1);
    }

    #[test]
    fn test_local_assets_are_cached_by_handle() {
        let assets = Arc::new(AssetRegistry::new());
        let handle = assets.register_dimensions(Dimensions::new(48, 48));
        let cache = DimensionCache::new(4);
        let resolver = DimensionResolver::builder()
            .cache(cache.clone())
            .assets(assets)
            .remote(ScriptedProbe::answering(vec![]))
            .build();

        let dims = pollster::block_on(resolver.resolve(&ImageIdentifier::local(handle)));

        assert_eq!(dims, Dimensions::new(48, 48));
        assert_eq!(cache.peek(&handle.to_string()), Some(Dimensions::new(48, 48)));
    }

    #[test]
    fn test_unknown_asset_resolves_unknown() {
        let cache = DimensionCache::new(4);
        let resolver = DimensionResolver::builder().cache(cache.clone()).build();

        let dims = pollster::block_on(resolver.resolve(&ImageIdentifier::local(AssetHandle(77))));

        assert_eq!(dims, Dimensions::UNKNOWN);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_resolves_share_one_probe() {
        let probe = Arc::new(GatedProbe::default());
        let cache = DimensionCache::new(4);
        let resolver = resolver_with(cache.clone(), probe.clone());
        let image = ImageIdentifier::remote("http://x/shared.png");

        let (a, b, c, ()) = pollster::block_on(async {
            futures::join!(
                resolver.resolve(&image),
                resolver.resolve(&image),
                resolver.resolve(&image),
                async {
                    assert_eq!(resolver.in_flight(), 1);
                    probe.release(Dimensions::new(1024, 768));
                }
            )
        });

        let expected = Dimensions::new(1024, 768);
        assert_eq!((a, b, c), (expected, expected, expected));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.in_flight(), 0);
        assert_eq!(cache.peek("http://x/shared.png"), Some(expected));
    }

    #[test]
    fn test_cancelled_consumer_discards_but_cache_is_populated() {
        let probe = Arc::new(GatedProbe::default());
        let cache = DimensionCache::new(4);
        let resolver = resolver_with(cache.clone(), probe.clone());
        let image = ImageIdentifier::remote("http://x/late.png");
        let token = CancellationToken::new();

        let (resolution, ()) = pollster::block_on(async {
            futures::join!(resolver.resolve_with(&image, &token), async {
                token.cancel();
                probe.release(Dimensions::new(20, 10));
            })
        });

        assert_eq!(resolution, Resolution::Discarded(Dimensions::new(20, 10)));
        assert_eq!(resolution.applicable(), None);
        assert_eq!(cache.peek("http://x/late.png"), Some(Dimensions::new(20, 10)));
    }

    #[test]
    fn test_dropped_caller_still_populates_cache() {
        let probe = Arc::new(GatedProbe::default());
        let cache = DimensionCache::new(4);
        let resolver = resolver_with(cache.clone(), probe.clone());
        let image = ImageIdentifier::remote("http://x/u.png");

        let mut waiting = Box::pin(resolver.resolve(&image));
        assert_eq!(waiting.as_mut().now_or_never(), None);
        assert_eq!(resolver.in_flight(), 1);
        drop(waiting);

        probe.release(Dimensions::new(9, 9));
        wait_until(|| resolver.in_flight() == 0);

        assert_eq!(cache.peek("http://x/u.png"), Some(Dimensions::new(9, 9)));
        assert_eq!(pollster::block_on(resolver.resolve(&image)), Dimensions::new(9, 9));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_live_consumer_receives_ready() {
        let probe = ScriptedProbe::answering(vec![Ok(Dimensions::new(2, 1))]);
        let resolver = resolver_with(DimensionCache::new(4), probe);
        let token = CancellationToken::new();

        let resolution = pollster::block_on(
            resolver.resolve_with(&ImageIdentifier::remote("http://x/r.png"), &token),
        );

        assert_eq!(resolution.applicable(), Some(Dimensions::new(2, 1)));
    }

    #[test]
    fn test_eviction_forces_a_fresh_probe() {
        let probe = ScriptedProbe::answering(vec![
            Ok(Dimensions::new(1, 1)),
            Ok(Dimensions::new(2, 2)),
            Ok(Dimensions::new(1, 1)),
        ]);
        let cache = DimensionCache::new(1);
        let resolver = resolver_with(cache.clone(), probe.clone());
        let a = ImageIdentifier::remote("http://x/a.png");
        let b = ImageIdentifier::remote("http://x/b.png");

        pollster::block_on(resolver.resolve(&a));
        assert_eq!(cache.keys_mru(), vec!["http://x/a.png".to_string()]);

        pollster::block_on(resolver.resolve(&b));
        assert_eq!(cache.keys_mru(), vec!["http://x/b.png".to_string()]);

        pollster::block_on(resolver.resolve(&a));
        assert_eq!(probe.calls("http://x/a.png"), 2);
    }
}
