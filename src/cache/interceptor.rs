//! The transfer cache interceptor.
//!
//! One instance is built per render pass and installed in that pass's
//! [`Pipeline`](crate::middleware::Pipeline). Its behaviour depends on the
//! [`Platform`] it runs on:
//!
//! | Gate     | Server                                       | Client                                     |
//! |----------|----------------------------------------------|--------------------------------------------|
//! | Active   | record the request, forward, store outcome   | claim the server's record, replay outcome  |
//! | Inactive | forward, then clear leftover bookkeeping     | forward, then clear leftover bookkeeping   |
//!
//! Client-side consistency failures are returned as errors rather than
//! silently falling back to the network, so hydration mismatches surface.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, warn};

use super::{
    ActivationGate, CacheError, CachedEntry, DeactivationReason, KeyGenerator, ServerStateRecord,
    StabilitySignal,
    ledger::Ledger,
    store::TransferStore,
};
use crate::{
    config::TransferCacheConfig,
    http::{HttpError, Request, Response},
    middleware::{Interceptor, Next},
    transport::ResponseFuture,
};

/// Which side of the handoff an interceptor runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Performs the real requests and records them.
    Server,
    /// Replays what the server recorded during hydration.
    Client,
}

/// Request interceptor that hands responses from the server pass to the
/// client pass through a [`TransferStore`].
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use rttp_handoff::cache::{MemoryStore, Platform, TransferCacheInterceptor};
/// use rttp_handoff::config::TransferCacheConfig;
/// use rttp_handoff::http::{HttpError, Request, Response, StatusCode};
/// use rttp_handoff::middleware::Pipeline;
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let transport = |req: Request| async move {
///     Ok::<_, HttpError>(Response::new(StatusCode::OK).with_body(json!({"a": 1})).with_url(req.url()))
/// };
///
/// // Server pass.
/// let server_store = Arc::new(MemoryStore::new());
/// let server = Arc::new(TransferCacheInterceptor::new(
///     Platform::Server,
///     server_store.clone(),
///     TransferCacheConfig::default(),
/// ));
/// Pipeline::new(transport).with(server).send(Request::get("https://api.example.com/x")).await.unwrap();
/// let blob = server_store.export().unwrap();
///
/// // Client pass: the response is replayed, the transport is never called.
/// let client = Arc::new(TransferCacheInterceptor::new(
///     Platform::Client,
///     Arc::new(MemoryStore::import(&blob).unwrap()),
///     TransferCacheConfig::default(),
/// ));
/// let offline = |_req: Request| async { Err::<Response, _>(HttpError::network("offline")) };
/// let response = Pipeline::new(offline)
///     .with(client)
///     .send(Request::get("https://api.example.com/x"))
///     .await
///     .unwrap();
/// assert_eq!(response.body(), &json!({"a": 1}));
/// # }
/// ```
pub struct TransferCacheInterceptor {
    platform: Platform,
    config: TransferCacheConfig,
    keys: KeyGenerator,
    store: Arc<dyn TransferStore>,
    ledger: Arc<Ledger>,
    gate: Arc<ActivationGate>,
    occurrences: AtomicU64,
    errors: Option<UnboundedSender<CacheError>>,
}

impl TransferCacheInterceptor {
    /// Creates an interceptor for one render pass.
    ///
    /// With `production_mode` off the gate is closed before the first request.
    pub fn new(
        platform: Platform,
        store: Arc<dyn TransferStore>,
        config: TransferCacheConfig,
    ) -> Self {
        Self {
            platform,
            keys: KeyGenerator::new(&config),
            ledger: Arc::new(Ledger::new(store.clone())),
            gate: Arc::new(ActivationGate::from_config(&config)),
            store,
            config,
            occurrences: AtomicU64::new(0),
            errors: None,
        }
    }

    /// Closes the gate once `signal` reports the application stable.
    #[must_use]
    pub fn with_stability(self, signal: StabilitySignal) -> Self {
        self.gate.watch(signal);
        self
    }

    /// Sends cleanup failures to `channel` in addition to logging them.
    #[must_use]
    pub fn with_error_channel(mut self, channel: UnboundedSender<CacheError>) -> Self {
        self.errors = Some(channel);
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn gate(&self) -> &ActivationGate {
        &self.gate
    }

    /// Number of requests intercepted so far, active or not.
    pub fn occurrences(&self) -> u64 {
        self.occurrences.load(Ordering::SeqCst)
    }

    /// Ends the render pass: closes the gate and removes every bookkeeping
    /// key and recorded entry from the store. Safe to call more than once.
    ///
    /// Returns how many recorded entries were referenced by the table.
    pub fn dispose(&self) -> Result<usize, CacheError> {
        self.gate.deactivate(DeactivationReason::Disposed);
        Ok(self.ledger.clear()?)
    }

    fn pass_through(&self, request: Request, next: Next) -> ResponseFuture {
        let ledger = self.ledger.clone();
        let errors = self.errors.clone();

        Box::pin(async move {
            let outcome = next.run(request).await;
            if ledger.is_populated() {
                match ledger.clear() {
                    Ok(removed) => debug!(removed, "cleared transfer state"),
                    Err(e) => report(&errors, e.into()),
                }
            }
            outcome
        })
    }

    /// Works out which ledger record an active interception stands for.
    fn resolve_record(&self, request: &Request, id: u64) -> Result<ServerStateRecord, CacheError> {
        let fingerprint = self.keys.fingerprint(request)?;
        match self.platform {
            Platform::Server => {
                self.ledger
                    .append(&fingerprint, id, self.config.duplicate_requests)?;
                Ok(ServerStateRecord {
                    id,
                    req_key: fingerprint,
                })
            }
            Platform::Client => self.ledger.claim(&fingerprint),
        }
    }

    fn record(&self, slot: ServerStateRecord, request: Request, next: Next) -> ResponseFuture {
        let ledger = self.ledger.clone();
        let errors = self.errors.clone();

        Box::pin(async move {
            let outcome = next.run(request).await;

            let entry = match &outcome {
                Ok(response) => Some(CachedEntry::from_response(response)),
                Err(HttpError::Status(upstream)) => Some(CachedEntry::from_error(upstream)),
                // No status to replay.
                Err(_) => None,
            };

            if let Some(entry) = entry {
                match ledger.commit(&slot, &entry) {
                    Ok(true) => debug!(id = slot.id, status = entry.status, "recorded response"),
                    Ok(false) => debug!(id = slot.id, "transfer state cleared in flight; response not recorded"),
                    Err(e) => report(&errors, e.into()),
                }
            }

            outcome
        })
    }
}

impl Interceptor for TransferCacheInterceptor {
    fn handle(&self, request: Request, next: Next) -> ResponseFuture {
        // Assigned before anything else so ids follow issue order.
        let id = self.occurrences.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.gate.is_active() {
            return self.pass_through(request, next);
        }

        let slot = match self.resolve_record(&request, id) {
            Ok(slot) => slot,
            Err(e) => {
                warn!(error = %e, url = %request.url(), "transfer cache rejected request");
                return fail(e);
            }
        };
        let key = KeyGenerator::entry_key(&slot.req_key, slot.id);

        let cached = match self.store.get_as::<CachedEntry>(&key) {
            Ok(cached) => cached,
            Err(e) => {
                // The record is already claimed; drop the unreadable entry with it.
                if self.platform == Platform::Client {
                    if let Err(removal) = self.store.remove(&key) {
                        report(&self.errors, removal.into());
                    }
                }
                return fail(e.into());
            }
        };

        match (cached, self.platform) {
            (Some(entry), platform) => {
                debug!(key = %key, status = entry.status, "replaying cached response");
                if platform == Platform::Client {
                    if let Err(e) = self.store.remove(&key) {
                        report(&self.errors, e.into());
                    }
                }
                Box::pin(async move { entry.replay() })
            }
            (None, Platform::Client) => {
                let e = CacheError::EntryMissingAfterLookup { key };
                warn!(error = %e, url = %request.url(), "transfer cache rejected request");
                fail(e)
            }
            (None, Platform::Server) => self.record(slot, request, next),
        }
    }
}

fn fail(error: CacheError) -> ResponseFuture {
    let outcome: Result<Response, HttpError> = Err(error.into());
    Box::pin(std::future::ready(outcome))
}

fn report(errors: &Option<UnboundedSender<CacheError>>, error: CacheError) {
    error!(error = %error, "transfer cache store operation failed");
    if let Some(channel) = errors {
        // A closed channel means the host stopped listening.
        let _ = channel.send(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::{
            MemoryStore, StoreError, stability_channel,
            ledger::{LAST_ID_KEY, SERVER_STATE_DATA_KEY},
        },
        config::DuplicatePolicy,
        http::{ErrorResponse, Response, StatusCode},
        middleware::Pipeline,
        transport::Transport,
    };
    use serde_json::{Value, json};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::{Notify, mpsc};

    /// Answers by path and counts every call.
    fn api(calls: Arc<AtomicUsize>) -> impl Transport {
        move |req: Request| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                let url = req.url().to_owned();
                if url.ends_with("/missing") {
                    Err(HttpError::Status(
                        ErrorResponse::new(StatusCode::NOT_FOUND)
                            .with_error(json!({"message": "no such thing"}))
                            .with_url(url),
                    ))
                } else if url.ends_with("/down") {
                    Err(HttpError::network("connection refused"))
                } else if url.ends_with("/counter") {
                    Ok(Response::new(StatusCode::OK)
                        .with_body(json!({"call": n}))
                        .with_url(url))
                } else {
                    Ok(Response::new(StatusCode::OK)
                        .with_header("X-Trace", "one")
                        .with_header("X-Trace", "two")
                        .with_body(json!({"a": 1}))
                        .with_url(url))
                }
            }
        }
    }

    struct Pass {
        store: Arc<MemoryStore>,
        interceptor: Arc<TransferCacheInterceptor>,
        pipeline: Pipeline,
        calls: Arc<AtomicUsize>,
    }

    impl Pass {
        fn new(platform: Platform, store: Arc<MemoryStore>, config: TransferCacheConfig) -> Self {
            Self::from_interceptor(
                store.clone(),
                TransferCacheInterceptor::new(platform, store, config),
            )
        }

        fn from_interceptor(store: Arc<MemoryStore>, interceptor: TransferCacheInterceptor) -> Self {
            let calls = Arc::new(AtomicUsize::new(0));
            let interceptor = Arc::new(interceptor);
            let pipeline = Pipeline::new(api(calls.clone())).with(interceptor.clone());
            Self {
                store,
                interceptor,
                pipeline,
                calls,
            }
        }

        fn server() -> Self {
            Self::new(Platform::Server, Arc::new(MemoryStore::new()), TransferCacheConfig::default())
        }

        /// Client pass hydrating from whatever this pass recorded.
        fn handoff(&self, config: TransferCacheConfig) -> Self {
            let blob = self.store.export().unwrap();
            Self::new(Platform::Client, Arc::new(MemoryStore::import(&blob).unwrap()), config)
        }

        async fn get(&self, url: &str) -> Result<Response, HttpError> {
            self.pipeline.send(Request::get(url)).await
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    const X: &str = "https://api.example.com/x";

    #[tokio::test]
    async fn server_records_then_cleans_up_once_inactive() {
        let (notifier, signal) = stability_channel();
        let store = Arc::new(MemoryStore::new());
        let server = Pass::from_interceptor(
            store.clone(),
            TransferCacheInterceptor::new(Platform::Server, store, TransferCacheConfig::default())
                .with_stability(signal),
        );

        let response = server.get(X).await.unwrap();
        assert_eq!(response.body(), &json!({"a": 1}));

        let fingerprint = KeyGenerator::default().fingerprint(&Request::get(X)).unwrap();
        let key = KeyGenerator::entry_key(&fingerprint, 1);
        assert_eq!(server.store.len(), 3);
        assert_eq!(server.store.get(LAST_ID_KEY).unwrap(), Some(json!(1)));
        assert_eq!(
            server.store.get(SERVER_STATE_DATA_KEY).unwrap(),
            Some(json!([{"id": 1, "reqKey": fingerprint}]))
        );
        let entry: CachedEntry =
            serde_json::from_value(server.store.get(&key).unwrap().unwrap()).unwrap();
        assert_eq!(entry.status, 200);
        assert_eq!(entry.body, Some(json!({"a": 1})));

        notifier.mark_stable();
        server.get("https://api.example.com/later").await.unwrap();

        assert!(server.store.is_empty());
        assert_eq!(server.calls(), 2);
        assert_eq!(server.interceptor.occurrences(), 2);
    }

    #[tokio::test]
    async fn client_replays_without_transport() {
        let server = Pass::server();
        server.get(X).await.unwrap();

        let client = server.handoff(TransferCacheConfig::default());
        let response = client.get(X).await.unwrap();

        assert_eq!(client.calls(), 0);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), &json!({"a": 1}));
        assert_eq!(response.url(), X);
        let trace: Vec<_> = response.headers().get_all("x-trace").collect();
        assert_eq!(trace, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn client_replays_hand_built_state() {
        let fingerprint = KeyGenerator::default().fingerprint(&Request::get(X)).unwrap();
        let store = Arc::new(MemoryStore::new());
        let dyn_store: &dyn TransferStore = store.as_ref();
        dyn_store
            .set_as(
                SERVER_STATE_DATA_KEY,
                &vec![ServerStateRecord {
                    id: 1,
                    req_key: fingerprint.clone(),
                }],
            )
            .unwrap();
        dyn_store.set_as(LAST_ID_KEY, &1u64).unwrap();
        store
            .set(
                &KeyGenerator::entry_key(&fingerprint, 1),
                json!({"body": {"a": 1}, "headers": {}, "status": 200, "statusText": "OK", "url": X}),
            )
            .unwrap();

        let client = Pass::new(Platform::Client, store, TransferCacheConfig::default());
        let response = client.get(X).await.unwrap();
        assert_eq!(response.body(), &json!({"a": 1}));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn client_consumes_entry_once() {
        let server = Pass::server();
        server.get(X).await.unwrap();

        let client = server.handoff(TransferCacheConfig::default());
        client.get(X).await.unwrap();
        let key = KeyGenerator::new(&TransferCacheConfig::default())
            .compute_key(&Request::get(X), 1)
            .unwrap();
        assert!(!client.store.has_key(&key));

        let again = client.get(X).await.unwrap_err();
        assert!(matches!(
            again,
            HttpError::Cache(CacheError::RequestMissingInServerState { .. })
        ));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn client_unknown_request_fails() {
        let server = Pass::server();
        server.get(X).await.unwrap();

        let client = server.handoff(TransferCacheConfig::default());
        let err = client.get("https://api.example.com/never-seen").await.unwrap_err();
        assert!(matches!(
            err,
            HttpError::Cache(CacheError::RequestMissingInServerState { .. })
        ));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn client_without_any_server_state_fails() {
        let client = Pass::new(
            Platform::Client,
            Arc::new(MemoryStore::new()),
            TransferCacheConfig::default(),
        );
        assert!(matches!(
            client.get(X).await,
            Err(HttpError::Cache(CacheError::RequestMissingInServerState { .. }))
        ));
    }

    #[tokio::test]
    async fn client_rejects_id_beyond_last_id() {
        let server = Pass::server();
        server.get(X).await.unwrap();
        server.store.set(LAST_ID_KEY, json!(0)).unwrap();

        let client = server.handoff(TransferCacheConfig::default());
        assert!(matches!(
            client.get(X).await,
            Err(HttpError::Cache(CacheError::WrongIdForServerState {
                id: 1,
                last_id: Some(0)
            }))
        ));
    }

    #[tokio::test]
    async fn client_missing_payload_is_an_error() {
        let server = Pass::server();
        server.get(X).await.unwrap();
        let key = KeyGenerator::default().compute_key(&Request::get(X), 1).unwrap();
        server.store.remove(&key).unwrap();

        let client = server.handoff(TransferCacheConfig::default());
        let err = client.get(X).await.unwrap_err();
        assert!(matches!(
            err,
            HttpError::Cache(CacheError::EntryMissingAfterLookup { key: missing }) if missing == key
        ));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn client_drops_unreadable_entry() {
        let server = Pass::server();
        server.get(X).await.unwrap();
        let key = KeyGenerator::default().compute_key(&Request::get(X), 1).unwrap();
        server.store.set(&key, json!("not an entry")).unwrap();

        let client = server.handoff(TransferCacheConfig::default());
        let err = client.get(X).await.unwrap_err();
        assert!(matches!(
            err,
            HttpError::Cache(CacheError::Store(StoreError::Codec(_)))
        ));
        assert!(!client.store.has_key(&key));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn upstream_error_is_replayed_as_error() {
        let server = Pass::server();
        let live = server.get("https://api.example.com/missing").await.unwrap_err();

        let client = server.handoff(TransferCacheConfig::default());
        let replayed = client.get("https://api.example.com/missing").await.unwrap_err();

        match (live, replayed) {
            (HttpError::Status(live), HttpError::Status(replayed)) => {
                assert_eq!(replayed.status(), StatusCode::NOT_FOUND);
                assert_eq!(replayed, live);
            }
            other => panic!("expected status errors, got {other:?}"),
        }
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn network_failures_are_not_recorded() {
        let server = Pass::server();
        let err = server.get("https://api.example.com/down").await.unwrap_err();
        assert!(matches!(err, HttpError::Network { .. }));

        let key = KeyGenerator::default()
            .compute_key(&Request::get("https://api.example.com/down"), 1)
            .unwrap();
        assert!(!server.store.has_key(&key));
    }

    #[tokio::test]
    async fn repeated_requests_replay_in_order() {
        let server = Pass::server();
        let url = "https://api.example.com/counter";
        server.get(url).await.unwrap();
        server.get(X).await.unwrap();
        server.get(url).await.unwrap();

        let client = server.handoff(TransferCacheConfig::default());
        let first = client.get(url).await.unwrap();
        let second = client.get(url).await.unwrap();
        assert_eq!(first.body(), &json!({"call": 1}));
        assert_eq!(second.body(), &json!({"call": 3}));
        assert_eq!(client.get(X).await.unwrap().body(), &json!({"a": 1}));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn reject_policy_fails_repeats() {
        let config = TransferCacheConfig::new().duplicate_requests(DuplicatePolicy::Reject);
        let server = Pass::new(Platform::Server, Arc::new(MemoryStore::new()), config);
        server.get(X).await.unwrap();

        let err = server.get(X).await.unwrap_err();
        assert!(matches!(
            err,
            HttpError::Cache(CacheError::DuplicateRequestInPass { .. })
        ));
        assert_eq!(server.calls(), 1);
    }

    #[tokio::test]
    async fn development_mode_passes_through() {
        let config = TransferCacheConfig::new().production_mode(false);
        let server = Pass::new(Platform::Server, Arc::new(MemoryStore::new()), config.clone());
        server.get(X).await.unwrap();
        assert!(server.store.is_empty());

        let client = Pass::new(Platform::Client, Arc::new(MemoryStore::new()), config);
        client.get(X).await.unwrap();
        assert_eq!(client.calls(), 1);
        assert_eq!(client.interceptor.occurrences(), 1);
    }

    #[tokio::test]
    async fn client_stops_replaying_after_stable() {
        let server = Pass::server();
        server.get(X).await.unwrap();
        let blob = server.store.export().unwrap();

        let (notifier, signal) = stability_channel();
        let store = Arc::new(MemoryStore::import(&blob).unwrap());
        let client = Pass::from_interceptor(
            store.clone(),
            TransferCacheInterceptor::new(Platform::Client, store, TransferCacheConfig::default())
                .with_stability(signal),
        );

        notifier.mark_stable();
        client.get(X).await.unwrap();
        assert_eq!(client.calls(), 1);
        assert!(client.store.is_empty());
    }

    #[tokio::test]
    async fn override_header_is_required() {
        let config = TransferCacheConfig::new().override_host_header("X-Forwarded-Host");
        let server = Pass::new(Platform::Server, Arc::new(MemoryStore::new()), config);
        let err = server.get(X).await.unwrap_err();
        assert!(matches!(
            err,
            HttpError::Cache(CacheError::MissingKeyHeader { .. })
        ));
        assert_eq!(server.calls(), 0);
    }

    #[tokio::test]
    async fn override_header_lets_hosts_differ() {
        let config = TransferCacheConfig::new().override_host_header("X-Forwarded-Host");
        let server = Pass::new(Platform::Server, Arc::new(MemoryStore::new()), config.clone());
        server
            .pipeline
            .send(Request::get("http://10.0.0.7/y?x=1").header("X-Forwarded-Host", "internal.local"))
            .await
            .unwrap();

        let client = server.handoff(config);
        let response = client
            .pipeline
            .send(
                Request::get("http://public.example.com/y?x=1")
                    .header("X-Forwarded-Host", "internal.local"),
            )
            .await
            .unwrap();
        assert_eq!(response.url(), "http://10.0.0.7/y?x=1");
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn dispose_is_idempotent() {
        let server = Pass::server();
        server.get(X).await.unwrap();
        server.store.set("unrelated", Value::Bool(true)).unwrap();

        assert_eq!(server.interceptor.dispose().unwrap(), 1);
        assert_eq!(server.store.keys(), vec!["unrelated".to_string()]);
        assert_eq!(server.interceptor.dispose().unwrap(), 0);
        assert_eq!(
            server.interceptor.gate().reason(),
            Some(DeactivationReason::Disposed)
        );
    }

    #[tokio::test]
    async fn response_landing_after_cleanup_is_dropped() {
        let release = Arc::new(Notify::new());
        let held = release.clone();
        let transport = move |req: Request| {
            let held = held.clone();
            async move {
                if req.url().ends_with("/slow") {
                    held.notified().await;
                }
                Ok::<_, HttpError>(Response::new(StatusCode::OK).with_url(req.url()))
            }
        };

        let (notifier, signal) = stability_channel();
        let store = Arc::new(MemoryStore::new());
        let interceptor =
            TransferCacheInterceptor::new(Platform::Server, store.clone(), TransferCacheConfig::default())
                .with_stability(signal);
        let pipeline = Pipeline::new(transport).with(Arc::new(interceptor));

        let slow = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.send(Request::get("https://api.example.com/slow")).await }
        });
        while !store.has_key(SERVER_STATE_DATA_KEY) {
            tokio::task::yield_now().await;
        }

        notifier.mark_stable();
        pipeline.send(Request::get("https://api.example.com/fast")).await.unwrap();
        assert!(store.is_empty());

        release.notify_one();
        let response = slow.await.unwrap().unwrap();
        assert_eq!(response.url(), "https://api.example.com/slow");
        assert!(store.is_empty(), "left behind: {:?}", store.keys());
    }

    /// Store whose removals always fail.
    struct StickyStore(MemoryStore);

    impl TransferStore for StickyStore {
        fn has_key(&self, key: &str) -> bool {
            self.0.has_key(key)
        }
        fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
            self.0.set(key, value)
        }
        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend {
                message: "read-only".into(),
            })
        }
    }

    #[tokio::test]
    async fn cleanup_failures_are_reported_not_returned() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let store = Arc::new(StickyStore(MemoryStore::new()));
        let interceptor =
            TransferCacheInterceptor::new(Platform::Server, store, TransferCacheConfig::default())
                .with_error_channel(tx);
        let interceptor = Arc::new(interceptor);
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(api(calls.clone())).with(interceptor.clone());

        pipeline.send(Request::get(X)).await.unwrap();
        interceptor.gate().deactivate(DeactivationReason::Stable);

        let response = pipeline.send(Request::get(X)).await.unwrap();
        assert_eq!(response.body(), &json!({"a": 1}));

        let reported = rx.try_recv().unwrap();
        assert!(matches!(
            reported,
            CacheError::Store(StoreError::Backend { .. })
        ));
    }
}
