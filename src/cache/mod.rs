//! Server-to-client response handoff cache.
//!
//! During isomorphic rendering the same view logic runs twice: once on the
//! server to produce HTML, then again in the browser to hydrate it. The
//! [`TransferCacheInterceptor`] sits in the outgoing-request pipeline of both
//! passes. On the server it records every response in a [`TransferStore`];
//! the store is serialized into the rendered document; on the client the same
//! interceptor replays those responses instead of hitting the network, until
//! the application reports that it is stable.
//!
//! ## Pieces
//!
//! - [`key`]: request fingerprints and per-occurrence store keys.
//! - [`entry`]: the stored shapes ([`CachedEntry`], [`ServerStateRecord`]).
//! - [`store`]: the [`TransferStore`] seam and an in-memory implementation.
//! - [`ledger`]: the bookkeeping table correlating fingerprints with ids.
//! - [`gate`]: the one-way active/inactive switch.
//! - [`interceptor`]: the per-request state machine.

use thiserror::Error;

pub mod entry;
pub mod gate;
pub mod interceptor;
pub mod key;
pub mod ledger;
pub mod store;

pub use entry::{CachedEntry, ServerStateRecord};
pub use gate::{
    ActivationGate, DeactivationReason, GateState, StabilityNotifier, StabilitySignal,
    stability_channel,
};
pub use interceptor::{Platform, TransferCacheInterceptor};
pub use key::KeyGenerator;
pub use store::{MemoryStore, StoreError, TransferStore};

/// Failures raised by the transfer cache itself.
///
/// These reach callers as [`HttpError::Cache`](crate::http::HttpError::Cache),
/// through the same channel as transport failures.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("missing header '{header}' value inside request to generate state key")]
    MissingKeyHeader { header: String },

    #[error("url '{url}' has no scheme separator")]
    MalformedUrl { url: String },

    #[error("request {fingerprint} missing in server state data")]
    RequestMissingInServerState { fingerprint: String },

    #[error("wrong id {id} for server state data (last id: {last_id:?})")]
    WrongIdForServerState { id: u64, last_id: Option<u64> },

    #[error("no cached entry under {key} although server state data references it")]
    EntryMissingAfterLookup { key: String },

    #[error("request {fingerprint} already stored in server state data")]
    DuplicateRequestInPass { fingerprint: String },

    #[error("failed to serialize request for fingerprinting: {0}")]
    Fingerprint(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
