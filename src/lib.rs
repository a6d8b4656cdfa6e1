//! # rttp-handoff
//!
//! Hands HTTP responses fetched during server-side rendering over to the
//! client-side hydration pass, so the browser does not issue the same
//! requests a second time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rttp_handoff::cache::{MemoryStore, Platform, TransferCacheInterceptor, stability_channel};
//! use rttp_handoff::config::TransferCacheConfig;
//! use rttp_handoff::http::{HttpError, Request, Response, StatusCode};
//! use rttp_handoff::middleware::Pipeline;
//!
//! # async fn render() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let (notifier, signal) = stability_channel();
//! let cache = TransferCacheInterceptor::new(Platform::Server, store.clone(), TransferCacheConfig::default())
//!     .with_stability(signal);
//!
//! let pipeline = Pipeline::new(|req: Request| async move {
//!     Ok::<_, HttpError>(Response::new(StatusCode::OK).with_url(req.url()))
//! })
//! .with(Arc::new(cache));
//!
//! pipeline.send(Request::get("https://api.example.com/items")).await?;
//! notifier.mark_stable();
//!
//! // Embed this in the rendered document; the client imports it.
//! let blob = store.export()?;
//! # let _ = blob;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod http;
pub mod middleware;
pub mod transport;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{CacheError, MemoryStore, Platform, TransferCacheInterceptor, TransferStore};
pub use config::TransferCacheConfig;
pub use http::{Headers, HttpError, Method, Request, Response, StatusCode};
pub use middleware::Pipeline;
