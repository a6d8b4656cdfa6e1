//! Simulates one server render followed by client hydration.
//!
//! Run with `RUST_LOG=debug cargo run --example handoff` to see the cache at work.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use rttp_handoff::{
    cache::{MemoryStore, Platform, TransferCacheInterceptor, stability_channel},
    config::TransferCacheConfig,
    http::{HttpError, Request, Response, StatusCode},
    middleware::{LoggingInterceptor, Pipeline},
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Stand-in for the real network; counts how often it is reached.
fn network(calls: Arc<AtomicUsize>) -> impl Fn(Request) -> std::future::Ready<Result<Response, HttpError>> {
    move |req: Request| {
        calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(Ok(Response::new(StatusCode::OK)
            .with_header("Content-Type", "application/json")
            .with_body(json!({ "items": ["alpha", "beta"] }))
            .with_url(req.url_with_params())))
    }
}

async fn render(pipeline: &Pipeline) -> Result<(), HttpError> {
    let items = pipeline
        .send(
            Request::get("https://api.example.com/items")
                .param("page", "1")
                .header("X-Forwarded-Host", "api.internal"),
        )
        .await?;
    tracing::info!(body = %items.body(), "rendered items");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = TransferCacheConfig::new().override_host_header("X-Forwarded-Host");

    // ── Server pass ───────────────────────────────────────────────────────────
    let server_calls = Arc::new(AtomicUsize::new(0));
    let server_store = Arc::new(MemoryStore::new());
    let (server_stable, server_signal) = stability_channel();
    let server = TransferCacheInterceptor::new(Platform::Server, server_store.clone(), config.clone())
        .with_stability(server_signal);
    let pipeline = Pipeline::new(network(server_calls.clone()))
        .with(Arc::new(LoggingInterceptor))
        .with(Arc::new(server));

    render(&pipeline).await?;
    server_stable.mark_stable();
    let blob = server_store.export()?;
    tracing::info!(bytes = blob.len(), "serialized transfer state into the document");

    // ── Client pass ───────────────────────────────────────────────────────────
    let client_calls = Arc::new(AtomicUsize::new(0));
    let client_store = Arc::new(MemoryStore::import(&blob)?);
    let (client_stable, client_signal) = stability_channel();
    let client = TransferCacheInterceptor::new(Platform::Client, client_store.clone(), config)
        .with_stability(client_signal);
    let pipeline = Pipeline::new(network(client_calls.clone()))
        .with(Arc::new(LoggingInterceptor))
        .with(Arc::new(client));

    render(&pipeline).await?;
    client_stable.mark_stable();

    // After hydration every request goes to the network again and the
    // handed-off state is cleared.
    render(&pipeline).await?;

    println!(
        "server network calls: {}, client network calls: {}, leftover state keys: {}",
        server_calls.load(Ordering::SeqCst),
        client_calls.load(Ordering::SeqCst),
        client_store.len()
    );
    Ok(())
}
