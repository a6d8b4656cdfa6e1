//! Interceptor pipeline of composable handlers around outgoing requests.
//!
//! This module defines the core types for building an ordered interceptor
//! stack in front of a [`Transport`]. Each interceptor wraps the next layer
//! and may answer a request itself, such as on a cache hit.
//!
//! ## Core types
//!
//! - [`Interceptor`]: trait implemented by all interceptors.
//! - [`Next`]: cursor into the remaining chain; call [`Next::run`] to
//!   advance to the next layer, or to the transport once the chain is exhausted.
//! - [`InterceptorHandler`]: type-erased, cheaply-cloneable interceptor function.
//! - [`from_interceptor`]: converts an [`Interceptor`] into an [`InterceptorHandler`].
//! - [`Pipeline`]: the ordered handlers plus the transport they end in.
//! - [`LoggingInterceptor`]: built-in request/outcome logger.

use std::{future::Future, pin::Pin, sync::Arc};
use tokio::time::Instant;

use crate::{
    http::{HttpError, Request, Response},
    transport::{ResponseFuture, Transport},
};

/// A cursor into the remaining interceptor chain for a single request.
///
/// `Next` is consumed on each call to [`run`](Self::run), so an interceptor
/// can forward a request at most once.
///
/// # Examples
///
/// ```rust,no_run
/// use rttp_handoff::{http::Request, middleware::{Interceptor, Next}, transport::ResponseFuture};
///
/// struct PassThrough;
///
/// impl Interceptor for PassThrough {
///     fn handle(&self, request: Request, next: Next) -> ResponseFuture {
///         Box::pin(async move { next.run(request).await })
///     }
/// }
/// ```
pub struct Next {
    interceptors: Arc<[InterceptorHandler]>,
    transport: Arc<dyn Transport>,
    // Tracks which interceptor to invoke on the next `run` call.
    index: usize,
}

/// A type-erased, reference-counted interceptor function.
///
/// Construct one with [`from_interceptor`] or by wrapping a closure directly:
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use rttp_handoff::{http::Request, middleware::{InterceptorHandler, Next}, transport::ResponseFuture};
///
/// let handler: InterceptorHandler = Arc::new(|request: Request, next: Next| -> ResponseFuture {
///     Box::pin(async move { next.run(request).await })
/// });
/// ```
pub type InterceptorHandler = Arc<
    dyn Fn(Request, Next) -> Pin<Box<dyn Future<Output = Result<Response, HttpError>> + Send>>
        + Send
        + Sync
        + 'static,
>;

/// Converts an [`Interceptor`] implementation into an [`InterceptorHandler`].
pub fn from_interceptor<I>(interceptor: Arc<I>) -> InterceptorHandler
where
    I: Interceptor + 'static,
{
    Arc::new(move |request: Request, next: Next| interceptor.handle(request, next))
}

impl Next {
    fn new(interceptors: Arc<[InterceptorHandler]>, transport: Arc<dyn Transport>) -> Self {
        Self {
            interceptors,
            transport,
            index: 0,
        }
    }

    /// Invokes the next interceptor in the chain, or the transport once every
    /// interceptor has had its turn.
    pub async fn run(mut self, request: Request) -> Result<Response, HttpError> {
        if self.index < self.interceptors.len() {
            let handler = self.interceptors[self.index].clone();
            self.index += 1;
            handler(request, self).await
        } else {
            self.transport.send(request).await
        }
    }
}

/// The core trait for all interceptors.
///
/// Implementors receive the outgoing [`Request`] and a [`Next`] cursor. They may:
///
/// - **Pass through**: call `next.run(request).await` without modification.
/// - **Short-circuit**: return an outcome directly without calling `next`.
/// - **Record**: call `next.run(request).await`, inspect the outcome, and
///   return it unchanged.
///
/// # Contract
///
/// - Implementations **must** be `Send + Sync`; one instance serves every
///   request of a render pass.
/// - `handle` is called in the order requests are issued. Any bookkeeping that
///   depends on that order must happen synchronously inside `handle`, before
///   the returned future is first polled.
pub trait Interceptor: Send + Sync {
    fn handle(&self, request: Request, next: Next) -> ResponseFuture;
}

/// An ordered interceptor chain ending in a transport.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use rttp_handoff::http::{Request, Response, StatusCode};
/// use rttp_handoff::middleware::{LoggingInterceptor, Pipeline};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let pipeline = Pipeline::new(|req: Request| async move {
///     Ok::<_, rttp_handoff::http::HttpError>(Response::new(StatusCode::OK).with_url(req.url()))
/// })
/// .with(Arc::new(LoggingInterceptor));
///
/// let response = pipeline.send(Request::get("https://api.example.com/x")).await.unwrap();
/// assert_eq!(response.url(), "https://api.example.com/x");
/// # }
/// ```
#[derive(Clone)]
pub struct Pipeline {
    interceptors: Arc<[InterceptorHandler]>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    /// Creates a pipeline with no interceptors in front of `transport`.
    pub fn new<T>(transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            interceptors: Arc::from(Vec::new()),
            transport: Arc::new(transport),
        }
    }

    /// Appends an interceptor; interceptors run in the order they were added.
    #[must_use]
    pub fn with<I>(self, interceptor: Arc<I>) -> Self
    where
        I: Interceptor + 'static,
    {
        self.with_handler(from_interceptor(interceptor))
    }

    /// Appends an already type-erased handler.
    #[must_use]
    pub fn with_handler(self, handler: InterceptorHandler) -> Self {
        let mut interceptors = self.interceptors.to_vec();
        interceptors.push(handler);
        Self {
            interceptors: interceptors.into(),
            transport: self.transport,
        }
    }

    /// Runs `request` through the chain.
    pub async fn send(&self, request: Request) -> Result<Response, HttpError> {
        Next::new(self.interceptors.clone(), self.transport.clone())
            .run(request)
            .await
    }
}

/// Built-in interceptor that logs each request's method, URL, outcome, and duration.
///
/// Emits a single `tracing::info!` line after the downstream chain completes:
///
/// ```text
/// METHOD url - STATUS (duration)
/// ```
pub struct LoggingInterceptor;

impl Interceptor for LoggingInterceptor {
    fn handle(&self, request: Request, next: Next) -> ResponseFuture {
        Box::pin(async move {
            let start = Instant::now();
            let method = request.method().as_str().to_string();
            let url = request.url_with_params();

            let outcome = next.run(request).await;

            let duration = start.elapsed();
            match &outcome {
                Ok(response) => {
                    tracing::info!("{} {} - {} ({:?})", method, url, response.status(), duration)
                }
                Err(HttpError::Status(error)) => {
                    tracing::info!("{} {} - {} ({:?})", method, url, error.status(), duration)
                }
                Err(error) => {
                    tracing::warn!(error = %error, "{} {} - failed ({:?})", method, url, duration)
                }
            }

            outcome
        })
    }
}
