//! The real network stack, seen from the interceptor chain.
//!
//! The transfer cache never performs I/O itself. Whatever actually talks to
//! the network is plugged in here as a [`Transport`], and the interceptor
//! chain falls through to it once every interceptor has run.

use std::{future::Future, pin::Pin};

use crate::http::{HttpError, Request, Response};

/// Boxed future returned by transports and interceptors.
pub type ResponseFuture = Pin<Box<dyn Future<Output = Result<Response, HttpError>> + Send>>;

/// Sends a request over the network and resolves to its outcome.
///
/// Error statuses are reported as [`HttpError::Status`]; failures with no
/// HTTP status at all (refused connection, cancellation) as
/// [`HttpError::Network`].
///
/// Any `Fn(Request) -> impl Future` closure is a transport:
///
/// ```rust
/// use rttp_handoff::http::{Request, Response, StatusCode};
/// use rttp_handoff::transport::Transport;
///
/// fn assert_transport<T: Transport>(_: &T) {}
///
/// let transport = |req: Request| async move {
///     Ok::<_, rttp_handoff::http::HttpError>(Response::new(StatusCode::OK).with_url(req.url()))
/// };
/// assert_transport(&transport);
/// ```
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> ResponseFuture;
}

impl<F, Fut> Transport for F
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, HttpError>> + Send + 'static,
{
    fn send(&self, request: Request) -> ResponseFuture {
        Box::pin(self(request))
    }
}
