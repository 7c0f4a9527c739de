//! HTTP transport for the release pipeline.
//!
//! Every outbound call goes through a [`Transport`]. The production stack
//! is composed as `retrying(logging(reqwest))`:
//!
//! - [`ReqwestTransport`] performs the call with explicit timeouts.
//! - [`LoggingTransport`] traces requests and responses with credentials
//!   redacted.
//! - [`RetryingTransport`] retries transport failures and 500/503/504
//!   responses with a fixed backoff.

mod client;
mod error;
mod logging;
pub mod redact;
mod request;
mod retry;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use client::{ReqwestTransport, TimeoutConfig};
pub use error::{FailureKind, TransportError};
pub use logging::LoggingTransport;
pub use request::{HttpRequest, HttpResponse, Method};
pub use retry::{RetryPolicy, RetryingTransport, is_retryable_status};

/// Boxed future returned by [`Transport::send`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The single "send request, get response" capability.
///
/// A non-2xx status is not an error at this level: it comes back as an
/// [`HttpResponse`] for the caller to classify. `Err` means no response was
/// obtained at all.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>> {
        (**self).send(request)
    }
}

/// The production transport stack.
pub type StandardTransport = RetryingTransport<LoggingTransport<ReqwestTransport>>;

/// Builds `retrying(logging(reqwest))` with the given knobs.
pub fn standard_stack(
    timeouts: TimeoutConfig,
    policy: RetryPolicy,
) -> Result<StandardTransport, TransportError> {
    let base = ReqwestTransport::new(timeouts)?;
    Ok(RetryingTransport::new(LoggingTransport::new(base), policy))
}
