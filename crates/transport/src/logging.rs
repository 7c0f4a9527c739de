use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::redact::{RedactedHeaders, redact_url};
use crate::{BoxFuture, HttpRequest, HttpResponse, Transport, TransportError};

/// Traces every request and response passing through `inner`.
///
/// URLs and headers are always logged in redacted form.
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Transport> Transport for LoggingTransport<T> {
    fn send<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            let url = redact_url(&request.url);
            debug!(
                method = %request.method,
                url = %url,
                bytes = request.body.len(),
                "sending request"
            );
            trace!(headers = %RedactedHeaders(&request.headers), "request headers");

            let started = Instant::now();
            let result = self.inner.send(request).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match &result {
                Ok(resp) => {
                    debug!(status = resp.status, elapsed_ms, url = %url, "received response");
                    if !resp.is_success() {
                        trace!(body = %resp.text(), "error response body");
                    }
                }
                Err(e) => {
                    warn!(error = %e, elapsed_ms, url = %url, "request failed");
                }
            }
            result
        })
    }
}
