use std::time::Duration;

use tracing::info;

use crate::redact::redact_url;
use crate::{BoxFuture, HttpRequest, HttpResponse, Transport, TransportError};

/// Default retry budget.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// Server statuses treated as transient.
const RETRYABLE_STATUSES: [u16; 3] = [500, 503, 504];

/// Returns `true` if a response with `status` should be retried.
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Bounded retries with a fixed delay (no jitter, no growth).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }
}

/// Retries transport failures and 500/503/504 responses.
///
/// Any other non-2xx response is returned at once. When the budget runs out
/// the last response is returned as-is; if the last attempt produced no
/// response at all, the call fails with [`TransportError::RetriesExhausted`].
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Transport> RetryingTransport<T> {
    async fn send_with_retries(
        &self,
        request: &HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let max_retries = self.policy.max_retries;
        let mut outcome = self.inner.send(request).await;

        match &outcome {
            Ok(resp) if resp.is_success() => return outcome,
            Err(e) => info!(
                url = %redact_url(&request.url),
                error = %e,
                max_retries,
                "request failed, retrying if budget allows"
            ),
            Ok(_) => {}
        }

        for attempt in 1..=max_retries {
            match &outcome {
                Err(_) => {}
                Ok(resp) if is_retryable_status(resp.status) => {}
                Ok(_) => return outcome,
            }

            info!(attempt, max_retries, url = %redact_url(&request.url), "retrying request");
            tokio::time::sleep(self.policy.backoff).await;

            outcome = self.inner.send(request).await;
            match &outcome {
                Ok(resp) if resp.is_success() => {
                    info!(attempt, url = %redact_url(&request.url), "retried request succeeded");
                    return outcome;
                }
                Err(e) => info!(
                    attempt,
                    max_retries,
                    url = %redact_url(&request.url),
                    error = %e,
                    "retry failed"
                ),
                Ok(resp) => info!(
                    attempt,
                    max_retries,
                    status = resp.status,
                    "retry returned error status"
                ),
            }
        }

        outcome.map_err(|last| TransportError::RetriesExhausted {
            url: redact_url(&request.url),
            attempts: max_retries + 1,
            last: Box::new(last),
        })
    }
}

impl<T: Transport> Transport for RetryingTransport<T> {
    fn send<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>> {
        Box::pin(self.send_with_retries(request))
    }
}
