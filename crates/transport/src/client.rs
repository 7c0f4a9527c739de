//! reqwest-backed base transport.

use std::time::Duration;

use tracing::debug;

use crate::{BoxFuture, HttpRequest, HttpResponse, Transport, TransportError};

/// Default for each of the connect, read and write timeouts.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub connect: Duration,
    pub read: Duration,
    pub write: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::uniform(DEFAULT_TIMEOUT)
    }
}

impl TimeoutConfig {
    /// Same value for connect, read and write.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            connect: timeout,
            read: timeout,
            write: timeout,
        }
    }

    /// Upper bound for one whole call.
    ///
    /// reqwest has no separate write timeout, so the body write is bounded
    /// through the total request deadline.
    pub fn call_budget(&self) -> Duration {
        self.connect + self.write + self.read
    }
}

/// Sends requests with a pooled [`reqwest::Client`].
///
/// The pool lives as long as this value; call [`shutdown`](Self::shutdown)
/// (or drop it) at the end of a run to close idle connections.
pub struct ReqwestTransport {
    http: reqwest::Client,
    timeouts: TimeoutConfig,
}

impl ReqwestTransport {
    pub fn new(timeouts: TimeoutConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .user_agent(concat!("appdist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self { http, timeouts })
    }

    pub fn timeouts(&self) -> TimeoutConfig {
        self.timeouts
    }

    /// Releases the connection pool.
    pub fn shutdown(self) {
        debug!("releasing HTTP connection pool");
        drop(self.http);
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method.into(), &request.url)
            .timeout(self.timeouts.call_budget());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&request.url, e))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(&request.url, e))?;

        Ok(HttpResponse {
            status,
            url: request.url.clone(),
            body,
        })
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, TransportError>> {
        Box::pin(self.execute(request))
    }
}
