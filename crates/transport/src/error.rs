use std::fmt;

use crate::redact::redact_url;

/// Broad category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Connect,
    Timeout,
    Body,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connect => "connection",
            Self::Timeout => "timeout",
            Self::Body => "body",
            Self::Other => "request",
        };
        f.write_str(s)
    }
}

/// Errors produced when no HTTP response could be obtained.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{kind} error for {url}: {message}")]
    Request {
        kind: FailureKind,
        url: String,
        message: String,
    },

    #[error("request to {url} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<TransportError>,
    },
}

impl TransportError {
    /// Builds a [`TransportError::Request`], redacting credentials in `url`.
    pub fn request(kind: FailureKind, url: &str, message: impl Into<String>) -> Self {
        Self::Request {
            kind,
            url: redact_url(url),
            message: message.into(),
        }
    }

    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let kind = if err.is_connect() {
            FailureKind::Connect
        } else if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_body() || err.is_decode() {
            FailureKind::Body
        } else {
            FailureKind::Other
        };
        // reqwest embeds the full URL (token included) in its Display.
        let err = err.without_url();
        let mut message = err.to_string();
        if let Some(source) = std::error::Error::source(&err) {
            message = format!("{message}: {source}");
        }
        Self::request(kind, url, message)
    }

    /// Kind of the underlying failure, looking through retry exhaustion.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Client(_) => FailureKind::Other,
            Self::Request { kind, .. } => *kind,
            Self::RetriesExhausted { last, .. } => last.kind(),
        }
    }
}
