//! Release pipeline error types.

use std::path::PathBuf;
use std::time::Duration;

use appdist_protocol::messages::error_message;
use appdist_transfer::TransferError;
use appdist_transport::redact::redact_url;
use appdist_transport::{HttpResponse, TransportError};

/// Errors produced by a release upload run.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("server returned {status} ({message}) for {url}{}", body_suffix(.body))]
    Server {
        url: String,
        status: u16,
        message: String,
        body: Option<String>,
    },

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("inconsistent server state: {0}")]
    Inconsistency(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("release upload did not finish within {0:?}")]
    Timeout(Duration),
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(b) => format!(": {b}"),
        None => String::new(),
    }
}

impl ReleaseError {
    /// Builds a [`ReleaseError::Server`] from a non-2xx response.
    ///
    /// The message is the server's own when the body carries one, else the
    /// canonical reason phrase.
    pub fn server(resp: &HttpResponse) -> Self {
        let message = error_message(&resp.body).unwrap_or_else(|| resp.reason().to_string());
        let body = (!resp.body.is_empty()).then(|| resp.text());
        Self::Server {
            url: redact_url(&resp.url),
            status: resp.status,
            message,
            body,
        }
    }

    /// HTTP status for server errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A successful response that does not honour the protocol.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("expected a response body from {url}")]
    MissingBody { url: String },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("block {block} rejected by upload server (code {code})")]
    BlockRejected { block: u64, code: String },

    #[error("upload server rejected finalize (code {code})")]
    FinalizeRejected { code: String },

    #[error("release processing failed: {details}")]
    ProcessingFailed { details: String },

    #[error("server dictated an invalid chunk size of {0}")]
    InvalidChunkSize(u64),
}

/// Missing or invalid configuration, detected before any network call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Missing required field: {field} (variant {variant})")]
    MissingFieldForVariant { field: &'static str, variant: String },

    #[error("at least one tester or group must be provided for variant {variant}")]
    NoDistributionTargets { variant: String },

    #[error("artifact {} is empty", .path.display())]
    EmptyArtifact { path: PathBuf },

    #[error("failed to read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}
