//! Data types for the release pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use appdist_protocol::constants::CONTENT_TYPE_APK;
use tokio::sync::mpsc;

use crate::error::ConfigError;

/// API credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw secret, for the request header only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}

impl From<String> for ApiToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Resolved parameters for one build variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseConfiguration {
    pub owner: String,
    pub app_name: String,
    pub api_token: ApiToken,
    /// Distribution group names; resolved to ids before upload.
    pub distribution_targets: Vec<String>,
    pub notify_testers: bool,
    pub release_notes: Option<String>,
    /// Retries per request after the first attempt.
    pub max_retries: u32,
}

impl ReleaseConfiguration {
    /// Checks required fields before anything touches the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_token.is_blank() {
            return Err(ConfigError::MissingField { field: "apiKey" });
        }
        if self.owner.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "appOwner" });
        }
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "appName" });
        }
        if self.distribution_targets.is_empty() {
            return Err(ConfigError::NoDistributionTargets {
                variant: self.app_name.clone(),
            });
        }
        Ok(())
    }

    /// Release notes worth publishing: present and not blank.
    pub fn release_notes(&self) -> Option<&str> {
        self.release_notes
            .as_deref()
            .filter(|notes| !notes.trim().is_empty())
    }
}

/// The local artifact to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub path: PathBuf,
    pub file_name: String,
    pub len: u64,
    pub content_type: String,
}

impl UploadTarget {
    /// Reads the artifact's metadata. Empty files are rejected.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, crate::ReleaseError> {
        let path = path.as_ref();
        let len = tokio::fs::metadata(path).await?.len();
        if len == 0 {
            return Err(ConfigError::EmptyArtifact {
                path: path.to_path_buf(),
            }
            .into());
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            len,
            content_type: CONTENT_TYPE_APK.into(),
        })
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// A debug-symbol mapping file for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSymbols {
    pub path: PathBuf,
    /// Build number (version code).
    pub build: String,
    pub version: String,
}

impl DebugSymbols {
    pub fn new(
        path: impl Into<PathBuf>,
        build: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            build: build.into(),
            version: version.into(),
        }
    }

    /// `true` if the mapping file exists and is non-empty.
    pub async fn is_present(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .is_ok_and(|m| m.is_file() && m.len() > 0)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A distribution group resolved to its server id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionGroup {
    pub name: String,
    pub id: String,
}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolveGroups,
    Prepare,
    Transfer,
    Finalize,
    Commit,
    Poll,
    ReleaseNotes,
    Distribute,
    Symbols,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ResolveGroups => "resolving distribution groups",
            Self::Prepare => "preparing upload",
            Self::Transfer => "uploading binary",
            Self::Finalize => "finalizing upload",
            Self::Commit => "committing upload",
            Self::Poll => "waiting for release",
            Self::ReleaseNotes => "updating release notes",
            Self::Distribute => "distributing release",
            Self::Symbols => "uploading symbols",
        };
        f.write_str(s)
    }
}

/// Progress event emitted during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseEvent {
    StageStarted(Stage),
    BlockUploaded {
        block: u64,
        total_blocks: u64,
        bytes_sent: u64,
        total_bytes: u64,
    },
    StatusPolled { attempt: u32, status: String },
    GroupAttached { name: String },
    Completed { release_id: u64 },
    Failed { error: String },
}

/// Fire-and-forget event channel; a closed or absent receiver is ignored.
#[derive(Debug, Clone, Default)]
pub struct EventSink(Option<mpsc::Sender<ReleaseEvent>>);

impl EventSink {
    pub fn new(tx: Option<mpsc::Sender<ReleaseEvent>>) -> Self {
        Self(tx)
    }

    pub async fn emit(&self, event: ReleaseEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(event).await;
        }
    }
}

/// What happened to the debug symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolOutcome {
    Skipped,
    Uploaded { symbol_upload_id: String },
    /// Only under [`SymbolFailurePolicy::Warn`](crate::SymbolFailurePolicy::Warn).
    Failed { error: String },
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub upload_id: String,
    pub release_id: u64,
    pub blocks: u64,
    pub bytes_sent: u64,
    pub groups: Vec<String>,
    pub symbols: SymbolOutcome,
}
