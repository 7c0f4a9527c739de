//! Release upload orchestrator.
//!
//! One run, in order:
//!
//! 1. **Resolve** every distribution group (fails fast on a bad name)
//! 2. **Prepare** the release upload session
//! 3. **Transfer** the binary block by block
//! 4. **Finalize** the binary stream
//! 5. **Commit** the upload status
//! 6. **Poll** until the release id is known
//! 7. **Notes**: set release notes when present
//! 8. **Distribute** to each resolved group
//! 9. **Symbols**: prepare, upload, commit the mapping file when present
//!
//! Any failure aborts the remaining steps. Completed steps are not undone.

use std::time::Duration;

use appdist_protocol::Endpoints;
use appdist_protocol::constants::DEFAULT_API_BASE_URL;
use appdist_transport::{RetryPolicy, TimeoutConfig, Transport, standard_stack};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::api::DistributionApi;
use crate::chunked::upload_binary;
use crate::error::{ConfigError, ReleaseError};
use crate::groups::{attach_groups, resolve_groups};
use crate::poller::{DEFAULT_POLL_INTERVAL, poll_release_id};
use crate::symbols::upload_symbols;
use crate::types::{
    DebugSymbols, EventSink, ReleaseConfiguration, ReleaseEvent, ReleaseOutcome, Stage,
    SymbolOutcome, UploadTarget,
};

/// Upper bound for a whole run, polling included.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// What a failed symbol upload does to the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SymbolFailurePolicy {
    /// Fail the run even though the release is already distributed.
    #[default]
    Abort,
    /// Log, record in [`SymbolOutcome::Failed`], and succeed.
    Warn,
}

/// Knobs for one run that do not come from the release configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub api_base_url: String,
    pub timeouts: TimeoutConfig,
    /// Fixed delay between retries; the retry count comes from the configuration.
    pub retry_backoff: Duration,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
    pub symbol_failure: SymbolFailurePolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            timeouts: TimeoutConfig::default(),
            retry_backoff: RetryPolicy::default().backoff,
            poll_interval: DEFAULT_POLL_INTERVAL,
            run_timeout: DEFAULT_RUN_TIMEOUT,
            symbol_failure: SymbolFailurePolicy::default(),
        }
    }
}

/// Drives one release upload over a [`DistributionApi`].
pub struct ReleasePipeline<T> {
    api: DistributionApi<T>,
    poll_interval: Duration,
    symbol_failure: SymbolFailurePolicy,
    events: EventSink,
}

impl<T: Transport> ReleasePipeline<T> {
    pub fn new(api: DistributionApi<T>, options: &RunOptions) -> Self {
        Self {
            api,
            poll_interval: options.poll_interval,
            symbol_failure: options.symbol_failure,
            events: EventSink::default(),
        }
    }

    /// Sends progress events to `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<ReleaseEvent>) -> Self {
        self.events = EventSink::new(Some(tx));
        self
    }

    pub fn api(&self) -> &DistributionApi<T> {
        &self.api
    }

    pub fn into_api(self) -> DistributionApi<T> {
        self.api
    }

    /// Runs every step for `target`, then `symbols` if the file is present.
    pub async fn run(
        &self,
        config: &ReleaseConfiguration,
        target: &UploadTarget,
        symbols: Option<&DebugSymbols>,
    ) -> Result<ReleaseOutcome, ReleaseError> {
        match self.run_steps(config, target, symbols).await {
            Ok(outcome) => {
                self.events
                    .emit(ReleaseEvent::Completed {
                        release_id: outcome.release_id,
                    })
                    .await;
                info!(
                    app = %config.app_name,
                    release_id = outcome.release_id,
                    groups = outcome.groups.len(),
                    "release upload completed"
                );
                Ok(outcome)
            }
            Err(e) => {
                let err_msg = e.to_string();
                self.events
                    .emit(ReleaseEvent::Failed {
                        error: err_msg.clone(),
                    })
                    .await;
                error!(app = %config.app_name, error = %err_msg, "release upload failed");
                Err(e)
            }
        }
    }

    /// [`run`](Self::run) bounded by `limit`.
    ///
    /// An elapsed limit drops the in-flight step and yields
    /// [`ReleaseError::Timeout`].
    pub async fn run_with_timeout(
        &self,
        config: &ReleaseConfiguration,
        target: &UploadTarget,
        symbols: Option<&DebugSymbols>,
        limit: Duration,
    ) -> Result<ReleaseOutcome, ReleaseError> {
        match tokio::time::timeout(limit, self.run(config, target, symbols)).await {
            Ok(result) => result,
            Err(_) => {
                error!(timeout = ?limit, "release upload timed out");
                self.events
                    .emit(ReleaseEvent::Failed {
                        error: ReleaseError::Timeout(limit).to_string(),
                    })
                    .await;
                Err(ReleaseError::Timeout(limit))
            }
        }
    }

    async fn stage(&self, stage: Stage) {
        info!(stage = %stage, "release stage");
        self.events.emit(ReleaseEvent::StageStarted(stage)).await;
    }

    async fn run_steps(
        &self,
        config: &ReleaseConfiguration,
        target: &UploadTarget,
        symbols: Option<&DebugSymbols>,
    ) -> Result<ReleaseOutcome, ReleaseError> {
        config.validate()?;
        if target.len == 0 {
            return Err(ConfigError::EmptyArtifact {
                path: target.path.clone(),
            }
            .into());
        }

        // 1. Resolve groups before any data moves
        self.stage(Stage::ResolveGroups).await;
        let groups = resolve_groups(&self.api, &config.distribution_targets).await?;

        // 2. Prepare
        self.stage(Stage::Prepare).await;
        let session = self.api.prepare_release_upload().await?;
        info!(upload_id = %session.upload_id, "release upload prepared");

        // 3. Transfer
        self.stage(Stage::Transfer).await;
        let report = upload_binary(&self.api, &session, target, &self.events).await?;

        // 4. Finalize
        self.stage(Stage::Finalize).await;
        self.api.finalize_binary_upload(&session).await?;

        // 5. Commit
        self.stage(Stage::Commit).await;
        self.api.commit_release_upload(&session.upload_id).await?;

        // 6. Poll
        self.stage(Stage::Poll).await;
        let release_id =
            poll_release_id(&self.api, &session.upload_id, self.poll_interval, &self.events)
                .await?;

        // 7. Release notes
        if let Some(notes) = config.release_notes() {
            self.stage(Stage::ReleaseNotes).await;
            self.api.update_release_notes(release_id, notes).await?;
        }

        // 8. Distribute
        self.stage(Stage::Distribute).await;
        let attached = attach_groups(
            &self.api,
            release_id,
            &groups,
            config.notify_testers,
            &self.events,
        )
        .await?;

        // 9. Symbols
        let symbols = self.upload_symbols_if_present(symbols).await?;

        Ok(ReleaseOutcome {
            upload_id: session.upload_id.clone(),
            release_id,
            blocks: report.blocks,
            bytes_sent: report.bytes_sent,
            groups: attached,
            symbols,
        })
    }

    async fn upload_symbols_if_present(
        &self,
        symbols: Option<&DebugSymbols>,
    ) -> Result<SymbolOutcome, ReleaseError> {
        let Some(symbols) = symbols else {
            return Ok(SymbolOutcome::Skipped);
        };
        if !symbols.is_present().await {
            info!(path = %symbols.path.display(), "no mapping file, skipping symbols");
            return Ok(SymbolOutcome::Skipped);
        }

        self.stage(Stage::Symbols).await;
        match upload_symbols(&self.api, symbols).await {
            Ok(symbol_upload_id) => Ok(SymbolOutcome::Uploaded { symbol_upload_id }),
            Err(e) if self.symbol_failure == SymbolFailurePolicy::Warn => {
                warn!(error = %e, "symbol upload failed; release is already distributed");
                Ok(SymbolOutcome::Failed {
                    error: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// Runs one release upload over the production HTTP stack.
///
/// The configuration is checked before any network call. The HTTP client
/// and its connection pool are released before returning, on every path.
pub async fn run_release_upload(
    config: &ReleaseConfiguration,
    target: &UploadTarget,
    symbols: Option<&DebugSymbols>,
    options: &RunOptions,
) -> Result<ReleaseOutcome, ReleaseError> {
    run_release_upload_with_events(config, target, symbols, options, None).await
}

/// [`run_release_upload`] with progress events sent to `events`.
pub async fn run_release_upload_with_events(
    config: &ReleaseConfiguration,
    target: &UploadTarget,
    symbols: Option<&DebugSymbols>,
    options: &RunOptions,
    events: Option<mpsc::Sender<ReleaseEvent>>,
) -> Result<ReleaseOutcome, ReleaseError> {
    config.validate()?;

    let policy = RetryPolicy::new(config.max_retries, options.retry_backoff);
    let transport = standard_stack(options.timeouts, policy)?;
    let endpoints = Endpoints::new(&options.api_base_url, &config.owner, &config.app_name);
    let api = DistributionApi::new(transport, endpoints, config.api_token.clone());

    let mut pipeline = ReleasePipeline::new(api, options);
    if let Some(tx) = events {
        pipeline = pipeline.with_events(tx);
    }

    let result = pipeline
        .run_with_timeout(config, target, symbols, options.run_timeout)
        .await;

    pipeline
        .into_api()
        .into_transport()
        .into_inner()
        .into_inner()
        .shutdown();
    result
}
