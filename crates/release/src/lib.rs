//! Release upload pipeline for the distribution service.
//!
//! This crate turns a local build artifact into a distributed release. It
//! is transport-agnostic: every call goes through a
//! [`Transport`](appdist_transport::Transport), so the pipeline runs the
//! same over the production HTTP stack and over test doubles.
//!
//! # Pipeline
//!
//! 1. **Resolve**: look up every distribution group id
//! 2. **Upload**: prepare a session and send the binary in server-sized blocks
//! 3. **Commit**: finalize the stream and mark the upload finished
//! 4. **Poll**: wait for server-side processing to yield a release id
//! 5. **Distribute**: set release notes and attach each group
//! 6. **Symbols**: upload the mapping file, when there is one

pub mod api;
pub mod chunked;
pub mod config;
pub mod error;
pub mod groups;
pub mod pipeline;
pub mod poller;
pub mod symbols;
pub mod types;

#[cfg(test)]
mod testing;

pub use api::DistributionApi;
pub use config::{BuildVariant, UploadSettings, VariantOverride};
pub use error::{ConfigError, ProtocolError, ReleaseError};
pub use pipeline::{
    ReleasePipeline, RunOptions, SymbolFailurePolicy, run_release_upload,
    run_release_upload_with_events,
};
pub use poller::ReleaseStatus;
pub use types::{
    ApiToken, DebugSymbols, DistributionGroup, EventSink, ReleaseConfiguration, ReleaseEvent,
    ReleaseOutcome, Stage, SymbolOutcome, UploadTarget,
};
