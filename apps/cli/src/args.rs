//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use appdist_release::{BuildVariant, RunOptions, SymbolFailurePolicy};
use appdist_transport::TimeoutConfig;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SymbolFailure {
    /// Fail the run.
    Abort,
    /// Log a warning and succeed.
    Warn,
}

impl From<SymbolFailure> for SymbolFailurePolicy {
    fn from(s: SymbolFailure) -> Self {
        match s {
            SymbolFailure::Abort => SymbolFailurePolicy::Abort,
            SymbolFailure::Warn => SymbolFailurePolicy::Warn,
        }
    }
}

/// Upload one build variant and distribute it to its testers.
#[derive(Debug, Parser)]
#[command(name = "appdist", version, about)]
pub struct Args {
    /// Settings file with defaults and per-variant overrides.
    #[arg(long, env = "APPDIST_SETTINGS", default_value = "appdist.toml")]
    pub settings: PathBuf,

    /// API token; takes precedence over `api_key` in the settings file.
    #[arg(long, env = "APPDIST_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    #[arg(long)]
    pub application_id: String,

    /// Variant name, e.g. `prodRelease`.
    #[arg(long)]
    pub variant: String,

    #[arg(long, default_value = "")]
    pub flavor: String,

    #[arg(long)]
    pub version_code: u64,

    #[arg(long)]
    pub version_name: String,

    /// Binary to upload.
    #[arg(long)]
    pub artifact: PathBuf,

    /// Debug-symbol mapping file; skipped when absent or empty.
    #[arg(long)]
    pub mapping: Option<PathBuf>,

    #[arg(long)]
    pub content_type: Option<String>,

    #[arg(long, env = "APPDIST_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Connect, read and write timeout per request.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = 5)]
    pub retry_backoff_secs: u64,

    #[arg(long, default_value_t = 1)]
    pub poll_interval_secs: u64,

    /// Budget for the whole run, polling included.
    #[arg(long, default_value_t = 24)]
    pub run_timeout_hours: u64,

    #[arg(long, value_enum, default_value_t = SymbolFailure::Abort)]
    pub symbol_failure: SymbolFailure,
}

impl Args {
    pub fn build_variant(&self) -> BuildVariant {
        BuildVariant {
            application_id: self.application_id.clone(),
            name: self.variant.clone(),
            flavor: self.flavor.clone(),
            version_code: self.version_code,
            version_name: self.version_name.clone(),
            artifact: self.artifact.clone(),
            mapping_file: self.mapping.clone(),
        }
    }

    pub fn run_options(&self) -> RunOptions {
        let defaults = RunOptions::default();
        RunOptions {
            api_base_url: self.api_base_url.clone().unwrap_or(defaults.api_base_url),
            timeouts: TimeoutConfig::uniform(Duration::from_secs(self.timeout_secs)),
            retry_backoff: Duration::from_secs(self.retry_backoff_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            run_timeout: Duration::from_secs(self.run_timeout_hours.saturating_mul(60 * 60)),
            symbol_failure: self.symbol_failure.into(),
        }
    }
}
