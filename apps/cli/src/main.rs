//! `appdist`: upload one build variant to the distribution service.

mod args;

use anyhow::{Context, Result};
use appdist_release::{
    ReleaseEvent, SymbolOutcome, UploadSettings, UploadTarget, run_release_upload_with_events,
};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::Args;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut settings = UploadSettings::load(&args.settings)
        .with_context(|| format!("loading {}", args.settings.display()))?;
    if let Some(token) = args.api_token.clone() {
        settings.api_key = Some(token);
    }

    let variant = args.build_variant();
    let Some(config) = settings.resolve(&variant)? else {
        info!(variant = %variant.name, "no app name mapped, skipping variant");
        return Ok(());
    };

    let mut target = UploadTarget::from_path(&variant.artifact)
        .await
        .with_context(|| format!("reading {}", variant.artifact.display()))?;
    if let Some(content_type) = &args.content_type {
        target = target.with_content_type(content_type.clone());
    }
    let symbols = variant.debug_symbols();

    let (events_tx, mut events_rx) = mpsc::channel(256);
    let reporter = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                ReleaseEvent::StageStarted(stage) => info!("{stage}..."),
                ReleaseEvent::BlockUploaded {
                    block,
                    total_blocks,
                    bytes_sent,
                    total_bytes,
                } => {
                    let pct = bytes_sent as f64 * 100.0 / total_bytes.max(1) as f64;
                    info!("block {block}/{total_blocks} ({pct:.0}%)");
                }
                ReleaseEvent::GroupAttached { name } => info!("distributed to {name}"),
                _ => {}
            }
        }
    });

    let result = run_release_upload_with_events(
        &config,
        &target,
        symbols.as_ref(),
        &args.run_options(),
        Some(events_tx),
    )
    .await;
    if let Err(e) = reporter.await {
        warn!(error = %e, "event reporter stopped abnormally");
    }

    let outcome = result.with_context(|| {
        format!(
            "uploading {} to {}/{}",
            target.file_name, config.owner, config.app_name
        )
    })?;

    info!(
        release_id = outcome.release_id,
        groups = ?outcome.groups,
        "release {} published",
        outcome.release_id
    );
    if let SymbolOutcome::Failed { error } = &outcome.symbols {
        warn!(error = %error, "debug symbols were not uploaded");
    }
    Ok(())
}
