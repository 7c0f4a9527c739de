//! Debug-symbol (mapping file) upload: prepare, upload, commit.

use appdist_transport::Transport;
use tracing::info;

use crate::api::DistributionApi;
use crate::error::ReleaseError;
use crate::types::DebugSymbols;

/// Uploads `symbols` and returns the server's symbol upload id.
///
/// The commit is only issued after the blob upload succeeded.
pub async fn upload_symbols<T: Transport>(
    api: &DistributionApi<T>,
    symbols: &DebugSymbols,
) -> Result<String, ReleaseError> {
    let prepared = api.prepare_symbol_upload(symbols).await?;
    let data = tokio::fs::read(&symbols.path).await?;
    let bytes = data.len();

    api.upload_symbol_file(&prepared.upload_url, data).await?;
    api.commit_symbol_upload(&prepared.symbol_upload_id).await?;

    info!(
        symbol_upload_id = %prepared.symbol_upload_id,
        file = %symbols.file_name(),
        bytes,
        "uploaded debug symbols"
    );
    Ok(prepared.symbol_upload_id)
}
