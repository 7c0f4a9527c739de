//! Block-by-block binary transfer to the upload domain.

use appdist_protocol::ReleaseUploadSession;
use appdist_protocol::messages::AssetResponse;
use appdist_transfer::{BlockReader, SpeedCalculator, TransferError};
use appdist_transport::Transport;
use tracing::{debug, info};

use crate::api::{DistributionApi, decode};
use crate::error::{ProtocolError, ReleaseError};
use crate::types::{EventSink, ReleaseEvent, UploadTarget};

/// Counters for a finished transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    pub blocks: u64,
    pub bytes_sent: u64,
}

/// Asks the server for its block size, then sends `target` one block at a
/// time with block numbers `1..=n`.
///
/// Stops at the first block answered with a non-2xx status or an `error`
/// flag. Finalizing the stream is left to the caller.
pub async fn upload_binary<T: Transport>(
    api: &DistributionApi<T>,
    session: &ReleaseUploadSession,
    target: &UploadTarget,
    events: &EventSink,
) -> Result<TransferReport, ReleaseError> {
    let meta = api.prepare_binary_upload(session, target).await?;
    if meta.chunk_size == 0 {
        return Err(ProtocolError::InvalidChunkSize(meta.chunk_size).into());
    }

    let mut reader = BlockReader::open(&target.path, meta.chunk_size).await?;
    let plan = *reader.plan();
    if plan.file_len() != target.len {
        return Err(TransferError::Truncated {
            expected: target.len,
            actual: plan.file_len(),
        }
        .into());
    }

    let total_blocks = plan.block_count();
    info!(
        file = %target.file_name,
        bytes = target.len,
        chunk_size = meta.chunk_size,
        blocks = total_blocks,
        last_block = plan.last_block_len(),
        "uploading binary"
    );

    let mut speed = SpeedCalculator::default();
    speed.record(0);
    let mut bytes_sent = 0u64;
    let mut blocks = 0u64;

    while let Some(block) = reader.next_block().await? {
        let index = block.index;
        let offset = block.offset;
        let len = block.data.len() as u64;

        let resp = api.upload_chunk(session, index, block.data).await?;
        if !resp.is_success() {
            return Err(ReleaseError::server(&resp));
        }
        let ack: AssetResponse = decode(&resp)?;
        if ack.error {
            return Err(ProtocolError::BlockRejected {
                block: index,
                code: ack.error_code().to_string(),
            }
            .into());
        }

        blocks += 1;
        bytes_sent += len;
        speed.record(len);
        debug!(
            block = index,
            total_blocks,
            offset,
            bytes_sent,
            eta_secs = speed.eta(reader.remaining()).map(|d| d.as_secs()),
            "block uploaded"
        );
        events
            .emit(ReleaseEvent::BlockUploaded {
                block: index,
                total_blocks,
                bytes_sent,
                total_bytes: target.len,
            })
            .await;
    }

    if blocks == 0 {
        return Err(crate::error::ConfigError::EmptyArtifact {
            path: target.path.clone(),
        }
        .into());
    }

    info!(
        blocks,
        bytes_sent,
        bytes_per_sec = speed.average_bytes_per_second() as u64,
        "binary transfer complete"
    );
    Ok(TransferReport { blocks, bytes_sent })
}
