//! Release status polling.

use std::collections::HashSet;
use std::time::Duration;

use appdist_protocol::constants::upload_status;
use appdist_protocol::messages::ReleaseUploadStatusResponse;
use appdist_transport::Transport;
use tracing::{debug, info, warn};

use crate::api::DistributionApi;
use crate::error::{ProtocolError, ReleaseError};
use crate::types::{EventSink, ReleaseEvent};

/// Delay between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Classified server-side processing state of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseStatus {
    /// Still processing; carries the raw status string.
    Pending(String),
    Ready(u64),
    Error(String),
}

impl ReleaseStatus {
    /// Classifies a status response.
    ///
    /// A ready status without a release id is an unrecoverable
    /// [`ReleaseError::Inconsistency`]. Every status that is neither ready
    /// nor error counts as pending.
    pub fn classify(resp: &ReleaseUploadStatusResponse) -> Result<Self, ReleaseError> {
        match resp.upload_status.as_str() {
            upload_status::READY_TO_BE_PUBLISHED => match resp.release_distinct_id {
                Some(id) => Ok(Self::Ready(id)),
                None => Err(ReleaseError::Inconsistency(format!(
                    "upload {} is {} but carries no release id",
                    resp.id,
                    upload_status::READY_TO_BE_PUBLISHED
                ))),
            },
            upload_status::ERROR => Ok(Self::Error(
                resp.error_details
                    .clone()
                    .unwrap_or_else(|| "no details provided".into()),
            )),
            other => Ok(Self::Pending(other.to_string())),
        }
    }
}

/// Queries the upload's status until it is ready or failed.
///
/// There is no attempt ceiling; the caller's overall timeout bounds the loop.
pub async fn poll_release_id<T: Transport>(
    api: &DistributionApi<T>,
    upload_id: &str,
    interval: Duration,
    events: &EventSink,
) -> Result<u64, ReleaseError> {
    let mut unexpected: HashSet<String> = HashSet::new();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let resp = api.release_upload_status(upload_id).await?;
        events
            .emit(ReleaseEvent::StatusPolled {
                attempt,
                status: resp.upload_status.clone(),
            })
            .await;

        match ReleaseStatus::classify(&resp)? {
            ReleaseStatus::Ready(release_id) => {
                info!(upload_id, release_id, attempts = attempt, "release ready");
                return Ok(release_id);
            }
            ReleaseStatus::Error(details) => {
                return Err(ProtocolError::ProcessingFailed { details }.into());
            }
            ReleaseStatus::Pending(status) => {
                let known = status == upload_status::UPLOAD_STARTED
                    || status == upload_status::UPLOAD_FINISHED;
                if !known && unexpected.insert(status.clone()) {
                    warn!(upload_id, status = %status, "unrecognized upload status, still waiting");
                }
                debug!(upload_id, attempt, status = %status, "release not ready");
            }
        }

        tokio::time::sleep(interval).await;
    }
}
