use serde::{Deserialize, Serialize};

use crate::constants::{SYMBOL_STATUS_COMMITTED, upload_status};

// ---------------------------------------------------------------------------
// Release upload
// ---------------------------------------------------------------------------

/// Response of `POST {owner}/{app}/uploads/releases`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareReleaseResponse {
    pub id: String,
    pub upload_domain: String,
    pub token: String,
    pub url_encoded_token: String,
    pub package_asset_id: String,
}

/// Response of `POST {uploadDomain}/upload/set_metadata/{assetId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareBinaryUploadResponse {
    pub chunk_size: u64,
}

/// Response of the upload-domain `upload_chunk` and `finished` calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetResponse {
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_num: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AssetResponse {
    /// Server error code, or `"unknown"` when the flag is set without one.
    pub fn error_code(&self) -> &str {
        self.error_code.as_deref().unwrap_or("unknown")
    }
}

/// Body of `PATCH {owner}/{app}/uploads/releases/{uploadId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchUploadStatusRequest {
    pub upload_status: String,
}

impl PatchUploadStatusRequest {
    pub fn upload_finished() -> Self {
        Self {
            upload_status: upload_status::UPLOAD_FINISHED.into(),
        }
    }
}

/// Response of `GET {owner}/{app}/uploads/releases/{uploadId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseUploadStatusResponse {
    #[serde(default)]
    pub id: String,
    pub upload_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_distinct_id: Option<u64>,
}

// ---------------------------------------------------------------------------
// Release metadata and distribution
// ---------------------------------------------------------------------------

/// Body of `PUT {owner}/{app}/releases/{releaseId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateReleaseRequest {
    pub release_notes: String,
}

/// Response of `GET {owner}/{app}/distribution_groups/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionGroupResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body of `POST {owner}/{app}/releases/{releaseId}/groups`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddDistributionGroupRequest {
    pub id: String,
    pub mandatory_update: bool,
    pub notify_testers: bool,
}

// ---------------------------------------------------------------------------
// Symbol upload
// ---------------------------------------------------------------------------

/// Body of `POST {owner}/{app}/symbol_uploads`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareSymbolUploadRequest {
    pub symbol_type: String,
    pub build: String,
    pub version: String,
    pub file_name: String,
}

/// Response of `POST {owner}/{app}/symbol_uploads`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareSymbolUploadResponse {
    pub upload_url: String,
    pub symbol_upload_id: String,
}

/// Body of `PATCH {owner}/{app}/symbol_uploads/{uploadId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitSymbolUploadRequest {
    pub status: String,
}

impl CommitSymbolUploadRequest {
    pub fn committed() -> Self {
        Self {
            status: SYMBOL_STATUS_COMMITTED.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error body returned by the apps API on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Extracts the `message` from an error body, if it parses and has one.
///
/// Accepts both the flat `{"code","message"}` shape and the nested
/// `{"error":{"code","message"}}` shape.
pub fn error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct Nested {
        error: ApiErrorBody,
    }

    if let Ok(nested) = serde_json::from_slice::<Nested>(body) {
        return nested.error.message.filter(|m| !m.is_empty());
    }
    serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}
