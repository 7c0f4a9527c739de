//! The server-issued handle for one in-flight release upload.

use std::fmt;

use crate::endpoints::{encode_query_value, encode_segment};
use crate::messages::PrepareReleaseResponse;

/// Identifies one release upload.
///
/// Created from the response of the prepare call and only read afterwards.
/// Upload-domain URLs carry the pre-signed token as a query parameter; the
/// server hands it out already URL-encoded, so it is appended verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct ReleaseUploadSession {
    pub upload_id: String,
    pub upload_domain: String,
    pub token: String,
    pub url_encoded_token: String,
    pub package_asset_id: String,
}

impl From<PrepareReleaseResponse> for ReleaseUploadSession {
    fn from(resp: PrepareReleaseResponse) -> Self {
        Self {
            upload_id: resp.id,
            upload_domain: resp.upload_domain,
            token: resp.token,
            url_encoded_token: resp.url_encoded_token,
            package_asset_id: resp.package_asset_id,
        }
    }
}

impl fmt::Debug for ReleaseUploadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseUploadSession")
            .field("upload_id", &self.upload_id)
            .field("upload_domain", &self.upload_domain)
            .field("token", &"<redacted>")
            .field("package_asset_id", &self.package_asset_id)
            .finish()
    }
}

impl ReleaseUploadSession {
    fn domain_url(&self, action: &str) -> String {
        format!(
            "{}/upload/{action}/{}",
            self.upload_domain.trim_end_matches('/'),
            encode_segment(&self.package_asset_id)
        )
    }

    /// `POST` announcing the binary; the response dictates the chunk size.
    pub fn set_metadata_url(&self, file_name: &str, file_size: u64, content_type: &str) -> String {
        format!(
            "{}?file_name={}&file_size={file_size}&content_type={}&token={}",
            self.domain_url("set_metadata"),
            encode_query_value(file_name),
            encode_query_value(content_type),
            self.url_encoded_token
        )
    }

    /// `POST` carrying block `block_number` (1-based) as raw bytes.
    pub fn chunk_url(&self, block_number: u64) -> String {
        format!(
            "{}?token={}&block_number={block_number}",
            self.domain_url("upload_chunk"),
            self.url_encoded_token
        )
    }

    /// `POST` signalling the end of the binary stream.
    pub fn finished_url(&self) -> String {
        format!(
            "{}?token={}",
            self.domain_url("finished"),
            self.url_encoded_token
        )
    }
}
