//! Typed client for the calls of one release lifecycle.
//!
//! Apps-API calls carry the `X-API-Token` header; upload-domain and
//! pre-signed symbol URLs authenticate through their own query token and
//! never see it.

use appdist_protocol::constants::{
    API_TOKEN_HEADER, BLOB_TYPE_BLOCK, BLOB_TYPE_HEADER, CONTENT_TYPE_OCTET_STREAM,
    SYMBOL_TYPE_ANDROID_PROGUARD,
};
use appdist_protocol::messages::{
    AddDistributionGroupRequest, AssetResponse, CommitSymbolUploadRequest,
    DistributionGroupResponse, PatchUploadStatusRequest, PrepareBinaryUploadResponse,
    PrepareReleaseResponse, PrepareSymbolUploadRequest, PrepareSymbolUploadResponse,
    ReleaseUploadStatusResponse, UpdateReleaseRequest,
};
use appdist_protocol::{Endpoints, ReleaseUploadSession};
use appdist_transport::redact::redact_url;
use appdist_transport::{HttpRequest, HttpResponse, Transport};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProtocolError, ReleaseError};
use crate::types::{ApiToken, DebugSymbols, UploadTarget};

/// Distribution service client over any [`Transport`].
pub struct DistributionApi<T> {
    transport: T,
    endpoints: Endpoints,
    token: ApiToken,
}

impl<T> DistributionApi<T> {
    pub fn new(transport: T, endpoints: Endpoints, token: ApiToken) -> Self {
        Self {
            transport,
            endpoints,
            token,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T: Transport> DistributionApi<T> {
    fn authed(&self, request: HttpRequest) -> HttpRequest {
        request.header(API_TOKEN_HEADER, self.token.expose())
    }

    /// Sends `request`; any response, including non-2xx, is returned.
    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ReleaseError> {
        Ok(self.transport.send(request).await?)
    }

    async fn send_checked(&self, request: HttpRequest) -> Result<HttpResponse, ReleaseError> {
        let resp = self.send(&request).await?;
        if !resp.is_success() {
            return Err(ReleaseError::server(&resp));
        }
        Ok(resp)
    }

    async fn send_json<R: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<R, ReleaseError> {
        let resp = self.send_checked(request).await?;
        decode(&resp)
    }

    // -- release upload ------------------------------------------------------

    /// `POST uploads/releases`: opens a release upload session.
    pub async fn prepare_release_upload(&self) -> Result<ReleaseUploadSession, ReleaseError> {
        let request = with_json(
            self.authed(HttpRequest::post(self.endpoints.release_uploads())),
            &serde_json::json!({}),
        )?;
        let resp: PrepareReleaseResponse = self.send_json(request).await?;
        Ok(resp.into())
    }

    /// Announces the binary; the response dictates the chunk size.
    pub async fn prepare_binary_upload(
        &self,
        session: &ReleaseUploadSession,
        target: &UploadTarget,
    ) -> Result<PrepareBinaryUploadResponse, ReleaseError> {
        let url = session.set_metadata_url(&target.file_name, target.len, &target.content_type);
        self.send_json(HttpRequest::post(url)).await
    }

    /// Sends one block. The raw response is returned for the caller to classify.
    pub async fn upload_chunk(
        &self,
        session: &ReleaseUploadSession,
        block_number: u64,
        data: Vec<u8>,
    ) -> Result<HttpResponse, ReleaseError> {
        let request = HttpRequest::post(session.chunk_url(block_number))
            .body(CONTENT_TYPE_OCTET_STREAM, data);
        self.send(&request).await
    }

    /// Signals the end of the binary stream.
    pub async fn finalize_binary_upload(
        &self,
        session: &ReleaseUploadSession,
    ) -> Result<AssetResponse, ReleaseError> {
        let resp: AssetResponse = self
            .send_json(HttpRequest::post(session.finished_url()))
            .await?;
        if resp.error {
            return Err(ProtocolError::FinalizeRejected {
                code: resp.error_code().to_string(),
            }
            .into());
        }
        Ok(resp)
    }

    /// Marks the upload `uploadFinished` so the server starts processing.
    pub async fn commit_release_upload(&self, upload_id: &str) -> Result<(), ReleaseError> {
        let request = with_json(
            self.authed(HttpRequest::patch(self.endpoints.release_upload(upload_id))),
            &PatchUploadStatusRequest::upload_finished(),
        )?;
        self.send_checked(request).await?;
        Ok(())
    }

    pub async fn release_upload_status(
        &self,
        upload_id: &str,
    ) -> Result<ReleaseUploadStatusResponse, ReleaseError> {
        let request = self.authed(HttpRequest::get(self.endpoints.release_upload(upload_id)));
        self.send_json(request).await
    }

    // -- release metadata and distribution ----------------------------------

    pub async fn update_release_notes(
        &self,
        release_id: u64,
        release_notes: &str,
    ) -> Result<(), ReleaseError> {
        let request = with_json(
            self.authed(HttpRequest::put(self.endpoints.release(release_id))),
            &UpdateReleaseRequest {
                release_notes: release_notes.to_string(),
            },
        )?;
        self.send_checked(request).await?;
        Ok(())
    }

    pub async fn distribution_group(
        &self,
        name: &str,
    ) -> Result<DistributionGroupResponse, ReleaseError> {
        let request = self.authed(HttpRequest::get(self.endpoints.distribution_group(name)));
        self.send_json(request).await
    }

    /// Attaches a group to a release. Updates are never mandatory.
    pub async fn add_distribution_group(
        &self,
        release_id: u64,
        group_id: &str,
        notify_testers: bool,
    ) -> Result<(), ReleaseError> {
        let request = with_json(
            self.authed(HttpRequest::post(self.endpoints.release_groups(release_id))),
            &AddDistributionGroupRequest {
                id: group_id.to_string(),
                mandatory_update: false,
                notify_testers,
            },
        )?;
        self.send_checked(request).await?;
        Ok(())
    }

    // -- symbols ------------------------------------------------------------

    pub async fn prepare_symbol_upload(
        &self,
        symbols: &DebugSymbols,
    ) -> Result<PrepareSymbolUploadResponse, ReleaseError> {
        let request = with_json(
            self.authed(HttpRequest::post(self.endpoints.symbol_uploads())),
            &PrepareSymbolUploadRequest {
                symbol_type: SYMBOL_TYPE_ANDROID_PROGUARD.into(),
                build: symbols.build.clone(),
                version: symbols.version.clone(),
                file_name: symbols.file_name(),
            },
        )?;
        self.send_json(request).await
    }

    /// `PUT`s the mapping file to its pre-signed blob URL.
    pub async fn upload_symbol_file(
        &self,
        upload_url: &str,
        data: Vec<u8>,
    ) -> Result<(), ReleaseError> {
        let request = HttpRequest::put(upload_url)
            .header(BLOB_TYPE_HEADER, BLOB_TYPE_BLOCK)
            .body(CONTENT_TYPE_OCTET_STREAM, data);
        self.send_checked(request).await?;
        Ok(())
    }

    pub async fn commit_symbol_upload(&self, symbol_upload_id: &str) -> Result<(), ReleaseError> {
        let request = with_json(
            self.authed(HttpRequest::patch(self.endpoints.symbol_upload(symbol_upload_id))),
            &CommitSymbolUploadRequest::committed(),
        )?;
        self.send_checked(request).await?;
        Ok(())
    }
}

fn with_json<B: Serialize>(request: HttpRequest, body: &B) -> Result<HttpRequest, ReleaseError> {
    request
        .json(body)
        .map_err(|e| ProtocolError::Encode(e).into())
}

/// Decodes a successful response body.
pub(crate) fn decode<R: DeserializeOwned>(resp: &HttpResponse) -> Result<R, ReleaseError> {
    if resp.body.iter().all(u8::is_ascii_whitespace) {
        return Err(ProtocolError::MissingBody {
            url: redact_url(&resp.url),
        }
        .into());
    }
    resp.json().map_err(|source| {
        ProtocolError::Decode {
            url: redact_url(&resp.url),
            source,
        }
        .into()
    })
}
