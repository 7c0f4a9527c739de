//! Fixed values shared by client and server.

/// Base URL of the v0.1 apps API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.appcenter.ms/v0.1/apps";

/// Header carrying the API credential on every authenticated call.
pub const API_TOKEN_HEADER: &str = "X-API-Token";

/// Header required by the blob store when uploading a symbol file.
pub const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";

/// Value of [`BLOB_TYPE_HEADER`].
pub const BLOB_TYPE_BLOCK: &str = "BlockBlob";

pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

/// Declared content type of an Android application package.
pub const CONTENT_TYPE_APK: &str = "application/vnd.android.package-archive";

/// Upload status values reported by `GET .../uploads/releases/{id}`.
pub mod upload_status {
    pub const UPLOAD_STARTED: &str = "uploadStarted";
    pub const UPLOAD_FINISHED: &str = "uploadFinished";
    pub const READY_TO_BE_PUBLISHED: &str = "readyToBePublished";
    pub const ERROR: &str = "error";
}

/// Symbol type sent when preparing a mapping-file upload.
pub const SYMBOL_TYPE_ANDROID_PROGUARD: &str = "AndroidProguard";

/// Status sent when committing a symbol upload.
pub const SYMBOL_STATUS_COMMITTED: &str = "committed";
