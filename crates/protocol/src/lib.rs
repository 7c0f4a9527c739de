//! Wire protocol for the release distribution API.
//!
//! JSON payloads for every call of one release lifecycle, the status
//! sentinels the server uses, and URL builders for both the apps API and
//! the pre-signed upload domain.

pub mod constants;
pub mod endpoints;
pub mod messages;
pub mod session;

pub use endpoints::Endpoints;
pub use session::ReleaseUploadSession;
