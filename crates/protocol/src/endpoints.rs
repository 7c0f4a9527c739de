//! URL builders for the apps API.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::constants::DEFAULT_API_BASE_URL;

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Characters escaped inside a query-string value.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encodes one path segment.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Percent-encodes one query-string value.
pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// Builds apps-API URLs scoped to one owner and app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    app_root: String,
}

impl Endpoints {
    /// Creates builders rooted at `{base}/{owner}/{app}`.
    pub fn new(base_url: &str, owner: &str, app_name: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            app_root: format!(
                "{base}/{}/{}",
                encode_segment(owner),
                encode_segment(app_name)
            ),
        }
    }

    /// Builders against [`DEFAULT_API_BASE_URL`].
    pub fn with_default_base(owner: &str, app_name: &str) -> Self {
        Self::new(DEFAULT_API_BASE_URL, owner, app_name)
    }

    /// `POST` to create a release upload.
    pub fn release_uploads(&self) -> String {
        format!("{}/uploads/releases", self.app_root)
    }

    /// `PATCH` to commit, `GET` to poll one release upload.
    pub fn release_upload(&self, upload_id: &str) -> String {
        format!(
            "{}/uploads/releases/{}",
            self.app_root,
            encode_segment(upload_id)
        )
    }

    /// `PUT` to update release notes.
    pub fn release(&self, release_id: u64) -> String {
        format!("{}/releases/{release_id}", self.app_root)
    }

    /// `POST` to attach a distribution group to a release.
    pub fn release_groups(&self, release_id: u64) -> String {
        format!("{}/releases/{release_id}/groups", self.app_root)
    }

    /// `GET` to look up a distribution group by name.
    pub fn distribution_group(&self, name: &str) -> String {
        format!(
            "{}/distribution_groups/{}",
            self.app_root,
            encode_segment(name)
        )
    }

    /// `POST` to prepare a symbol upload.
    pub fn symbol_uploads(&self) -> String {
        format!("{}/symbol_uploads", self.app_root)
    }

    /// `PATCH` to commit a symbol upload.
    pub fn symbol_upload(&self, symbol_upload_id: &str) -> String {
        format!(
            "{}/symbol_uploads/{}",
            self.app_root,
            encode_segment(symbol_upload_id)
        )
    }
}
