//! Credential redaction for anything that reaches a log line or an error.

use std::fmt;

/// Replacement text for redacted values.
pub const REDACTED: &str = "<redacted>";

/// Header names (lower-case) whose values are credentials.
const SENSITIVE_HEADERS: &[&str] = &["x-api-token", "authorization", "proxy-authorization"];

/// Query parameters whose values are credentials (pre-signed upload tokens).
const SENSITIVE_QUERY_KEYS: &[&str] = &["token", "sig"];

/// Returns `true` if `name` carries a credential.
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Returns `url` with the values of credential query parameters replaced.
pub fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let query: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if SENSITIVE_QUERY_KEYS.contains(&key) => format!("{key}={REDACTED}"),
            _ => pair.to_string(),
        })
        .collect();
    format!("{base}?{}", query.join("&"))
}

/// Displays a header list with credential values replaced.
pub struct RedactedHeaders<'a>(pub &'a [(String, String)]);

impl fmt::Display for RedactedHeaders<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let value = if is_sensitive_header(name) {
                REDACTED
            } else {
                value.as_str()
            };
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}
