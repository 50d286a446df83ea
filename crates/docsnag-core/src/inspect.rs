//! Response inspection: find the file URL in an intercepted response body.
//!
//! Key precedence is provisional. It mirrors what the upstream services have
//! been observed to return (`{"response":{"url":…}}` first, then flat keys)
//! and may hide a genuine schema ambiguity upstream.

use serde_json::Value;

/// Key paths tried in order; the first non-empty string wins.
pub const KEY_PATHS: &[&[&str]] = &[
    &["response", "url"],
    &["url"],
    &["download_url"],
    &["file_url"],
    &["response", "download_url"],
    &["response", "file_url"],
];

/// Raw (non-JSON) bodies must start with one of these to count as a URL.
const SCHEMES: [&str; 2] = ["https://", "http://"];

/// A URL believed to reference the downloadable file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateUrl(String);

impl CandidateUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CandidateUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts a candidate URL from `body`; `None` means no affordance should appear.
pub fn extract(body: &str) -> Option<CandidateUrl> {
    let found = match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => raw_url(&s),
        Ok(value) => lookup(&value),
        Err(e) => {
            tracing::debug!("response is not JSON ({}); trying raw URL", e);
            raw_url(body)
        }
    };
    if found.is_none() {
        tracing::debug!("no file URL in intercepted response");
    }
    found.map(CandidateUrl)
}

fn lookup(value: &Value) -> Option<String> {
    KEY_PATHS.iter().find_map(|path| {
        let leaf = path.iter().try_fold(value, |v, key| v.get(key))?;
        leaf.as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    })
}

fn raw_url(text: &str) -> Option<String> {
    let text = text.trim();
    SCHEMES
        .iter()
        .any(|scheme| {
            text.get(..scheme.len())
                .is_some_and(|p| p.eq_ignore_ascii_case(scheme))
        })
        .then(|| text.to_string())
}
