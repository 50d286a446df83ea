//! Filename resolution for re-downloaded files.
//!
//! Order: Content-Disposition header, page title selectors, URL path segment,
//! page `<title>`, fixed default. The credit marker is applied separately by
//! [`credit`] once the download has completed.

mod content_disposition;
mod path;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use path::filename_from_url_path;
pub use sanitize::{has_extension, sanitize_title};

use crate::dom::DomSnapshot;
use crate::error::SnagError;
use crate::transport::HeaderMap;

/// Used when even the configured default name sanitizes to nothing.
pub const DEFAULT_FILENAME: &str = "documento.pdf";
pub const DEFAULT_EXTENSION: &str = "pdf";
pub const DEFAULT_CREDIT_MARKER: &str = "_Github-Etoshy_";

/// Which fallback step produced a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    Header,
    Dom,
    Url,
    PageTitle,
    Default,
}

/// Inputs to name resolution that come from configuration and the site profile.
#[derive(Debug, Clone)]
pub struct NamingPolicy {
    pub title_selectors: Vec<String>,
    pub default_filename: String,
    /// Extension appended to page-derived names, without the dot.
    pub default_extension: String,
    pub credit_marker: String,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            title_selectors: Vec::new(),
            default_filename: DEFAULT_FILENAME.to_string(),
            default_extension: DEFAULT_EXTENSION.to_string(),
            credit_marker: DEFAULT_CREDIT_MARKER.to_string(),
        }
    }
}

impl NamingPolicy {
    /// The default name, guaranteed non-empty.
    pub fn default_name(&self) -> String {
        let name = sanitize_title(&self.default_filename);
        if name.is_empty() {
            tracing::debug!("{}; using {}", SnagError::NameResolutionExhausted, DEFAULT_FILENAME);
            DEFAULT_FILENAME.to_string()
        } else {
            name
        }
    }

    fn with_extension(&self, title: String) -> String {
        let ext = self.default_extension.trim_start_matches('.');
        if has_extension(&title) || ext.is_empty() {
            title
        } else {
            format!("{}.{}", title, ext)
        }
    }
}

/// A best-effort human-readable filename; immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilename {
    name: String,
    source: NameSource,
}

impl ResolvedFilename {
    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> NameSource {
        self.source
    }

    /// The name with the credit marker inserted before its extension.
    pub fn credited(&self, marker: &str) -> String {
        credit(&self.name, marker)
    }
}

impl std::fmt::Display for ResolvedFilename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resolves a filename for `url`; the first step yielding a non-empty name wins.
pub fn resolve(
    url: &str,
    headers: &HeaderMap,
    dom: &DomSnapshot,
    policy: &NamingPolicy,
) -> ResolvedFilename {
    let found = |name: String, source: NameSource| ResolvedFilename { name, source };

    if let Some(name) = headers
        .get("content-disposition")
        .and_then(parse_content_disposition_filename)
        .map(|n| sanitize_title(&n))
        .filter(|n| !n.is_empty())
    {
        tracing::debug!("name from Content-Disposition: {}", name);
        return found(name, NameSource::Header);
    }

    if let Some((selector, text)) = dom.first_text(&policy.title_selectors) {
        let title = sanitize_title(&text);
        if !title.is_empty() {
            tracing::debug!(selector = %selector, "name from page element: {}", title);
            return found(policy.with_extension(title), NameSource::Dom);
        }
    }

    if let Some(name) = filename_from_url_path(url)
        .map(|n| sanitize_title(&n))
        .filter(|n| n.contains('.'))
    {
        tracing::debug!("name from URL path: {}", name);
        return found(name, NameSource::Url);
    }

    if let Some(title) = dom.title().map(|t| sanitize_title(&t)).filter(|t| !t.is_empty()) {
        tracing::debug!("name from page title: {}", title);
        return found(policy.with_extension(title), NameSource::PageTitle);
    }

    found(policy.default_name(), NameSource::Default)
}

/// Inserts `marker` immediately before the final extension of `name`
/// (`a.pdf` → `a{marker}.pdf`); with no `.` the marker is appended as-is.
pub fn credit(name: &str, marker: &str) -> String {
    match name.rfind('.') {
        Some(dot) => format!("{}{}{}", &name[..dot], marker, &name[dot..]),
        None => format!("{}{}", name, marker),
    }
}
