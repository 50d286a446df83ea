//! Site profiles: which pages the pipeline activates on and how it reads them.

use crate::intercept::InterceptRule;
use serde::{Deserialize, Serialize};

/// Per-site knowledge: page prefixes, call patterns and DOM selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub name: String,
    /// Page addresses the pipeline is active on (prefix match).
    pub page_prefixes: Vec<String>,
    /// Substrings identifying calls whose response carries the file URL.
    pub intercept_patterns: Vec<String>,
    /// Ordered selectors for the document title.
    pub title_selectors: Vec<String>,
    /// Container the download button is inserted into.
    pub container_selector: String,
}

impl SiteProfile {
    pub fn matches_page(&self, page_url: &str) -> bool {
        self.page_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && page_url.starts_with(prefix.as_str()))
    }

    pub fn rule(&self) -> InterceptRule {
        InterceptRule::new(self.intercept_patterns.iter().cloned())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// docer.ar and docubra.com share one frontend.
pub fn docubra() -> SiteProfile {
    SiteProfile {
        name: "docubra".to_string(),
        page_prefixes: strings(&["https://docer.ar/doc/", "https://docubra.com/doc/"]),
        intercept_patterns: strings(&["/start/show"]),
        title_selectors: strings(&[
            "h1.document-title",
            "h1",
            ".document-name",
            ".doc-title",
            ".file-name",
            "[data-document-title]",
            ".title",
        ]),
        container_selector: "#action-panel-details .dwn-contain".to_string(),
    }
}

pub fn doceru() -> SiteProfile {
    SiteProfile {
        name: "doceru".to_string(),
        page_prefixes: strings(&["https://doceru.com/doc/"]),
        intercept_patterns: strings(&[
            "/download",
            "/start/show",
            "/get_file",
            "/file_download",
            "/pdf_download",
        ]),
        title_selectors: strings(&[
            "h1.document-title",
            "h1",
            ".doc-title",
            ".document-name",
            ".file-name",
            "[data-document-title]",
            ".title",
            ".doc-info h1",
            ".document-header h1",
        ]),
        container_selector: ".dwn-contain".to_string(),
    }
}

pub fn builtin_sites() -> Vec<SiteProfile> {
    vec![docubra(), doceru()]
}

/// First profile whose prefixes match `page_url`; `None` means stay inert.
pub fn find_site<'a>(sites: &'a [SiteProfile], page_url: &str) -> Option<&'a SiteProfile> {
    sites.iter().find(|s| s.matches_page(page_url))
}
