//! Read-only snapshot of the host page's DOM.
//!
//! Keeps the raw HTML and parses it on each query, so the snapshot stays
//! `Send + Sync` and can be carried across await points.

use scraper::{Html, Selector};

#[derive(Debug, Clone, Default)]
pub struct DomSnapshot {
    html: String,
}

impl DomSnapshot {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Snapshot of a page with no content; every query misses.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Text of the first element matched by the first selector (in order)
    /// whose first match has non-blank text. Returns `(selector, text)`.
    ///
    /// Like `querySelector`, only the first element per selector is considered.
    /// Invalid selectors are skipped.
    pub fn first_text<S: AsRef<str>>(&self, selectors: &[S]) -> Option<(String, String)> {
        let doc = Html::parse_document(&self.html);
        selectors.iter().find_map(|selector| {
            let text = first_element_text(&doc, selector.as_ref())?;
            Some((selector.as_ref().to_string(), text))
        })
    }

    /// The document `<title>` text, if non-blank.
    pub fn title(&self) -> Option<String> {
        let doc = Html::parse_document(&self.html);
        first_element_text(&doc, "title")
    }

    /// True if `selector` matches at least one element.
    pub fn contains(&self, selector: &str) -> bool {
        let Ok(sel) = Selector::parse(selector) else {
            return false;
        };
        let doc = Html::parse_document(&self.html);
        let found = doc.select(&sel).next().is_some();
        found
    }
}

fn first_element_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let el = doc.select(&sel).next()?;
    let text = el.text().collect::<Vec<_>>().join("");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
