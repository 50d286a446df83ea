//! Case-insensitive response headers and raw header-line parsing.

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header; earlier values with the same name are kept.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `Content-Length` as a byte count; absent or unparsable means unknown.
    pub fn content_length(&self) -> Option<u64> {
        self.get("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Accumulates header lines as libcurl delivers them.
///
/// With redirects followed, several header blocks arrive; each status line
/// starts a fresh block so only the final response's headers survive.
#[derive(Debug, Default)]
pub(crate) struct HeaderCollector {
    status: Option<u32>,
    headers: HeaderMap,
}

impl HeaderCollector {
    pub(crate) fn push_line(&mut self, raw: &[u8]) {
        let Ok(line) = std::str::from_utf8(raw) else {
            return;
        };
        let line = line.trim_end();
        if line.is_empty() {
            return;
        }
        if line.starts_with("HTTP/") {
            self.status = line
                .split_whitespace()
                .nth(1)
                .and_then(|code| code.parse::<u32>().ok());
            self.headers = HeaderMap::new();
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            self.headers.insert(name.trim(), value.trim());
        }
    }

    pub(crate) fn status(&self) -> Option<u32> {
        self.status
    }

    pub(crate) fn take(&mut self) -> HeaderMap {
        std::mem::take(&mut self.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut h = HeaderMap::new();
        h.insert("Content-Length", "12345");
        h.insert("Content-Disposition", "attachment; filename=\"report.pdf\"");
        assert_eq!(h.content_length(), Some(12345));
        assert!(h.get("CONTENT-DISPOSITION").unwrap().contains("report.pdf"));
        assert!(h.get("etag").is_none());
    }

    #[test]
    fn malformed_content_length_is_unknown() {
        let h: HeaderMap = [("Content-Length", "lots")].into_iter().collect();
        assert_eq!(h.content_length(), None);
    }

    #[test]
    fn collector_keeps_final_block_only() {
        let mut c = HeaderCollector::default();
        for line in [
            "HTTP/1.1 302 Found\r\n",
            "Location: https://cdn.example.com/f.pdf\r\n",
            "\r\n",
            "HTTP/2 200\r\n",
            "Content-Length: 10\r\n",
            "\r\n",
        ] {
            c.push_line(line.as_bytes());
        }
        assert_eq!(c.status(), Some(200));
        let h = c.take();
        assert_eq!(h.len(), 1);
        assert!(h.get("location").is_none());
        assert_eq!(h.content_length(), Some(10));
    }
}
