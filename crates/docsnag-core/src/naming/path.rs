//! Filename extraction from URL path.

use super::content_disposition::percent_decode;

/// Extracts the trailing path segment of `url`, percent-decoded, as a filename.
///
/// Returns `None` if the URL cannot be parsed, the path ends in `/`, or the
/// segment has no `.` (no extension marker).
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().rsplit('/').next()?;
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    let decoded = percent_decode(segment);
    if !decoded.contains('.') {
        return None;
    }
    Some(decoded)
}
