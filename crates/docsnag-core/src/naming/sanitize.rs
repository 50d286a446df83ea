//! Filename sanitization for titles scraped from the page.

/// Characters that are illegal in filenames on at least one common platform.
const ILLEGAL: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Removes illegal filename characters, collapses whitespace runs to a single
/// space and trims the result.
pub fn sanitize_title(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| (!ILLEGAL.contains(c) && !c.is_control()) || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True if `name` ends in something that looks like a file extension:
/// a final `.` followed by 1 to 5 ASCII alphanumerics.
pub fn has_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    }
}
