//! Transfer progress for the re-download.
//!
//! With a known size the percentage is exact. Without one, progress grows by
//! a fixed amount per MiB received and is capped below 100 until the caller
//! signals completion, so an unknown-length stream never reports done early.

const MIB: f64 = 1024.0 * 1024.0;
/// Percentage points credited per MiB when the total size is unknown.
pub const UNKNOWN_SIZE_POINTS_PER_MIB: f64 = 10.0;
/// Ceiling for unknown-size progress before completion is signaled.
pub const UNKNOWN_SIZE_CAP: f64 = 95.0;

/// Percentage in [0, 100] for `received` bytes out of `total`.
///
/// A total of `Some(0)` is treated as unknown.
pub fn percentage(received: u64, total: Option<u64>) -> f64 {
    match total {
        Some(total) if total > 0 => (received as f64 / total as f64 * 100.0).clamp(0.0, 100.0),
        _ => (received as f64 / MIB * UNKNOWN_SIZE_POINTS_PER_MIB).min(UNKNOWN_SIZE_CAP),
    }
}

/// Byte counter for one in-flight download.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    received: u64,
    total: Option<u64>,
    last: f64,
    completed: bool,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            received: 0,
            total,
            last: 0.0,
            completed: false,
        }
    }

    /// Records a chunk and returns the updated percentage (never decreasing).
    pub fn on_chunk(&mut self, chunk_len: usize) -> f64 {
        self.received = self.received.saturating_add(chunk_len as u64);
        if !self.completed {
            self.last = self.last.max(percentage(self.received, self.total));
        }
        self.last
    }

    /// Marks the transfer finished; progress is 100 from here on.
    pub fn complete(&mut self) -> f64 {
        self.completed = true;
        self.last = 100.0;
        self.last
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn percent(&self) -> f64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_total_is_exact_ratio() {
        assert_eq!(percentage(0, Some(200)), 0.0);
        assert_eq!(percentage(50, Some(200)), 25.0);
        assert_eq!(percentage(200, Some(200)), 100.0);
    }

    #[test]
    fn known_total_clamped() {
        assert_eq!(percentage(300, Some(200)), 100.0);
    }

    #[test]
    fn unknown_total_ten_points_per_mib_capped() {
        assert_eq!(percentage(1024 * 1024, None), 10.0);
        assert_eq!(percentage(5 * 1024 * 1024, None), 50.0);
        assert_eq!(percentage(50 * 1024 * 1024, None), UNKNOWN_SIZE_CAP);
        assert_eq!(percentage(1024 * 1024, Some(0)), 10.0);
    }

    #[test]
    fn unknown_total_monotonic_and_below_100_until_complete() {
        let mut t = ProgressTracker::new(None);
        let mut prev = 0.0;
        for _ in 0..200 {
            let p = t.on_chunk(256 * 1024);
            assert!(p >= prev);
            assert!(p < 100.0);
            prev = p;
        }
        assert_eq!(t.complete(), 100.0);
        assert_eq!(t.on_chunk(10), 100.0);
    }

    #[test]
    fn tracker_reports_100_at_declared_size() {
        let mut t = ProgressTracker::new(Some(10));
        assert_eq!(t.on_chunk(4), 40.0);
        assert_eq!(t.on_chunk(6), 100.0);
        assert_eq!(t.received(), 10);
    }
}
