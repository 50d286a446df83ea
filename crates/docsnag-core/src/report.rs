//! Error reporting seam: the core reports, the host decides where it goes.

use crate::error::SnagError;
use std::sync::Mutex;

/// Where in the pipeline a reported error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Inspect,
    Download,
    Fallback,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Inspect => "inspect",
            Stage::Download => "download",
            Stage::Fallback => "fallback",
        }
    }
}

/// Sink for non-fatal pipeline errors. Implementations must not panic.
pub trait ErrorSink: Send + Sync {
    fn report(&self, stage: Stage, error: &SnagError);
}

/// Default sink: structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, stage: Stage, error: &SnagError) {
        tracing::warn!(stage = stage.as_str(), kind = ?error.kind(), "{}", error);
    }
}

/// Sink that keeps reports in memory (for hosts that render them later, and tests).
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Mutex<Vec<(Stage, String)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(Stage, String)> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl ErrorSink for CollectingSink {
    fn report(&self, stage: Stage, error: &SnagError) {
        if let Ok(mut r) = self.reports.lock() {
            r.push((stage, error.to_string()));
        }
    }
}
