//! Error kinds for the interception and download pipeline.
//!
//! Every variant is caught at the downloader boundary (or logged by the
//! interceptor); none of them propagate to the host.

use thiserror::Error;

/// Coarse classification used by the error sink and by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Non-2xx status or transport failure.
    Network,
    /// Malformed JSON or unexpected schema.
    Parse,
    /// Body read failure mid-transfer.
    Stream,
    /// Every filename fallback came back empty.
    NameResolution,
    /// Local save failed.
    Save,
}

#[derive(Debug, Error)]
pub enum SnagError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u32 },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("body stream failed after {received} bytes: {message}")]
    Stream { received: u64, message: String },

    #[error("no filename candidate produced a usable name")]
    NameResolutionExhausted,

    #[error("save failed: {0}")]
    Save(#[from] std::io::Error),
}

impl SnagError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SnagError::Status { .. } | SnagError::Transport(_) => ErrorKind::Network,
            SnagError::Parse(_) => ErrorKind::Parse,
            SnagError::Stream { .. } => ErrorKind::Stream,
            SnagError::NameResolutionExhausted => ErrorKind::NameResolution,
            SnagError::Save(_) => ErrorKind::Save,
        }
    }
}

impl From<curl::Error> for SnagError {
    fn from(e: curl::Error) -> Self {
        SnagError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SnagError>;
