//! Streaming re-download of a candidate URL with progress and a credited name.
//!
//! One call to [`Downloader::download`] runs the whole sequence for one click:
//! occupy the affordance, GET the file as a stream, resolve the name, assemble
//! the chunks, save, and re-arm. Every error ends here: it is reported once,
//! followed by a single direct-link save of the raw URL. There are no retries.

use crate::affordance::Affordance;
use crate::dom::DomSnapshot;
use crate::error::{Result, SnagError};
use crate::naming::{self, NamingPolicy};
use crate::progress::ProgressTracker;
use crate::report::{ErrorSink, Stage};
use crate::save::Saver;
use crate::transport::StreamClient;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on the up-front buffer reservation taken from Content-Length.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

#[derive(Debug)]
pub enum DownloadOutcome {
    /// Streamed, assembled and saved.
    Success { path: PathBuf, filename: String },
    /// The streamed download failed. `fallback` is where the direct-link save
    /// landed, if it worked.
    Failure {
        error: SnagError,
        fallback: Option<PathBuf>,
    },
    /// The affordance was already occupied; nothing was done.
    Busy,
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }
}

pub struct Downloader {
    client: Arc<dyn StreamClient>,
    saver: Arc<dyn Saver>,
    naming: NamingPolicy,
    rearm_delay: Duration,
    sink: Arc<dyn ErrorSink>,
}

impl Downloader {
    pub fn new(
        client: Arc<dyn StreamClient>,
        saver: Arc<dyn Saver>,
        naming: NamingPolicy,
        sink: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            client,
            saver,
            naming,
            rearm_delay: Duration::from_millis(1000),
            sink,
        }
    }

    /// How long the finished state stays up before the affordance re-arms.
    pub fn with_rearm_delay(mut self, delay: Duration) -> Self {
        self.rearm_delay = delay;
        self
    }

    pub fn naming(&self) -> &NamingPolicy {
        &self.naming
    }

    pub async fn download(
        &self,
        url: &str,
        dom: &DomSnapshot,
        affordance: &Affordance,
    ) -> DownloadOutcome {
        if !affordance.occupy() {
            tracing::debug!("download of {} ignored: already in progress", url);
            return DownloadOutcome::Busy;
        }
        tracing::info!("downloading {}", url);

        match self.stream_and_save(url, dom, affordance).await {
            Ok((path, filename)) => {
                affordance.finish();
                tokio::time::sleep(self.rearm_delay).await;
                affordance.rearm();
                DownloadOutcome::Success { path, filename }
            }
            Err(error) => {
                self.sink.report(Stage::Download, &error);
                affordance.fail();
                let fallback = self.save_direct(url).await;
                affordance.rearm();
                DownloadOutcome::Failure { error, fallback }
            }
        }
    }

    async fn stream_and_save(
        &self,
        url: &str,
        dom: &DomSnapshot,
        affordance: &Affordance,
    ) -> Result<(PathBuf, String)> {
        let response = self.client.get(url).await?;
        if !(200..300).contains(&response.status) {
            return Err(SnagError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        let total = response.headers.content_length();
        let resolved = naming::resolve(url, &response.headers, dom, &self.naming);
        tracing::debug!(source = ?resolved.source(), total = ?total, "resolved name {}", resolved);

        let mut tracker = ProgressTracker::new(total);
        let mut blob = Vec::with_capacity(total.unwrap_or(0).min(MAX_PREALLOC) as usize);
        let mut body = response.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| match e {
                SnagError::Stream { .. } => e,
                other => SnagError::Stream {
                    received: tracker.received(),
                    message: other.to_string(),
                },
            })?;
            affordance.show_progress(tracker.on_chunk(chunk.len()));
            blob.extend_from_slice(&chunk);
        }
        affordance.show_progress(tracker.complete());

        let filename = resolved.credited(&self.naming.credit_marker);
        let saver = Arc::clone(&self.saver);
        let name = filename.clone();
        let path = blocking(move || saver.save_blob(&blob, &name)).await?;
        Ok((path, filename))
    }

    /// Single direct-link save of the raw URL under the credited default name.
    async fn save_direct(&self, url: &str) -> Option<PathBuf> {
        let filename = naming::credit(&self.naming.default_name(), &self.naming.credit_marker);
        tracing::info!("falling back to direct save of {} as {}", url, filename);
        let saver = Arc::clone(&self.saver);
        let url = url.to_string();
        match blocking(move || saver.save_link(&url, &filename)).await {
            Ok(path) => Some(path),
            Err(e) => {
                self.sink.report(Stage::Fallback, &e);
                None
            }
        }
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SnagError::Transport(format!("save task failed: {}", e)))?
}
