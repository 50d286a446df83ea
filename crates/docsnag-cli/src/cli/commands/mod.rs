//! CLI command handlers, one per file.

mod download;
mod inspect;
mod replay;
mod sites;

pub use download::{run_download, DownloadArgs};
pub use inspect::run_inspect;
pub use replay::{run_replay, ReplayArgs};
pub use sites::run_sites;

use anyhow::{Context, Result};
use docsnag_core::config::SnagConfig;
use docsnag_core::dom::DomSnapshot;
use docsnag_core::downloader::DownloadOutcome;
use std::path::{Path, PathBuf};

/// DOM snapshot from a saved page, or an empty one.
fn load_page(path: Option<&Path>) -> Result<DomSnapshot> {
    match path {
        Some(p) => {
            let html = std::fs::read_to_string(p)
                .with_context(|| format!("read page HTML: {}", p.display()))?;
            Ok(DomSnapshot::new(html))
        }
        None => Ok(DomSnapshot::empty()),
    }
}

fn output_dir(out: Option<PathBuf>, cfg: &SnagConfig) -> Result<PathBuf> {
    match out.or_else(|| cfg.download_dir.clone()) {
        Some(dir) => Ok(dir),
        None => Ok(std::env::current_dir()?),
    }
}

/// Prints where the file went; an error only when nothing was saved.
fn finish(outcome: DownloadOutcome) -> Result<()> {
    match outcome {
        DownloadOutcome::Success { path, .. } => {
            println!("{}", path.display());
            Ok(())
        }
        DownloadOutcome::Failure {
            fallback: Some(path),
            error,
        } => {
            eprintln!("streamed download failed ({}); saved via direct link", error);
            println!("{}", path.display());
            Ok(())
        }
        DownloadOutcome::Failure {
            fallback: None,
            error,
        } => Err(anyhow::Error::new(error).context("download failed and direct link save failed")),
        DownloadOutcome::Busy => anyhow::bail!("a download is already in progress"),
    }
}
