//! Local save of the downloaded file.
//!
//! Bytes are written to a transient `.part` file that is renamed into place
//! on commit and removed on drop otherwise, so no partial file outlives a
//! failed save.

use crate::error::{Result, SnagError};
use crate::transport::CurlTransport;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before the final rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Saves a finished download locally. Implementations may block.
pub trait Saver: Send + Sync {
    /// Saves `blob` under `filename`; returns the final path.
    fn save_blob(&self, blob: &[u8], filename: &str) -> Result<PathBuf>;

    /// Direct-link save: lets the raw `url` be fetched straight to `filename`.
    fn save_link(&self, url: &str, filename: &str) -> Result<PathBuf>;
}

/// Path for the temp file: appends `.part` to the final path (`a.pdf` → `a.pdf.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// First free path for `filename` in `dir`: `a.pdf`, then `a (1).pdf`, `a (2).pdf`, …
pub fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match filename.rfind('.') {
        Some(dot) if dot > 0 => (&filename[..dot], &filename[dot..]),
        _ => (filename, ""),
    };
    (1u32..)
        .map(|n| dir.join(format!("{} ({}){}", stem, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// A file being saved. Released (deleted) on drop unless committed.
pub struct StagedFile {
    file: File,
    temp_path: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Create the temp file at `temp_path`, truncating any leftover.
    pub fn create(temp_path: &Path) -> Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)?;
        Ok(Self {
            file,
            temp_path: temp_path.to_path_buf(),
            committed: false,
        })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn writer(&mut self) -> &mut File {
        &mut self.file
    }

    /// Sync and rename the temp file to `final_path`.
    pub fn commit(mut self, final_path: &Path) -> Result<()> {
        self.file.sync_all()?;
        std::fs::rename(&self.temp_path, final_path)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                tracing::debug!(path = %self.temp_path.display(), "could not release temp file: {}", e);
            }
        }
    }
}

/// Saves into a directory; the direct-link fallback fetches with libcurl.
#[derive(Debug, Clone)]
pub struct DirSaver {
    dir: PathBuf,
    link: CurlTransport,
}

impl DirSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            link: CurlTransport::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn target(&self, filename: &str) -> Result<PathBuf> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or(SnagError::NameResolutionExhausted)?;
        std::fs::create_dir_all(&self.dir)?;
        Ok(unique_path(&self.dir, name))
    }
}

impl Saver for DirSaver {
    fn save_blob(&self, blob: &[u8], filename: &str) -> Result<PathBuf> {
        let final_path = self.target(filename)?;
        let mut staged = StagedFile::create(&temp_path(&final_path))?;
        staged.writer().write_all(blob)?;
        staged.commit(&final_path)?;
        tracing::info!("saved {} bytes to {}", blob.len(), final_path.display());
        Ok(final_path)
    }

    fn save_link(&self, url: &str, filename: &str) -> Result<PathBuf> {
        let final_path = self.target(filename)?;
        let mut staged = StagedFile::create(&temp_path(&final_path))?;
        let written = self.link.fetch_to_writer(url, staged.writer())?;
        staged.commit(&final_path)?;
        tracing::info!("direct save wrote {} bytes to {}", written, final_path.display());
        Ok(final_path)
    }
}
