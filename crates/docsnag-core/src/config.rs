//! Configuration loaded from `~/.config/docsnag/config.toml`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::naming::{NamingPolicy, DEFAULT_CREDIT_MARKER, DEFAULT_EXTENSION, DEFAULT_FILENAME};
use crate::site::{builtin_sites, SiteProfile};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnagConfig {
    /// Inserted before the extension of every saved file.
    #[serde(default = "default_credit_marker")]
    pub credit_marker: String,
    /// Name used when nothing better is found, and for the direct-link fallback.
    #[serde(default = "default_filename")]
    pub default_filename: String,
    /// Extension (without dot) appended to names taken from the page.
    #[serde(default = "default_extension")]
    pub default_extension: String,
    /// How long the finished state stays visible before the button re-arms.
    #[serde(default = "default_rearm_delay_ms")]
    pub rearm_delay_ms: u64,
    /// Interval between container lookups.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Container lookups before giving up.
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    /// Where files are saved; current directory if unset.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    #[serde(default = "builtin_sites")]
    pub sites: Vec<SiteProfile>,
}

fn default_credit_marker() -> String {
    DEFAULT_CREDIT_MARKER.to_string()
}

fn default_filename() -> String {
    DEFAULT_FILENAME.to_string()
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn default_rearm_delay_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_poll_attempts() -> u32 {
    120
}

impl Default for SnagConfig {
    fn default() -> Self {
        Self {
            credit_marker: default_credit_marker(),
            default_filename: default_filename(),
            default_extension: default_extension(),
            rearm_delay_ms: default_rearm_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            download_dir: None,
            sites: builtin_sites(),
        }
    }
}

impl SnagConfig {
    pub fn rearm_delay(&self) -> Duration {
        Duration::from_millis(self.rearm_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Naming policy for `site` (title selectors come from the profile).
    pub fn naming_for(&self, site: Option<&SiteProfile>) -> NamingPolicy {
        NamingPolicy {
            title_selectors: site.map(|s| s.title_selectors.clone()).unwrap_or_default(),
            default_filename: self.default_filename.clone(),
            default_extension: self.default_extension.clone(),
            credit_marker: self.credit_marker.clone(),
        }
    }

    pub fn site(&self, name: &str) -> Option<&SiteProfile> {
        self.sites.iter().find(|s| s.name == name)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("docsnag")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SnagConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SnagConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: SnagConfig = toml::from_str(&data)?;
    Ok(cfg)
}
