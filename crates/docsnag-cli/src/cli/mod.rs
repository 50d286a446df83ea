//! CLI for docsnag.

mod commands;
mod console;

use anyhow::Result;
use clap::{Parser, Subcommand};
use docsnag_core::config;
use std::path::PathBuf;

use commands::{run_download, run_inspect, run_replay, run_sites, DownloadArgs, ReplayArgs};

/// Top-level CLI for docsnag.
#[derive(Debug, Parser)]
#[command(name = "docsnag")]
#[command(about = "docsnag: catch a document's file URL from page calls and save it", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Look for a file URL in a response body (file, or stdin when omitted).
    Inspect {
        path: Option<PathBuf>,
    },

    /// Stream-download a file URL and save it under a credited name.
    Download {
        /// Direct HTTP/HTTPS URL of the file.
        url: String,

        /// Saved HTML of the document page, used for naming.
        #[arg(long, value_name = "FILE")]
        page: Option<PathBuf>,

        /// Address of the document page; selects the site profile's title selectors.
        #[arg(long, value_name = "URL")]
        page_url: Option<String>,

        /// Output directory (default: config `download_dir`, else current directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Replay a captured HAR through the interceptor and save the file it reveals.
    Replay {
        /// Path to the HAR file.
        har: PathBuf,

        /// Address of the document page the HAR was captured on.
        #[arg(long, value_name = "URL")]
        page_url: String,

        /// Saved HTML of the document page; the button container is looked up
        /// in it. Required unless `--no-download`.
        #[arg(long, value_name = "FILE", required_unless_present = "no_download")]
        page: Option<PathBuf>,

        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Only report the detected file URL.
        #[arg(long)]
        no_download: bool,
    },

    /// List configured site profiles.
    Sites,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Inspect { path } => run_inspect(path.as_deref()).await?,
            CliCommand::Download {
                url,
                page,
                page_url,
                out,
            } => {
                run_download(
                    &cfg,
                    DownloadArgs {
                        url,
                        page,
                        page_url,
                        out,
                    },
                )
                .await?
            }
            CliCommand::Replay {
                har,
                page_url,
                page,
                out,
                no_download,
            } => {
                run_replay(
                    &cfg,
                    ReplayArgs {
                        har,
                        page_url,
                        page,
                        out,
                        no_download,
                    },
                )
                .await?
            }
            CliCommand::Sites => run_sites(&cfg),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
