//! `docsnag download` – streamed re-download of a known file URL.

use anyhow::Result;
use docsnag_core::affordance::Affordance;
use docsnag_core::config::SnagConfig;
use docsnag_core::downloader::Downloader;
use docsnag_core::inspect::CandidateUrl;
use docsnag_core::report::TracingSink;
use docsnag_core::save::DirSaver;
use docsnag_core::site::find_site;
use docsnag_core::transport::CurlTransport;
use std::path::PathBuf;
use std::sync::Arc;

use super::{finish, load_page, output_dir};
use crate::cli::console::ConsoleRenderer;

#[derive(Debug)]
pub struct DownloadArgs {
    pub url: String,
    pub page: Option<PathBuf>,
    pub page_url: Option<String>,
    pub out: Option<PathBuf>,
}

pub async fn run_download(cfg: &SnagConfig, args: DownloadArgs) -> Result<()> {
    let dom = load_page(args.page.as_deref())?;
    let site = args
        .page_url
        .as_deref()
        .and_then(|u| find_site(&cfg.sites, u));
    if let (Some(u), None) = (&args.page_url, site) {
        tracing::warn!("{} matches no site profile; page title selectors not used", u);
    }

    let downloader = Downloader::new(
        Arc::new(CurlTransport::new()),
        Arc::new(DirSaver::new(output_dir(args.out, cfg)?)),
        cfg.naming_for(site),
        Arc::new(TracingSink),
    )
    .with_rearm_delay(cfg.rearm_delay());
    let affordance = Affordance::new(
        CandidateUrl::new(args.url.as_str()),
        Arc::new(ConsoleRenderer::new()),
    );

    finish(downloader.download(&args.url, &dom, &affordance).await)
}
