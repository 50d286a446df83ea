//! `docsnag replay` – re-issue a captured page's calls through the interceptor.

use anyhow::{Context, Result};
use docsnag_core::config::SnagConfig;
use docsnag_core::har::HarReplay;
use docsnag_core::report::TracingSink;
use docsnag_core::save::DirSaver;
use docsnag_core::session::{Page, Session};
use docsnag_core::transport::CurlTransport;
use std::path::PathBuf;
use std::sync::Arc;

use super::{finish, load_page, output_dir};
use crate::cli::console::{ConsoleRenderer, PageHost};

#[derive(Debug)]
pub struct ReplayArgs {
    pub har: PathBuf,
    pub page_url: String,
    pub page: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub no_download: bool,
}

pub async fn run_replay(cfg: &SnagConfig, args: ReplayArgs) -> Result<()> {
    let replay = Arc::new(HarReplay::load(&args.har)?);
    let dom = load_page(args.page.as_deref())?;
    let page = Page::new(args.page_url.as_str(), dom.clone());

    let session = Session::for_page(
        cfg,
        page,
        Arc::new(CurlTransport::new()),
        Arc::new(DirSaver::new(output_dir(args.out, cfg)?)),
        Arc::new(TracingSink),
    )
    .with_context(|| format!("{} matches no site profile", args.page_url))?;

    let installed = session.install(replay.clone(), replay.clone());
    let completed = replay.drive(&installed).await;
    tracing::info!("replayed {} of {} calls", completed, replay.len());

    let Some(candidate) = session.candidate() else {
        println!("no file URL found in {} replayed calls", completed);
        return Ok(());
    };
    if args.no_download {
        println!("{}", candidate);
        return Ok(());
    }

    let host = PageHost::new(dom);
    session
        .place_affordance(&host, Arc::new(ConsoleRenderer::new()))
        .await
        .with_context(|| {
            format!(
                "container {} not found on the page",
                session.site().container_selector
            )
        })?;
    let outcome = session
        .activate()
        .await
        .context("no download button placed")?;
    finish(outcome)
}
