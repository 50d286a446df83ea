//! One page's pipeline: interception, candidate capture, affordance, download.
//!
//! A session exists only for pages some [`SiteProfile`] claims; everywhere
//! else the system stays inert.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::affordance::{Affordance, AffordanceHost, Renderer};
use crate::candidate::CandidateSlot;
use crate::config::SnagConfig;
use crate::dom::DomSnapshot;
use crate::downloader::{DownloadOutcome, Downloader};
use crate::error::SnagError;
use crate::inspect::{self, CandidateUrl};
use crate::intercept::{CallKind, InterceptHandler, InterceptorRegistry, Installed};
use crate::poll::{poll_until, CancelToken, PollOutcome};
use crate::report::{ErrorSink, Stage};
use crate::save::Saver;
use crate::site::{find_site, SiteProfile};
use crate::transport::{CallbackTransport, FetchTransport, HttpResponse, StreamClient};

/// The host page: its address and a snapshot of its DOM.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub dom: DomSnapshot,
}

impl Page {
    pub fn new(url: impl Into<String>, dom: DomSnapshot) -> Self {
        Self {
            url: url.into(),
            dom,
        }
    }
}

/// Runs the inspector on intercepted responses and keeps the latest candidate.
struct CandidateCollector {
    slot: Arc<CandidateSlot>,
    sink: Arc<dyn ErrorSink>,
}

impl InterceptHandler for CandidateCollector {
    fn on_intercepted(&self, kind: CallKind, url: &str, response: &HttpResponse) {
        let Some(candidate) = inspect::extract(&response.text()) else {
            tracing::debug!(kind = kind.as_str(), "no file URL in response from {}", url);
            return;
        };
        match absolute(url, candidate.as_str()) {
            Ok(found) => {
                tracing::info!(kind = kind.as_str(), "file URL found: {}", found);
                if let Some(previous) = self.slot.set(found) {
                    tracing::debug!("replaced earlier candidate {}", previous);
                }
            }
            Err(e) => self.sink.report(Stage::Inspect, &e),
        }
    }
}

/// Resolves a possibly relative candidate against the URL of the call it came from.
fn absolute(call_url: &str, candidate: &str) -> Result<CandidateUrl, SnagError> {
    if url::Url::parse(candidate).is_ok() {
        return Ok(CandidateUrl::new(candidate));
    }
    url::Url::parse(call_url)
        .and_then(|base| base.join(candidate))
        .map(|joined| CandidateUrl::new(joined.as_str()))
        .map_err(|e| SnagError::Parse(format!("unusable file URL {:?}: {}", candidate, e)))
}

pub struct Session {
    site: SiteProfile,
    page: Page,
    slot: Arc<CandidateSlot>,
    registry: InterceptorRegistry,
    downloader: Downloader,
    poll_interval: Duration,
    max_poll_attempts: u32,
    cancel: CancelToken,
    affordance: OnceLock<Arc<Affordance>>,
}

impl Session {
    /// Builds the session for `page`, or `None` when no site profile claims it.
    pub fn for_page(
        config: &SnagConfig,
        page: Page,
        client: Arc<dyn StreamClient>,
        saver: Arc<dyn Saver>,
        sink: Arc<dyn ErrorSink>,
    ) -> Option<Self> {
        let Some(site) = find_site(&config.sites, &page.url).cloned() else {
            tracing::debug!("{} matches no site profile; staying inert", page.url);
            return None;
        };
        tracing::info!(site = %site.name, "session started for {}", page.url);

        let slot = Arc::new(CandidateSlot::new());
        let collector = CandidateCollector {
            slot: Arc::clone(&slot),
            sink: Arc::clone(&sink),
        };
        let registry = InterceptorRegistry::new(site.rule(), Arc::new(collector));
        let downloader = Downloader::new(client, saver, config.naming_for(Some(&site)), sink)
            .with_rearm_delay(config.rearm_delay());

        Some(Self {
            site,
            page,
            slot,
            registry,
            downloader,
            poll_interval: config.poll_interval(),
            max_poll_attempts: config.max_poll_attempts,
            cancel: CancelToken::new(),
            affordance: OnceLock::new(),
        })
    }

    pub fn site(&self) -> &SiteProfile {
        &self.site
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Latest file URL seen, if any.
    pub fn candidate(&self) -> Option<CandidateUrl> {
        self.slot.get()
    }

    /// Wraps the page's primitives; see [`InterceptorRegistry::install`].
    pub fn install(
        &self,
        callback: Arc<dyn CallbackTransport>,
        fetch: Arc<dyn FetchTransport>,
    ) -> Installed {
        self.registry.install(callback, fetch)
    }

    /// Stops pending candidate waits and container polling.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn affordance(&self) -> Option<Arc<Affordance>> {
        self.affordance.get().cloned()
    }

    /// Waits for a candidate, then for the container, then inserts the
    /// affordance. Inserts at most once per session; later calls return the
    /// existing affordance.
    pub async fn place_affordance(
        &self,
        host: &dyn AffordanceHost,
        renderer: Arc<dyn Renderer>,
    ) -> Option<Arc<Affordance>> {
        if let Some(existing) = self.affordance.get() {
            tracing::debug!("affordance already present");
            return Some(Arc::clone(existing));
        }

        if self.cancel.is_cancelled() {
            return None;
        }
        let budget = self
            .poll_interval
            .checked_mul(self.max_poll_attempts)
            .unwrap_or(Duration::MAX);
        let url = tokio::select! {
            waited = tokio::time::timeout(budget, self.slot.wait()) => match waited {
                Ok(url) => url,
                Err(_) => {
                    tracing::warn!("no file URL intercepted within {:?}", budget);
                    return None;
                }
            },
            _ = self.cancel.cancelled() => {
                tracing::debug!("cancelled while waiting for a file URL");
                return None;
            }
        };

        let selector = self.site.container_selector.as_str();
        let outcome = poll_until(
            || host.container_present(selector),
            self.poll_interval,
            self.max_poll_attempts,
            &self.cancel,
        )
        .await;
        match outcome {
            PollOutcome::Found { attempts } => {
                tracing::debug!("container {} found after {} attempt(s)", selector, attempts)
            }
            PollOutcome::Exhausted => {
                tracing::warn!("container {} never appeared", selector);
                return None;
            }
            PollOutcome::Cancelled => return None,
        }

        let created = Arc::new(Affordance::new(url, renderer));
        if self.affordance.set(Arc::clone(&created)).is_err() {
            return self.affordance();
        }
        host.insert(selector, Arc::clone(&created));
        tracing::info!("download button inserted for {}", created.url());
        Some(created)
    }

    /// The click: downloads the inserted affordance's URL. `None` if no
    /// affordance has been placed.
    pub async fn activate(&self) -> Option<DownloadOutcome> {
        let affordance = self.affordance.get()?;
        Some(
            self.downloader
                .download(affordance.url().as_str(), &self.page.dom, affordance)
                .await,
        )
    }
}

#[cfg(test)]
mod tests;
