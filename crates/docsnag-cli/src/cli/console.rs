//! Terminal stand-ins for the page: the button renders as a status line.

use docsnag_core::affordance::{Affordance, AffordanceHost, ButtonState, Renderer};
use docsnag_core::dom::DomSnapshot;
use docsnag_core::inspect::CandidateUrl;
use std::io::Write;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Draws button states on stderr; progress redraws only when the whole percent changes.
#[derive(Debug)]
pub struct ConsoleRenderer {
    last_percent: AtomicI64,
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self {
            last_percent: AtomicI64::new(-1),
        }
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&self, _url: &CandidateUrl, state: ButtonState) {
        let mut err = std::io::stderr().lock();
        match state {
            ButtonState::Downloading(p) => {
                let whole = p.floor() as i64;
                if self.last_percent.swap(whole, Ordering::Relaxed) != whole {
                    let _ = write!(err, "\rdownloading... {:>3}%", whole);
                    let _ = err.flush();
                }
            }
            ButtonState::Done => {
                let _ = writeln!(err, "\rdownloaded          ");
            }
            ButtonState::Error => {
                let _ = writeln!(err, "\rdownload failed     ");
            }
            ButtonState::Idle => self.last_percent.store(-1, Ordering::Relaxed),
        }
    }
}

/// Page host backed by a DOM snapshot.
#[derive(Debug)]
pub struct PageHost {
    dom: DomSnapshot,
}

impl PageHost {
    pub fn new(dom: DomSnapshot) -> Self {
        Self { dom }
    }
}

impl AffordanceHost for PageHost {
    fn container_present(&self, selector: &str) -> bool {
        self.dom.contains(selector)
    }

    fn insert(&self, container_selector: &str, affordance: Arc<Affordance>) {
        tracing::info!("button placed in {}", container_selector);
        eprintln!("download available: {}", affordance.url());
    }
}
