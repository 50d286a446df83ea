//! The download button as seen by the core.
//!
//! Rendering and insertion belong to the host ([`Renderer`], [`AffordanceHost`]).
//! The core drives state transitions; occupying the affordance is the only
//! guard against re-entrant downloads.

use crate::inspect::CandidateUrl;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ButtonState {
    Idle,
    /// Progress in percent, [0, 100].
    Downloading(f64),
    Error,
    Done,
}

/// Draws the affordance. Called on every state change.
pub trait Renderer: Send + Sync {
    fn render(&self, url: &CandidateUrl, state: ButtonState);
}

/// Renderer that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&self, _url: &CandidateUrl, _state: ButtonState) {}
}

/// Host side of the page: container discovery and button insertion.
pub trait AffordanceHost: Send + Sync {
    fn container_present(&self, selector: &str) -> bool;
    fn insert(&self, container_selector: &str, affordance: Arc<Affordance>);
}

pub struct Affordance {
    url: CandidateUrl,
    state: Mutex<ButtonState>,
    busy: AtomicBool,
    renderer: Arc<dyn Renderer>,
}

impl Affordance {
    pub fn new(url: CandidateUrl, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            url,
            state: Mutex::new(ButtonState::Idle),
            busy: AtomicBool::new(false),
            renderer,
        }
    }

    pub fn url(&self) -> &CandidateUrl {
        &self.url
    }

    pub fn state(&self) -> ButtonState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// False while a download holds the affordance.
    pub fn is_armed(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }

    /// Claims the affordance for a download. Returns false (and changes
    /// nothing) if it is already occupied.
    pub fn occupy(&self) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.set(ButtonState::Downloading(0.0));
        true
    }

    pub fn show_progress(&self, percent: f64) {
        self.set(ButtonState::Downloading(percent.clamp(0.0, 100.0)));
    }

    pub fn finish(&self) {
        self.set(ButtonState::Done);
    }

    pub fn fail(&self) {
        self.set(ButtonState::Error);
    }

    /// Back to idle and clickable.
    pub fn rearm(&self) {
        self.set(ButtonState::Idle);
        self.busy.store(false, Ordering::Release);
    }

    fn set(&self, state: ButtonState) {
        *self.state.lock().unwrap_or_else(|p| p.into_inner()) = state;
        self.renderer.render(&self.url, state);
    }
}

impl std::fmt::Debug for Affordance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Affordance")
            .field("url", &self.url)
            .field("state", &self.state())
            .field("armed", &self.is_armed())
            .finish()
    }
}
