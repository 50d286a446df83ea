//! Single-slot, last-write-wins cell for the most recent candidate URL.
//!
//! Not a queue: a newer candidate replaces an unconsumed older one.

use crate::inspect::CandidateUrl;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct CandidateSlot {
    current: Mutex<Option<CandidateUrl>>,
    changed: Notify,
}

impl CandidateSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<CandidateUrl>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores `url`, returning the value it replaced.
    pub fn set(&self, url: CandidateUrl) -> Option<CandidateUrl> {
        let previous = self.lock().replace(url);
        self.changed.notify_waiters();
        previous
    }

    pub fn get(&self) -> Option<CandidateUrl> {
        self.lock().clone()
    }

    /// Removes and returns the current value.
    pub fn take(&self) -> Option<CandidateUrl> {
        self.lock().take()
    }

    /// Waits until the slot holds a value and returns it (without consuming it).
    pub async fn wait(&self) -> CandidateUrl {
        loop {
            let notified = self.changed.notified();
            if let Some(url) = self.get() {
                return url;
            }
            notified.await;
        }
    }
}
