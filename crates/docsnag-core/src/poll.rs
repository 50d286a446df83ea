//! Bounded, cancellable existence polling (e.g. waiting for the button container).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct CancelState {
    flag: AtomicBool,
    notify: Notify,
}

/// Shared cancellation flag; clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<CancelState>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag and wakes every task parked in [`CancelToken::cancelled`].
    pub fn cancel(&self) {
        self.0.flag.store(true, Ordering::Release);
        self.0.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.flag.load(Ordering::Acquire)
    }

    /// Resolves once the token is cancelled (immediately if it already is).
    pub async fn cancelled(&self) {
        loop {
            let notified = self.0.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Check succeeded on this (1-based) attempt.
    Found { attempts: u32 },
    Exhausted,
    Cancelled,
}

/// Calls `check` up to `max_attempts` times, sleeping `interval` between
/// attempts, until it returns true or `cancel` is set.
pub async fn poll_until<F>(
    mut check: F,
    interval: Duration,
    max_attempts: u32,
    cancel: &CancelToken,
) -> PollOutcome
where
    F: FnMut() -> bool,
{
    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }
        if check() {
            return PollOutcome::Found { attempts: attempt };
        }
        if attempt < max_attempts {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
            }
        }
    }
    if cancel.is_cancelled() {
        PollOutcome::Cancelled
    } else {
        PollOutcome::Exhausted
    }
}
