//! Call interception for both network primitives.
//!
//! The registry owns the original primitives once installed and hands out
//! wrapped ones. A matching call still returns its original result, but the
//! response is routed to the [`InterceptHandler`] first. Installation is
//! guarded: a second `install` returns the existing wrappers, so nothing is
//! wrapped twice and each matching response is delivered exactly once.

mod wrap;

use crate::transport::{CallbackTransport, FetchTransport, HttpResponse};
use std::sync::{Arc, OnceLock};

use wrap::{InterceptedCallback, InterceptedFetch};

/// URL substrings identifying calls that carry the file URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterceptRule {
    patterns: Vec<String>,
}

impl InterceptRule {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    /// True if any pattern occurs in `url`. An empty rule matches nothing.
    pub fn matches(&self, url: &str) -> bool {
        self.patterns.iter().any(|p| url.contains(p.as_str()))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Which primitive carried an intercepted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Callback,
    Fetch,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Callback => "callback",
            CallKind::Fetch => "fetch",
        }
    }
}

/// Receives responses of matching calls. Must not block for long: it runs
/// before the call's result is handed back to its caller.
pub trait InterceptHandler: Send + Sync {
    fn on_intercepted(&self, kind: CallKind, url: &str, response: &HttpResponse);
}

/// Rule plus handler, shared by the registry and its wrappers.
pub(crate) struct Hook {
    rule: InterceptRule,
    handler: Arc<dyn InterceptHandler>,
}

impl Hook {
    pub(crate) fn matches(&self, url: &str) -> bool {
        self.rule.matches(url)
    }

    /// Hands a successful response to the handler; other statuses are skipped.
    pub(crate) fn deliver(&self, kind: CallKind, url: &str, response: &HttpResponse) {
        if !response.is_success() {
            tracing::debug!(kind = kind.as_str(), "intercepted {} returned HTTP {}; skipped", url, response.status);
            return;
        }
        self.handler.on_intercepted(kind, url, response);
    }
}

/// The wrapped primitives the host should issue its calls through.
#[derive(Clone)]
pub struct Installed {
    pub callback: Arc<dyn CallbackTransport>,
    pub fetch: Arc<dyn FetchTransport>,
}

impl std::fmt::Debug for Installed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Installed { .. }")
    }
}

/// Interceptor registry: Uninstalled until `install`, then Installed forever.
pub struct InterceptorRegistry {
    hook: Arc<Hook>,
    installed: OnceLock<Installed>,
}

impl InterceptorRegistry {
    pub fn new(rule: InterceptRule, handler: Arc<dyn InterceptHandler>) -> Self {
        Self {
            hook: Arc::new(Hook { rule, handler }),
            installed: OnceLock::new(),
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        self.hook.matches(url)
    }

    /// Routes a response to the handler as if it had been intercepted.
    pub fn on_intercepted(&self, kind: CallKind, url: &str, response: &HttpResponse) {
        self.hook.deliver(kind, url, response);
    }

    /// Wraps the original primitives. Only the first call has any effect;
    /// later calls log and return the wrappers from the first.
    pub fn install(
        &self,
        callback: Arc<dyn CallbackTransport>,
        fetch: Arc<dyn FetchTransport>,
    ) -> Installed {
        let mut fresh = false;
        let installed = self.installed.get_or_init(|| {
            fresh = true;
            Installed {
                callback: Arc::new(InterceptedCallback::new(callback, Arc::clone(&self.hook))),
                fetch: Arc::new(InterceptedFetch::new(fetch, Arc::clone(&self.hook))),
            }
        });
        if fresh {
            tracing::info!(
                patterns = ?self.hook.rule.patterns(),
                "interceptor installed on callback and fetch primitives"
            );
        } else {
            tracing::debug!("interceptor already installed; reinstall ignored");
        }
        installed.clone()
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get().is_some()
    }
}

impl std::fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("rule", &self.hook.rule)
            .field("installed", &self.is_installed())
            .finish()
    }
}
