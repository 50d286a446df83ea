//! Wrapped primitives handed out by the registry.

use super::{CallKind, Hook};
use crate::error::Result;
use crate::transport::{CallbackCall, CallbackTransport, FetchTransport, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::sync::Arc;

pub(super) struct InterceptedCallback {
    inner: Arc<dyn CallbackTransport>,
    hook: Arc<Hook>,
}

impl InterceptedCallback {
    pub(super) fn new(inner: Arc<dyn CallbackTransport>, hook: Arc<Hook>) -> Self {
        Self { inner, hook }
    }
}

impl CallbackTransport for InterceptedCallback {
    /// Registers the inspecting listener at open time, ahead of any listener
    /// the caller adds afterwards.
    fn open(&self, method: &str, url: &str) -> CallbackCall {
        let mut call = self.inner.open(method, url);
        if self.hook.matches(url) {
            tracing::info!("(callback) intercepted call to {}", url);
            let hook = Arc::clone(&self.hook);
            let url = url.to_string();
            call.on_load(move |response| hook.deliver(CallKind::Callback, &url, response));
        }
        call
    }

    fn send(&self, call: CallbackCall) -> Result<HttpResponse> {
        self.inner.send(call)
    }
}

pub(super) struct InterceptedFetch {
    inner: Arc<dyn FetchTransport>,
    hook: Arc<Hook>,
}

impl InterceptedFetch {
    pub(super) fn new(inner: Arc<dyn FetchTransport>, hook: Arc<Hook>) -> Self {
        Self { inner, hook }
    }
}

#[async_trait]
impl FetchTransport for InterceptedFetch {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        if !self.hook.matches(&request.url) {
            return self.inner.fetch(request).await;
        }
        let url = request.url.clone();
        tracing::info!("(fetch) intercepted request to {}", url);
        let response = self.inner.fetch(request).await?;
        self.hook.deliver(CallKind::Fetch, &url, &response);
        Ok(response)
    }
}
