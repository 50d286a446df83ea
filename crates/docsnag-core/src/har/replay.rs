//! Transport that answers from a captured HAR instead of the network.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use std::path::Path;
use std::sync::Mutex;

use super::parse::{HarEntry, HarLog};
use crate::error::SnagError;
use crate::intercept::{CallKind, Installed};
use crate::transport::{
    fire_listeners, CallbackCall, CallbackTransport, FetchTransport, HeaderMap, HttpRequest,
    HttpResponse,
};

/// One call as the page issued it during capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub method: String,
    pub url: String,
    pub body: Option<Bytes>,
}

#[derive(Debug)]
struct Recorded {
    call: RecordedCall,
    response: HttpResponse,
}

/// Replays captured responses. Repeated calls to the same method and URL get
/// the captured responses in capture order; once exhausted the last one repeats.
#[derive(Debug)]
pub struct HarReplay {
    entries: Vec<Recorded>,
    served: Mutex<Vec<bool>>,
}

impl HarReplay {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read HAR file: {}", path.display()))?;
        Self::from_slice(&bytes).with_context(|| format!("parse HAR JSON: {}", path.display()))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let har: HarLog = serde_json::from_slice(bytes)?;
        let entries: Vec<Recorded> = har.log.entries.into_iter().map(recorded).collect();
        tracing::debug!("loaded {} recorded calls", entries.len());
        Ok(Self {
            served: Mutex::new(vec![false; entries.len()]),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Calls in capture order.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.entries.iter().map(|e| e.call.clone()).collect()
    }

    fn answer(&self, request: &HttpRequest) -> crate::error::Result<HttpResponse> {
        let mut served = self.served.lock().unwrap_or_else(|p| p.into_inner());
        let matching: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.call.method == request.method && e.call.url == request.url)
            .map(|(i, _)| i)
            .collect();
        let index = matching
            .iter()
            .copied()
            .find(|&i| !served[i])
            .or_else(|| matching.last().copied())
            .ok_or_else(|| {
                SnagError::Transport(format!(
                    "no recorded response for {} {}",
                    request.method, request.url
                ))
            })?;
        served[index] = true;
        Ok(self.entries[index].response.clone())
    }

    /// Issues every recorded call, in order, through `installed`, each on the
    /// primitive it was captured from. Returns how many calls completed.
    pub async fn drive(&self, installed: &Installed) -> usize {
        let mut completed = 0;
        for call in self.recorded_calls() {
            let result = match call.kind {
                CallKind::Callback => {
                    let mut open = installed.callback.open(&call.method, &call.url);
                    open.request_mut().body = call.body.clone();
                    installed.callback.send(open)
                }
                CallKind::Fetch => {
                    let mut request = HttpRequest::new(&call.method, &call.url);
                    request.body = call.body.clone();
                    installed.fetch.fetch(request).await
                }
            };
            match result {
                Ok(_) => completed += 1,
                Err(e) => tracing::warn!("replay of {} failed: {}", call.url, e),
            }
        }
        completed
    }
}

fn recorded(entry: HarEntry) -> Recorded {
    let kind = match entry.resource_type.as_deref() {
        Some(t) if t.eq_ignore_ascii_case("xhr") => CallKind::Callback,
        _ => CallKind::Fetch,
    };
    let method = entry.request.method.to_ascii_uppercase();
    let body = entry
        .request
        .post_data
        .and_then(|p| p.text)
        .map(Bytes::from);

    let content = match (entry.response.content.text, entry.response.content.encoding) {
        (Some(text), Some(enc)) if enc.eq_ignore_ascii_case("base64") => {
            match STANDARD.decode(text.trim()) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::debug!("bad base64 body for {}: {}", entry.request.url, e);
                    Vec::new()
                }
            }
        }
        (Some(_), Some(enc)) => {
            tracing::debug!(encoding = %enc, "unsupported body encoding for {}", entry.request.url);
            Vec::new()
        }
        (Some(text), None) => text.into_bytes(),
        (None, _) => Vec::new(),
    };
    let headers: HeaderMap = entry
        .response
        .headers
        .into_iter()
        .map(|h| (h.name, h.value))
        .collect();

    Recorded {
        response: HttpResponse {
            url: entry.request.url.clone(),
            status: entry.response.status,
            headers,
            body: Bytes::from(content),
        },
        call: RecordedCall {
            kind,
            method,
            url: entry.request.url,
            body,
        },
    }
}

impl CallbackTransport for HarReplay {
    fn send(&self, call: CallbackCall) -> crate::error::Result<HttpResponse> {
        let (request, listeners) = call.into_parts();
        let response = self.answer(&request)?;
        fire_listeners(listeners, &response);
        Ok(response)
    }
}

#[async_trait]
impl FetchTransport for HarReplay {
    async fn fetch(&self, request: HttpRequest) -> crate::error::Result<HttpResponse> {
        self.answer(&request)
    }
}
