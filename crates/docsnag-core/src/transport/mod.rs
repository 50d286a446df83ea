//! Network primitives the host issues calls through.
//!
//! Two primitives mirror what a page has at hand: a callback-registration
//! style request ([`CallbackTransport`]) and a promise style request
//! ([`FetchTransport`]). [`StreamClient`] is the streamed GET used by the
//! downloader. [`CurlTransport`] implements all three over libcurl.

mod headers;
mod live;

pub use headers::HeaderMap;
pub(crate) use headers::HeaderCollector;
pub use live::CurlTransport;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::borrow::Cow;

/// An outgoing call.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new("GET", url)
    }
}

/// A completed response with its whole body. Cloning is cheap (the body is shared).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects.
    pub url: String,
    pub status: u32,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text (invalid UTF-8 replaced).
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Listener fired when a callback-style call completes.
pub type LoadListener = Box<dyn FnOnce(&HttpResponse) + Send>;

/// An opened callback-style call: the request plus its load listeners.
pub struct CallbackCall {
    request: HttpRequest,
    listeners: Vec<LoadListener>,
}

impl CallbackCall {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            listeners: Vec::new(),
        }
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Mutable access for setting headers or a body between open and send.
    pub fn request_mut(&mut self) -> &mut HttpRequest {
        &mut self.request
    }

    /// Registers a load listener; listeners fire in registration order.
    pub fn on_load(&mut self, listener: impl FnOnce(&HttpResponse) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Splits the call so a transport can perform the request, then fire listeners.
    pub fn into_parts(self) -> (HttpRequest, Vec<LoadListener>) {
        (self.request, self.listeners)
    }
}

impl std::fmt::Debug for CallbackCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackCall")
            .field("request", &self.request)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Fires `listeners` in order with `response`.
pub fn fire_listeners(listeners: Vec<LoadListener>, response: &HttpResponse) {
    for listener in listeners {
        listener(response);
    }
}

/// Callback-registration style primitive.
///
/// `send` performs the call on the current thread and fires every load
/// listener (any HTTP status) before returning the response. Transport errors
/// are returned and no listener fires.
pub trait CallbackTransport: Send + Sync {
    fn open(&self, method: &str, url: &str) -> CallbackCall {
        CallbackCall::new(HttpRequest::new(method, url))
    }

    fn send(&self, call: CallbackCall) -> Result<HttpResponse>;
}

/// Promise style primitive.
#[async_trait]
pub trait FetchTransport: Send + Sync {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse>;
}

pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// A response whose body is read incrementally.
pub struct StreamingResponse {
    pub url: String,
    pub status: u32,
    pub headers: HeaderMap,
    pub body: BodyStream,
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("url", &self.url)
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Streamed GET used for the re-download.
#[async_trait]
pub trait StreamClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<StreamingResponse>;
}
