//! libcurl-backed transport.
//!
//! All transfers are blocking libcurl `Easy` transfers; async entry points
//! move them onto the blocking pool. Streamed bodies cross a bounded tokio
//! channel so the reader applies backpressure to the transfer.

use super::{
    fire_listeners, CallbackCall, CallbackTransport, FetchTransport, HeaderCollector, HeaderMap,
    HttpRequest, HttpResponse, StreamClient, StreamingResponse,
};
use crate::error::{Result, SnagError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::cell::{Cell, RefCell};
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

/// Chunks buffered between the curl thread and the reader.
const STREAM_BUFFER: usize = 16;

#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
    /// Limit for whole-body calls; streamed downloads use the low-speed guard instead.
    timeout: Duration,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(120),
        }
    }
}

enum Event {
    Head { status: u32, headers: HeaderMap },
    Chunk(Bytes),
    Failed(SnagError),
}

impl CurlTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn easy_for(&self, request: &HttpRequest, streamed: bool) -> Result<curl::easy::Easy> {
        let mut easy = curl::easy::Easy::new();
        easy.url(&request.url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        if streamed {
            easy.low_speed_limit(1024)?;
            easy.low_speed_time(Duration::from_secs(60))?;
        } else {
            easy.timeout(self.timeout)?;
        }

        match request.method.as_str() {
            "GET" => {}
            "HEAD" => easy.nobody(true)?,
            "POST" => {
                easy.post(true)?;
                easy.post_fields_copy(request.body.as_deref().unwrap_or_default())?;
            }
            other => {
                easy.custom_request(other)?;
                if let Some(body) = &request.body {
                    easy.post_fields_copy(body)?;
                }
            }
        }

        if !request.headers.is_empty() {
            let mut list = curl::easy::List::new();
            for (k, v) in request.headers.iter() {
                list.append(&format!("{}: {}", k.trim(), v.trim()))?;
            }
            easy.http_headers(list)?;
        }
        Ok(easy)
    }

    /// Performs `request` on the current thread and returns the whole response.
    pub fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut easy = self.easy_for(request, false)?;
        let collector = RefCell::new(HeaderCollector::default());
        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.header_function(|line| {
                collector.borrow_mut().push_line(line);
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        let url = easy
            .effective_url()?
            .unwrap_or(request.url.as_str())
            .to_string();
        let headers = collector.into_inner().take();
        Ok(HttpResponse {
            url,
            status,
            headers,
            body: Bytes::from(body),
        })
    }

    /// Direct GET of `url` written straight into `out`. Returns bytes written.
    ///
    /// Non-2xx responses are an error; whatever was written to `out` is then
    /// the caller's to discard.
    pub fn fetch_to_writer<W: Write>(&self, url: &str, out: &mut W) -> Result<u64> {
        let mut easy = self.easy_for(&HttpRequest::get(url), true)?;
        let mut written = 0u64;
        let mut write_error: Option<std::io::Error> = None;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match out.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    tracing::warn!("direct save write failed: {}", e);
                    write_error = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            let performed = transfer.perform();
            drop(transfer);
            if let Some(e) = write_error.take() {
                return Err(SnagError::Save(e));
            }
            performed?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(SnagError::Status {
                url: url.to_string(),
                status: code,
            });
        }
        Ok(written)
    }
}

impl CallbackTransport for CurlTransport {
    fn send(&self, call: CallbackCall) -> Result<HttpResponse> {
        let (request, listeners) = call.into_parts();
        let response = self.perform(&request)?;
        fire_listeners(listeners, &response);
        Ok(response)
    }
}

#[async_trait]
impl FetchTransport for CurlTransport {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.perform(&request))
            .await
            .map_err(|e| SnagError::Transport(format!("fetch task failed: {}", e)))?
    }
}

#[async_trait]
impl StreamClient for CurlTransport {
    async fn get(&self, url: &str) -> Result<StreamingResponse> {
        let easy = self.easy_for(&HttpRequest::get(url), true)?;
        let (tx, mut rx) = mpsc::channel(STREAM_BUFFER);
        tokio::task::spawn_blocking(move || stream_transfer(easy, tx));

        match rx.recv().await {
            Some(Event::Head { status, headers }) => Ok(StreamingResponse {
                url: url.to_string(),
                status,
                headers,
                body: body_stream(rx),
            }),
            Some(Event::Failed(e)) => Err(e),
            Some(Event::Chunk(_)) => Err(SnagError::Transport(
                "body arrived before response head".to_string(),
            )),
            None => Err(SnagError::Transport(
                "transfer ended without a response".to_string(),
            )),
        }
    }
}

/// Runs one streamed transfer on a blocking thread.
///
/// Sends the response head before the first chunk (or after the transfer for
/// empty bodies). Stops early once the reader hangs up.
fn stream_transfer(mut easy: curl::easy::Easy, tx: mpsc::Sender<Event>) {
    let collector = RefCell::new(HeaderCollector::default());
    let head_sent = Cell::new(false);
    let received = Cell::new(0u64);
    let reader_gone = Cell::new(false);

    let send_head = |collector: &RefCell<HeaderCollector>| {
        let mut c = collector.borrow_mut();
        let status = c.status().unwrap_or(0);
        let headers = c.take();
        head_sent.set(true);
        if tx.blocking_send(Event::Head { status, headers }).is_err() {
            reader_gone.set(true);
        }
    };

    let result = (|| -> std::result::Result<(), curl::Error> {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            collector.borrow_mut().push_line(line);
            true
        })?;
        transfer.write_function(|data| {
            if !head_sent.get() {
                send_head(&collector);
            }
            if reader_gone.get() {
                return Ok(0);
            }
            received.set(received.get() + data.len() as u64);
            match tx.blocking_send(Event::Chunk(Bytes::copy_from_slice(data))) {
                Ok(()) => Ok(data.len()),
                Err(_) => {
                    reader_gone.set(true);
                    Ok(0) // abort transfer
                }
            }
        })?;
        transfer.perform()
    })();

    if reader_gone.get() {
        tracing::debug!("stream reader dropped; transfer stopped");
        return;
    }

    match result {
        Ok(()) => {
            if !head_sent.get() {
                send_head(&collector);
            }
        }
        Err(e) => {
            let err = if head_sent.get() {
                SnagError::Stream {
                    received: received.get(),
                    message: e.to_string(),
                }
            } else {
                SnagError::from(e)
            };
            let _ = tx.blocking_send(Event::Failed(err));
        }
    }
}

fn body_stream(rx: mpsc::Receiver<Event>) -> super::BodyStream {
    futures::stream::unfold(rx, |mut rx| async move {
        let item = match rx.recv().await? {
            Event::Chunk(bytes) => Ok(bytes),
            Event::Failed(e) => Err(e),
            Event::Head { .. } => Err(SnagError::Transport(
                "unexpected second response head".to_string(),
            )),
        };
        Some((item, rx))
    })
    .boxed()
}
