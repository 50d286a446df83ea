use super::*;
use crate::affordance::NullRenderer;
use crate::error::Result;
use crate::report::CollectingSink;
use crate::transport::{fire_listeners, CallbackCall, HeaderMap, HttpRequest, StreamingResponse};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

const PAGE_URL: &str = "https://docubra.com/doc/42/informe-anual";
const CALL_URL: &str = "https://docubra.com/start/show?id=42";

/// Page-side primitives: every call answers with `body`.
struct Site {
    body: Mutex<String>,
}

impl Site {
    fn new(body: &str) -> Arc<Self> {
        Arc::new(Self {
            body: Mutex::new(body.to_string()),
        })
    }

    fn respond(&self, url: &str) -> HttpResponse {
        HttpResponse {
            url: url.to_string(),
            status: 200,
            headers: HeaderMap::new(),
            body: Bytes::from(self.body.lock().unwrap().clone()),
        }
    }
}

impl CallbackTransport for Site {
    fn send(&self, call: CallbackCall) -> Result<HttpResponse> {
        let (request, listeners) = call.into_parts();
        let response = self.respond(&request.url);
        fire_listeners(listeners, &response);
        Ok(response)
    }
}

#[async_trait]
impl FetchTransport for Site {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        Ok(self.respond(&request.url))
    }
}

/// File server: ten bytes with a declared length of ten.
struct TenBytes {
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl StreamClient for TenBytes {
    async fn get(&self, url: &str) -> Result<StreamingResponse> {
        self.requested.lock().unwrap().push(url.to_string());
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"0123")),
            Ok(Bytes::from_static(b"456789")),
        ];
        Ok(StreamingResponse {
            url: url.to_string(),
            status: 200,
            headers: [("Content-Length", "10")].into_iter().collect(),
            body: futures::stream::iter(chunks).boxed(),
        })
    }
}

#[derive(Default)]
struct MemorySaver {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl Saver for MemorySaver {
    fn save_blob(&self, blob: &[u8], filename: &str) -> Result<PathBuf> {
        self.saved.lock().unwrap().push((filename.to_string(), blob.to_vec()));
        Ok(PathBuf::from(filename))
    }

    fn save_link(&self, _url: &str, filename: &str) -> Result<PathBuf> {
        Ok(PathBuf::from(filename))
    }
}

struct Host {
    present: AtomicBool,
    inserted: AtomicUsize,
}

impl Host {
    fn new(present: bool) -> Self {
        Self {
            present: AtomicBool::new(present),
            inserted: AtomicUsize::new(0),
        }
    }
}

impl AffordanceHost for Host {
    fn container_present(&self, _selector: &str) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    fn insert(&self, _container_selector: &str, _affordance: Arc<Affordance>) {
        self.inserted.fetch_add(1, Ordering::SeqCst);
    }
}

struct Rig {
    session: Session,
    client: Arc<TenBytes>,
    saver: Arc<MemorySaver>,
    sink: Arc<CollectingSink>,
}

fn config() -> SnagConfig {
    SnagConfig {
        credit_marker: "_CREDIT_".into(),
        rearm_delay_ms: 1,
        poll_interval_ms: 1,
        max_poll_attempts: 5,
        ..SnagConfig::default()
    }
}

fn rig(page_url: &str) -> Option<Rig> {
    rig_with(&config(), page_url)
}

fn rig_with(cfg: &SnagConfig, page_url: &str) -> Option<Rig> {
    let client = Arc::new(TenBytes {
        requested: Mutex::new(Vec::new()),
    });
    let saver = Arc::new(MemorySaver::default());
    let sink = Arc::new(CollectingSink::new());
    let page = Page::new(
        page_url,
        DomSnapshot::new("<html><body><h1 class=\"document-title\">Informe Anual</h1><div id=\"action-panel-details\"><div class=\"dwn-contain\"></div></div></body></html>"),
    );
    let session = Session::for_page(cfg, page, client.clone(), saver.clone(), sink.clone())?;
    Some(Rig {
        session,
        client,
        saver,
        sink,
    })
}

#[test]
fn foreign_pages_get_no_session() {
    assert!(rig("https://example.com/doc/42").is_none());
    assert!(rig(PAGE_URL).is_some());
}

#[tokio::test]
async fn matching_call_end_to_end() {
    let r = rig(PAGE_URL).unwrap();
    let site = Site::new(r#"{"response":{"url":"https://cdn.docubra.com/f/42.pdf"}}"#);
    let installed = r.session.install(site.clone(), site.clone());

    let mut call = installed.callback.open("POST", CALL_URL);
    let page_saw = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&page_saw);
    call.on_load(move |_| flag.store(true, Ordering::SeqCst));
    installed.callback.send(call).unwrap();
    assert!(page_saw.load(Ordering::SeqCst));
    assert_eq!(
        r.session.candidate().unwrap().as_str(),
        "https://cdn.docubra.com/f/42.pdf"
    );

    let host = Host::new(true);
    let placed = r
        .session
        .place_affordance(&host, Arc::new(NullRenderer))
        .await
        .unwrap();
    assert_eq!(placed.url().as_str(), "https://cdn.docubra.com/f/42.pdf");
    r.session
        .place_affordance(&host, Arc::new(NullRenderer))
        .await
        .unwrap();
    assert_eq!(host.inserted.load(Ordering::SeqCst), 1);

    let outcome = r.session.activate().await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(
        *r.client.requested.lock().unwrap(),
        vec!["https://cdn.docubra.com/f/42.pdf".to_string()]
    );
    let saved = r.saver.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "Informe Anual_CREDIT_.pdf");
    assert_eq!(saved[0].1, b"0123456789");
    assert!(r.sink.reports().is_empty());
}

#[tokio::test]
async fn relative_candidate_is_joined_to_call_url() {
    let r = rig(PAGE_URL).unwrap();
    let site = Site::new(r#"{"download_url":"/files/42.pdf"}"#);
    let installed = r.session.install(site.clone(), site.clone());

    installed.fetch.fetch(HttpRequest::get(CALL_URL)).await.unwrap();

    assert_eq!(
        r.session.candidate().unwrap().as_str(),
        "https://docubra.com/files/42.pdf"
    );
}

#[tokio::test]
async fn latest_candidate_wins() {
    let r = rig(PAGE_URL).unwrap();
    let site = Site::new(r#"{"url":"https://cdn.docubra.com/old.pdf"}"#);
    let installed = r.session.install(site.clone(), site.clone());
    installed.fetch.fetch(HttpRequest::get(CALL_URL)).await.unwrap();
    *site.body.lock().unwrap() = r#"{"url":"https://cdn.docubra.com/new.pdf"}"#.to_string();
    installed.fetch.fetch(HttpRequest::get(CALL_URL)).await.unwrap();

    assert_eq!(
        r.session.candidate().unwrap().as_str(),
        "https://cdn.docubra.com/new.pdf"
    );
}

#[tokio::test]
async fn non_matching_calls_leave_no_candidate() {
    let r = rig(PAGE_URL).unwrap();
    let site = Site::new(r#"{"url":"https://cdn.docubra.com/a.pdf"}"#);
    let installed = r.session.install(site.clone(), site.clone());
    installed
        .fetch
        .fetch(HttpRequest::get("https://docubra.com/api/comments"))
        .await
        .unwrap();

    assert!(r.session.candidate().is_none());
    assert!(r.session.activate().await.is_none());
}

#[tokio::test]
async fn missing_container_means_no_affordance() {
    let r = rig(PAGE_URL).unwrap();
    let site = Site::new(r#"{"url":"https://cdn.docubra.com/a.pdf"}"#);
    let installed = r.session.install(site.clone(), site.clone());
    installed.fetch.fetch(HttpRequest::get(CALL_URL)).await.unwrap();

    let host = Host::new(false);
    assert!(r
        .session
        .place_affordance(&host, Arc::new(NullRenderer))
        .await
        .is_none());
    assert_eq!(host.inserted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn no_candidate_times_out() {
    let r = rig(PAGE_URL).unwrap();
    let host = Host::new(true);
    assert!(r
        .session
        .place_affordance(&host, Arc::new(NullRenderer))
        .await
        .is_none());
    assert_eq!(host.inserted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelled_session_stops_polling() {
    let r = rig(PAGE_URL).unwrap();
    let site = Site::new(r#"{"url":"https://cdn.docubra.com/a.pdf"}"#);
    let installed = r.session.install(site.clone(), site.clone());
    installed.fetch.fetch(HttpRequest::get(CALL_URL)).await.unwrap();

    r.session.cancel_token().cancel();
    let host = Host::new(true);
    assert!(r
        .session
        .place_affordance(&host, Arc::new(NullRenderer))
        .await
        .is_none());
    assert!(r.session.affordance().is_none());
}

#[tokio::test]
async fn cancel_ends_wait_for_a_file_url() {
    let cfg = SnagConfig {
        poll_interval_ms: 200,
        max_poll_attempts: 50,
        ..config()
    };
    let r = rig_with(&cfg, PAGE_URL).unwrap();
    let host = Host::new(true);
    let token = r.session.cancel_token();
    let started = std::time::Instant::now();

    let (placed, ()) = tokio::join!(
        r.session.place_affordance(&host, Arc::new(NullRenderer)),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        }
    );
    assert!(placed.is_none());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(host.inserted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cancelled_before_any_file_url_returns_at_once() {
    let r = rig(PAGE_URL).unwrap();
    r.session.cancel_token().cancel();
    let host = Host::new(true);
    let placed = tokio::time::timeout(
        Duration::from_secs(2),
        r.session.place_affordance(&host, Arc::new(NullRenderer)),
    )
    .await
    .expect("returns without waiting");
    assert!(placed.is_none());
}

#[tokio::test]
async fn oversized_wait_budget_does_not_overflow() {
    let cfg = SnagConfig {
        poll_interval_ms: u64::MAX,
        max_poll_attempts: u32::MAX,
        ..config()
    };
    let r = rig_with(&cfg, PAGE_URL).unwrap();
    let site = Site::new(r#"{"url":"https://cdn.docubra.com/a.pdf"}"#);
    let installed = r.session.install(site.clone(), site.clone());
    installed.fetch.fetch(HttpRequest::get(CALL_URL)).await.unwrap();

    let host = Host::new(true);
    let placed = r
        .session
        .place_affordance(&host, Arc::new(NullRenderer))
        .await
        .unwrap();
    assert_eq!(placed.url().as_str(), "https://cdn.docubra.com/a.pdf");
}
