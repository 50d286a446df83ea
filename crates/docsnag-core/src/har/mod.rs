//! Captured-traffic replay.
//!
//! A HAR file saved from the browser's network panel stands in for the page:
//! its calls are re-issued through the intercepted primitives and answered
//! from the capture.

mod parse;
mod replay;

pub use replay::{HarReplay, RecordedCall};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::CallKind;
    use crate::transport::{CallbackTransport, FetchTransport, HttpRequest};
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;

    const CAPTURE: &str = r#"{
        "log": {
            "version": "1.2",
            "entries": [
                {
                    "_resourceType": "document",
                    "request": { "method": "GET", "url": "https://docubra.com/doc/42/informe", "headers": [] },
                    "response": { "status": 200, "headers": [], "content": { "text": "<html></html>" } }
                },
                {
                    "_resourceType": "xhr",
                    "request": {
                        "method": "POST",
                        "url": "https://docubra.com/start/show",
                        "headers": [],
                        "postData": { "mimeType": "application/x-www-form-urlencoded", "text": "id=42" }
                    },
                    "response": {
                        "status": 200,
                        "headers": [ { "name": "Content-Type", "value": "application/json" } ],
                        "content": { "mimeType": "application/json", "text": "{\"response\":{\"url\":\"https://cdn.docubra.com/f/42.pdf\"}}" }
                    }
                },
                {
                    "_resourceType": "fetch",
                    "request": { "method": "get", "url": "https://docubra.com/api/ping" },
                    "response": { "status": 204, "content": {} }
                },
                {
                    "_resourceType": "image",
                    "request": { "url": "https://docubra.com/logo.png" },
                    "response": { "status": 200, "content": { "text": "iVBORw0KGgo=", "encoding": "base64" } }
                }
            ]
        }
    }"#;

    fn capture_file() -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(CAPTURE.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn recorded_calls_keep_order_and_primitive() {
        let f = capture_file();
        let replay = HarReplay::load(f.path()).unwrap();
        let calls = replay.recorded_calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[1].kind, CallKind::Callback);
        assert_eq!(calls[1].method, "POST");
        assert_eq!(calls[1].body.as_deref(), Some(&b"id=42"[..]));
        assert_eq!(calls[2].kind, CallKind::Fetch);
        assert_eq!(calls[2].method, "GET");
        assert_eq!(calls[3].method, "GET");
    }

    #[test]
    fn callback_send_answers_and_fires_listeners() {
        let replay = HarReplay::from_slice(CAPTURE.as_bytes()).unwrap();
        let seen = Arc::new(Mutex::new(None));
        let mut call = replay.open("POST", "https://docubra.com/start/show");
        let s = Arc::clone(&seen);
        call.on_load(move |r| *s.lock().unwrap() = Some(r.text().into_owned()));
        let response = replay.send(call).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.headers.get("content-type"), Some("application/json"));
        assert!(seen.lock().unwrap().as_deref().unwrap().contains("42.pdf"));
    }

    #[tokio::test]
    async fn fetch_of_unrecorded_call_is_transport_error() {
        let replay = HarReplay::from_slice(CAPTURE.as_bytes()).unwrap();
        let err = replay
            .fetch(HttpRequest::get("https://docubra.com/nope"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no recorded response"));
    }

    #[test]
    fn base64_bodies_are_decoded() {
        let replay = HarReplay::from_slice(CAPTURE.as_bytes()).unwrap();
        let call = replay.open("GET", "https://docubra.com/logo.png");
        let response = replay.send(call).unwrap();
        assert_eq!(&response.body[..], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn base64_json_reply_is_inspected() {
        // {"url":"https://a.example/f/9.pdf"}
        let har = r#"{"log":{"entries":[
            {"request":{"url":"https://a.example/start/show"},
             "response":{"status":200,"content":{"encoding":"base64",
               "text":"eyJ1cmwiOiJodHRwczovL2EuZXhhbXBsZS9mLzkucGRmIn0="}}}
        ]}}"#;
        let replay = HarReplay::from_slice(har.as_bytes()).unwrap();
        let response = replay
            .fetch(HttpRequest::get("https://a.example/start/show"))
            .await
            .unwrap();
        let found = crate::inspect::extract(&response.text()).unwrap();
        assert_eq!(found.as_str(), "https://a.example/f/9.pdf");
    }

    #[test]
    fn undecodable_bodies_replay_empty() {
        let har = r#"{"log":{"entries":[
            {"request":{"url":"https://a.example/x"},
             "response":{"status":200,"content":{"encoding":"base64","text":"%%%"}}},
            {"request":{"url":"https://a.example/y"},
             "response":{"status":200,"content":{"encoding":"gzip","text":"abc"}}}
        ]}}"#;
        let replay = HarReplay::from_slice(har.as_bytes()).unwrap();
        for url in ["https://a.example/x", "https://a.example/y"] {
            let call = replay.open("GET", url);
            assert!(replay.send(call).unwrap().body.is_empty());
        }
    }

    #[test]
    fn repeated_calls_get_responses_in_capture_order() {
        let har = r#"{"log":{"entries":[
            {"request":{"url":"https://a.example/start/show"},"response":{"status":500,"content":{"text":"busy"}}},
            {"request":{"url":"https://a.example/start/show"},"response":{"status":200,"content":{"text":"ok"}}}
        ]}}"#;
        let replay = HarReplay::from_slice(har.as_bytes()).unwrap();
        let statuses: Vec<u32> = (0..3)
            .map(|_| {
                let call = replay.open("GET", "https://a.example/start/show");
                replay.send(call).unwrap().status
            })
            .collect();
        assert_eq!(statuses, vec![500, 200, 200]);
    }

    #[test]
    fn malformed_har_is_an_error() {
        assert!(HarReplay::from_slice(b"{\"entries\": []}").is_err());
    }
}
