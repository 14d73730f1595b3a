//! Testing utilities for the guestbook workspace.
//!
//! [`FakeNeocities`] is an in-process stand-in for a Neocities site: it serves
//! the document on `GET` and accepts multipart uploads on `POST /api/upload`,
//! with knobs to inject failures and delays.

#![allow(clippy::missing_panics_doc)]

use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gb_config::NeocitiesConfig;
use tiny_http::{Header, Method, Request, Response, Server};

/// API key the fake accepts; any `Authorization` header passes.
pub const TEST_API_KEY: &str = "test-api-key";

const UPLOAD_SUCCESS: &str =
    r#"{"result":"success","message":"your file(s) have been successfully uploaded"}"#;
const INVALID_AUTH: &str = r#"{"result":"error","error_type":"invalid_auth","message":"invalid credentials - please check your username and password"}"#;

#[derive(Debug, Default)]
struct FakeState {
    document: Option<Vec<u8>>,
    fetch_status: Option<u16>,
    upload_reply: Option<(u16, String)>,
    fetch_delay: Duration,
    fetches: usize,
    uploads: usize,
    last_authorization: Option<String>,
    last_upload_field: Option<String>,
}

/// A fake Neocities site bound to a random local port.
///
/// The document starts out missing (404). Dropping the fake stops the server.
pub struct FakeNeocities {
    server: Arc<Server>,
    state: Arc<Mutex<FakeState>>,
    base_url: String,
    worker: Option<JoinHandle<()>>,
}

impl FakeNeocities {
    #[must_use]
    pub fn start() -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("fake neocities should bind"));
        let port = server
            .server_addr()
            .to_ip()
            .expect("fake neocities listens on tcp")
            .port();
        let state = Arc::new(Mutex::new(FakeState::default()));

        let worker = {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    let state = Arc::clone(&state);
                    thread::spawn(move || handle(request, &state));
                }
            })
        };

        Self {
            server,
            state,
            base_url: format!("http://127.0.0.1:{port}"),
            worker: Some(worker),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Store configuration pointing at this fake, with an API key set.
    #[must_use]
    pub fn config(&self) -> NeocitiesConfig {
        NeocitiesConfig {
            api_key: TEST_API_KEY.into(),
            site_url: self.base_url.clone(),
            api_url: format!("{}/api", self.base_url),
            timeout_secs: 5,
            ..NeocitiesConfig::default()
        }
    }

    /// Same as [`Self::config`] but with no credentials at all.
    #[must_use]
    pub fn config_without_credentials(&self) -> NeocitiesConfig {
        NeocitiesConfig {
            api_key: String::new(),
            ..self.config()
        }
    }

    pub fn set_document(&self, body: &str) {
        self.lock().document = Some(body.as_bytes().to_vec());
    }

    pub fn remove_document(&self) {
        self.lock().document = None;
    }

    /// Current document text, `None` while it does not exist.
    #[must_use]
    pub fn document(&self) -> Option<String> {
        self.lock()
            .document
            .as_ref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Current document parsed as JSON. Panics if missing or invalid.
    #[must_use]
    pub fn document_json(&self) -> serde_json::Value {
        let text = self.document().expect("document should exist");
        serde_json::from_str(&text).expect("document should be valid json")
    }

    /// Answer every document fetch with `status` until cleared.
    pub fn fail_fetch_with(&self, status: u16) {
        self.lock().fetch_status = Some(status);
    }

    pub fn clear_fetch_failure(&self) {
        self.lock().fetch_status = None;
    }

    /// Answer every upload with `status` and `body` without storing anything.
    pub fn reply_to_upload_with(&self, status: u16, body: &str) {
        self.lock().upload_reply = Some((status, body.to_string()));
    }

    /// Hold every document fetch for `delay` before answering.
    pub fn delay_fetches(&self, delay: Duration) {
        self.lock().fetch_delay = delay;
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.lock().uploads
    }

    #[must_use]
    pub fn last_authorization(&self) -> Option<String> {
        self.lock().last_authorization.clone()
    }

    /// Form field name of the last stored upload, i.e. the remote path.
    #[must_use]
    pub fn last_upload_field(&self) -> Option<String> {
        self.lock().last_upload_field.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state lock poisoned")
    }
}

impl Drop for FakeNeocities {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn handle(mut request: Request, state: &Mutex<FakeState>) {
    let is_upload = *request.method() == Method::Post && request.url() == "/api/upload";
    let (status, body) = if is_upload {
        handle_upload(&mut request, state)
    } else if *request.method() == Method::Get {
        handle_fetch(state)
    } else {
        (405, String::from("method not allowed"))
    };

    let content_type = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("static header is valid");
    let response = Response::from_string(body)
        .with_status_code(status)
        .with_header(content_type);
    let _ = request.respond(response);
}

fn handle_fetch(state: &Mutex<FakeState>) -> (u16, String) {
    let delay = {
        let mut state = state.lock().expect("fake state lock poisoned");
        state.fetches += 1;
        state.fetch_delay
    };
    if !delay.is_zero() {
        thread::sleep(delay);
    }

    let state = state.lock().expect("fake state lock poisoned");
    if let Some(status) = state.fetch_status {
        return (status, String::from("upstream trouble"));
    }
    state.document.as_ref().map_or_else(
        || (404, String::from("Not Found")),
        |bytes| (200, String::from_utf8_lossy(bytes).into_owned()),
    )
}

fn handle_upload(request: &mut Request, state: &Mutex<FakeState>) -> (u16, String) {
    let header = |name: &'static str| {
        request
            .headers()
            .iter()
            .find(|h| h.field.equiv(name))
            .map(|h| h.value.as_str().to_string())
    };
    let authorization = header("Authorization");
    let content_type = header("Content-Type").unwrap_or_default();

    let mut body = Vec::new();
    if request.as_reader().read_to_end(&mut body).is_err() {
        return (400, String::from("unreadable body"));
    }

    let mut state = state.lock().expect("fake state lock poisoned");
    state.uploads += 1;
    state.last_authorization.clone_from(&authorization);

    if let Some((status, reply)) = &state.upload_reply {
        return (*status, reply.clone());
    }
    if authorization.is_none() {
        return (403, String::from(INVALID_AUTH));
    }
    let Some((field, content)) = parse_single_part(&content_type, &body) else {
        return (
            400,
            String::from(r#"{"result":"error","error_type":"missing_files","message":"no files uploaded"}"#),
        );
    };

    state.document = Some(content);
    state.last_upload_field = Some(field);
    (200, String::from(UPLOAD_SUCCESS))
}

/// Pull the field name and content of the first part of a multipart body.
///
/// Only handles the single-part bodies `reqwest` builds for an upload: one
/// `Content-Disposition` with a quoted `name`, CRLF line endings, no nested
/// multipart. Not a general multipart parser.
fn parse_single_part(content_type: &str, body: &[u8]) -> Option<(String, Vec<u8>)> {
    let boundary = content_type
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("boundary="))?
        .trim_matches('"');
    let delimiter = format!("--{boundary}");

    let after_delimiter = find(body, delimiter.as_bytes())? + delimiter.len();
    let rest = &body[after_delimiter..];
    let headers_end = find(rest, b"\r\n\r\n")?;
    let headers = String::from_utf8_lossy(&rest[..headers_end]);
    let content = &rest[headers_end + 4..];
    let content_end = find(content, format!("\r\n{delimiter}").as_bytes())?;

    let field = headers.split("name=\"").nth(1)?.split('"').next()?.to_string();
    Some((field, content[..content_end].to_vec()))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
