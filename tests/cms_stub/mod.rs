use std::io::Read as _;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

pub const GOOD_TOKEN: &str = "good-token";
pub const VIDEO_ID: &str = "dQw4w9WgXcQ";
pub const COMPLETION_TEXT: &str = "## Never Gonna Give You Up\n\n- key point";

#[derive(Debug, Clone)]
pub struct CmsStubConfig {
    pub credits: i64,
    pub home_delay: Option<Duration>,
}

impl Default for CmsStubConfig {
    fn default() -> Self {
        Self {
            credits: 5,
            home_delay: None,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
    pub body: String,
}

/// Strapi, transcript and OpenAI endpoints on one local port.
pub struct CmsStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[allow(dead_code)]
impl CmsStub {
    pub fn spawn(config: CmsStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start cms stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let raw_url = request.url().to_string();
                let (path, raw_query) = raw_url.split_once('?').unwrap_or((raw_url.as_str(), ""));
                let query = url::form_urlencoded::parse(raw_query.as_bytes())
                    .into_owned()
                    .collect::<Vec<_>>();
                let authorization = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("Authorization"))
                    .map(|h| h.value.as_str().to_owned());
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let method = request.method().to_string().to_uppercase();

                recorded.lock().unwrap().push(RecordedRequest {
                    method: method.clone(),
                    path: path.to_owned(),
                    query: query.clone(),
                    authorization: authorization.clone(),
                    body: body.clone(),
                });

                let (status, payload) = route(
                    &config,
                    &method,
                    path,
                    &query,
                    authorization.as_deref(),
                    &body,
                );

                let content_type = if payload.starts_with('{') {
                    &b"application/json"[..]
                } else {
                    &b"text/plain"[..]
                };
                let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type)
                    .expect("build header");
                let _ = request.respond(
                    tiny_http::Response::from_string(payload)
                        .with_status_code(status)
                        .with_header(header),
                );
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

impl Drop for CmsStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strapi_error(status: u16, name: &str, message: &str) -> (u16, String) {
    (
        status,
        json!({
            "data": null,
            "error": { "status": status, "name": name, "message": message, "details": {} }
        })
        .to_string(),
    )
}

fn route(
    config: &CmsStubConfig,
    method: &str,
    path: &str,
    query: &[(String, String)],
    authorization: Option<&str>,
    body: &str,
) -> (u16, String) {
    let expected = format!("Bearer {GOOD_TOKEN}");
    let authorized = authorization == Some(expected.as_str());

    match (method, path) {
        ("GET", "/api/home-page") => {
            if let Some(delay) = config.home_delay {
                thread::sleep(delay);
            }
            (200, home_page().to_string())
        }
        ("GET", "/api/global") => {
            if query.iter().any(|(k, _)| k.starts_with("fields")) {
                (
                    200,
                    json!({ "data": { "title": "Epic Next", "description": "Summaries" }, "meta": {} })
                        .to_string(),
                )
            } else {
                (200, global().to_string())
            }
        }
        ("GET", "/api/summaries") => (200, summaries().to_string()),
        ("GET", "/api/summaries/sum-1") => (
            200,
            json!({ "data": summary_json(1, "sum-1", "Cats"), "meta": {} }).to_string(),
        ),
        ("GET", p) if p.starts_with("/api/summaries/") => {
            strapi_error(404, "NotFoundError", "Not Found")
        }
        ("GET", "/api/users/me") => {
            if !authorized {
                return strapi_error(401, "UnauthorizedError", "Missing or invalid credentials");
            }
            (
                200,
                json!({
                    "id": 1,
                    "documentId": "user-1",
                    "username": "ada",
                    "email": "ada@example.com",
                    "credits": config.credits
                })
                .to_string(),
            )
        }
        ("POST", "/api/summaries") => {
            if !authorized {
                return strapi_error(403, "ForbiddenError", "Forbidden");
            }
            let parsed: Value = match serde_json::from_str(body) {
                Ok(v) => v,
                Err(_) => return strapi_error(400, "ValidationError", "invalid json"),
            };
            let data = &parsed["data"];
            (
                201,
                json!({
                    "data": {
                        "id": 99,
                        "documentId": "created-99",
                        "title": data["title"],
                        "videoId": data["videoId"],
                        "summary": data["summary"],
                        "userId": "user-1",
                        "createdAt": "2024-10-01T12:00:00.000Z"
                    },
                    "meta": {}
                })
                .to_string(),
            )
        }
        ("GET", p) if p.starts_with("/utilai/yt-transcript/") => {
            let id = p.trim_start_matches("/utilai/yt-transcript/");
            if id == VIDEO_ID {
                (200, "we're no strangers to love".to_owned())
            } else {
                (404, "no transcript".to_owned())
            }
        }
        ("POST", "/v1/chat/completions") => {
            if authorization != Some("Bearer sk-test") {
                return (
                    401,
                    json!({ "error": { "message": "Incorrect API key provided" } }).to_string(),
                );
            }
            let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
            let prompt = parsed
                .pointer("/messages/0/content")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            if !prompt.contains("we're no strangers to love") {
                return (
                    400,
                    json!({ "error": { "message": "prompt is missing transcript" } }).to_string(),
                );
            }
            (
                200,
                json!({
                    "id": "chatcmpl-stub",
                    "object": "chat.completion",
                    "choices": [
                        {
                            "index": 0,
                            "message": { "role": "assistant", "content": COMPLETION_TEXT },
                            "finish_reason": "stop"
                        }
                    ]
                })
                .to_string(),
            )
        }
        _ => (404, "not found".to_owned()),
    }
}

fn home_page() -> Value {
    json!({
        "data": {
            "id": 1,
            "documentId": "home",
            "title": "Home Page",
            "description": "",
            "blocks": [
                {
                    "__component": "layout.hero-section",
                    "id": 1,
                    "heading": "Summarize Your Videos",
                    "subHeading": "Save time",
                    "image": { "id": 2, "documentId": "img", "url": "/uploads/hero.png", "alternativeText": null },
                    "link": { "id": 3, "href": "/login", "label": "Login", "isExternal": false }
                },
                { "__component": "layout.testimonials", "id": 7, "quotes": [] },
                {
                    "__component": "layout.features-section",
                    "id": 2,
                    "title": "Features",
                    "description": "Why it helps",
                    "feature": [
                        { "id": 4, "heading": "Save Time", "subHeading": "No more rewatching", "icon": "CLOCK_ICON" },
                        { "id": 5, "heading": "Accurate", "subHeading": "Good summaries", "icon": "CHECK_ICON" }
                    ]
                }
            ]
        },
        "meta": {}
    })
}

fn global() -> Value {
    json!({
        "data": {
            "documentId": "global",
            "title": "Epic Next",
            "description": "Summaries",
            "header": {
                "logoText": { "id": 1, "href": "/", "label": "Summarize AI", "isExternal": false },
                "ctaButton": { "id": 2, "href": "/signup", "label": "Get Started", "isExternal": false }
            },
            "footer": {
                "logoText": { "id": 3, "href": "/", "label": "Summarize AI", "isExternal": false },
                "text": "Made with love",
                "socialLink": [
                    { "id": 4, "href": "https://youtube.com/@channel", "label": "YouTube", "isExternal": true }
                ]
            }
        },
        "meta": {}
    })
}

fn summary_json(id: i64, document_id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "documentId": document_id,
        "title": title,
        "videoId": VIDEO_ID,
        "summary": format!("{title} summary body"),
        "userId": "user-1",
        "createdAt": "2024-10-01T12:00:00.000Z"
    })
}

fn summaries() -> Value {
    json!({
        "data": [summary_json(1, "sum-1", "Cats"), summary_json(2, "sum-2", "Dogs")],
        "meta": { "pagination": { "page": 2, "pageSize": 4, "pageCount": 3, "total": 10 } }
    })
}
