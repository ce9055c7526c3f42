mod cms_stub;

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt as _;
use serde_json::Value;
use tower::ServiceExt as _;

use cms_stub::{COMPLETION_TEXT, CmsStub, CmsStubConfig, GOOD_TOKEN, VIDEO_ID};
use summarydeck::config::Config;
use summarydeck::server::{AppState, router};

fn app_for(stub: &CmsStub) -> axum::Router {
    let vars = HashMap::from([
        ("SUMMARYDECK_CMS_URL".to_owned(), stub.base_url.clone()),
        ("SUMMARYDECK_FETCH_TIMEOUT_MS".to_owned(), "5000".to_owned()),
        ("OPENAI_API_KEY".to_owned(), "sk-test".to_owned()),
        ("OPENAI_BASE_URL".to_owned(), format!("{}/v1", stub.base_url)),
    ]);
    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
    router(AppState::from_config(&config).unwrap())
}

fn summarize_request(cookie: Option<&str>, video: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/summarize")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(
            serde_json::json!({ "videoId": video }).to_string(),
        ))
        .unwrap()
}

async fn call(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn session_cookie() -> String {
    format!("theme=dark; jwt={GOOD_TOKEN}")
}

#[tokio::test]
async fn summarize_without_session_is_401_and_makes_no_calls() {
    let stub = CmsStub::spawn(CmsStubConfig::default());
    let (status, body) = call(app_for(&stub), summarize_request(None, VIDEO_ID)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["error"], "Not authenticated");
    assert!(stub.requests().is_empty(), "{:?}", stub.paths());
}

#[tokio::test]
async fn summarize_with_zero_credits_is_402_without_transcript_fetch() {
    let stub = CmsStub::spawn(CmsStubConfig {
        credits: 0,
        ..CmsStubConfig::default()
    });
    let (status, body) = call(
        app_for(&stub),
        summarize_request(Some(&session_cookie()), VIDEO_ID),
    )
    .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"], "Insufficient credits");
    assert_eq!(stub.paths(), ["GET /api/users/me"]);
}

#[tokio::test]
async fn summarize_with_invalid_input_is_400() {
    let stub = CmsStub::spawn(CmsStubConfig::default());
    let (status, body) = call(
        app_for(&stub),
        summarize_request(Some(&session_cookie()), "https://vimeo.com/123"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid Youtube Video ID");
    assert!(stub.paths().is_empty(), "{:?}", stub.paths());
}

fn raw_summarize_request(
    cookie: Option<&str>,
    content_type: Option<&str>,
    body: &str,
) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/summarize");
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

#[tokio::test]
async fn summarize_checks_session_before_parsing_the_body() {
    let stub = CmsStub::spawn(CmsStubConfig::default());
    for (content_type, body) in [
        (None, ""),
        (Some("application/json"), "{}"),
        (Some("application/json"), "not json"),
    ] {
        let (status, json) = call(
            app_for(&stub),
            raw_summarize_request(None, content_type, body),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{body:?}");
        assert_eq!(
            json,
            serde_json::json!({ "data": null, "error": "Not authenticated" })
        );
    }
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn summarize_with_unreadable_body_is_400_after_session_check() {
    let stub = CmsStub::spawn(CmsStubConfig::default());
    for (content_type, body) in [
        (None, ""),
        (Some("application/json"), "{}"),
        (Some("application/json"), "not json"),
    ] {
        let (status, json) = call(
            app_for(&stub),
            raw_summarize_request(Some(&session_cookie()), content_type, body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");
        assert_eq!(json["data"], Value::Null);
        assert_eq!(json["error"], "Invalid Youtube Video ID");
    }
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn summarize_runs_the_full_pipeline() {
    let stub = CmsStub::spawn(CmsStubConfig::default());
    let (status, body) = call(
        app_for(&stub),
        summarize_request(
            Some(&session_cookie()),
            &format!("https://www.youtube.com/watch?v={VIDEO_ID}"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"], COMPLETION_TEXT);
    assert_eq!(body["error"], Value::Null);
    assert_eq!(
        stub.paths(),
        [
            "GET /api/users/me".to_owned(),
            format!("GET /utilai/yt-transcript/{VIDEO_ID}"),
            "POST /v1/chat/completions".to_owned(),
            "POST /api/summaries".to_owned(),
        ]
    );

    let requests = stub.requests();
    assert_eq!(requests[1].authorization, None);
    let created: Value = serde_json::from_str(&requests[3].body).unwrap();
    assert_eq!(created["data"]["title"], format!("Summary for video: {VIDEO_ID}"));
    assert_eq!(created["data"]["summary"], COMPLETION_TEXT);
}

#[tokio::test]
async fn summarize_surfaces_transcript_failure_as_500() {
    let stub = CmsStub::spawn(CmsStubConfig::default());
    let (status, body) = call(
        app_for(&stub),
        summarize_request(Some(&session_cookie()), "aaaaaaaaaaa"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("transcript fetch failed"),
        "{body}"
    );
    assert!(!stub.paths().iter().any(|p| p.contains("chat/completions")));
}

#[tokio::test]
async fn home_route_renders_metadata_layout_and_blocks() {
    let stub = CmsStub::spawn(CmsStubConfig::default());
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = call(app_for(&stub), request).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["metadata"]["title"], "Epic Next");
    assert_eq!(body["layout"]["header"]["cta"]["label"], "Get Started");
    let blocks = body["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["type"], "hero");
    assert_eq!(blocks[1]["type"], "features");
}

#[tokio::test]
async fn summaries_route_lists_cards_with_page_count() {
    let stub = CmsStub::spawn(CmsStubConfig::default());
    let request = Request::builder()
        .uri("/dashboard/summaries?query=cat&page=2")
        .header(header::COOKIE, session_cookie())
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(app_for(&stub), request).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["page"], 2);
    assert_eq!(body["pageCount"], 3);
    assert_eq!(body["cards"][0]["href"], "/dashboard/summaries/sum-1");

    let recorded = &stub.requests()[0];
    assert_eq!(recorded.authorization.as_deref(), Some("Bearer good-token"));
}

#[tokio::test]
async fn missing_summary_route_returns_strapi_error() {
    let stub = CmsStub::spawn(CmsStubConfig::default());
    let request = Request::builder()
        .uri("/dashboard/summaries/unknown")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(app_for(&stub), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["name"], "NotFoundError");
}
