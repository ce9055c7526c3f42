use std::time::Duration;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use url::Url;

use crate::error::FetchFailure;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8000);

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub method: Option<Method>,
    pub headers: HeaderMap,
    pub json: Option<serde_json::Value>,
}

impl FetchOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post_json(body: serde_json::Value) -> Self {
        Self {
            method: Some(Method::POST),
            json: Some(body),
            ..Self::default()
        }
    }

    pub fn bearer(mut self, token: Option<&str>) -> Self {
        let Some(token) = token else {
            return self;
        };
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.headers.insert(reqwest::header::AUTHORIZATION, value);
            }
            Err(err) => {
                tracing::warn!(?err, "auth token is not a valid header value; sending without it");
            }
        }
        self
    }
}

/// Sends a request and waits at most `timeout` for the response head.
///
/// On timeout the in-flight request future is dropped, which aborts the
/// underlying connection. The timer lives inside the same future, so it is
/// released on every exit path.
pub async fn fetch_with_timeout(
    client: &reqwest::Client,
    target: &Url,
    options: FetchOptions,
    timeout: Duration,
) -> Result<reqwest::Response, FetchFailure> {
    let method = options.method.unwrap_or(Method::GET);
    let mut request = client
        .request(method.clone(), target.clone())
        .header(CONTENT_TYPE, "application/json")
        .headers(options.headers);
    if let Some(body) = &options.json {
        request = request.json(body);
    }

    tracing::debug!(%method, url = %target, timeout_ms = timeout.as_millis() as u64, "fetch");

    match tokio::time::timeout(timeout, request.send()).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(err)) => {
            tracing::warn!(%method, url = %target, error = %err, "fetch failed");
            Err(FetchFailure::network(err))
        }
        Err(_elapsed) => {
            tracing::warn!(%method, url = %target, timeout_ms = timeout.as_millis() as u64, "fetch timed out");
            Err(FetchFailure::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }
}
