use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};

pub const SESSION_COOKIE: &str = "jwt";

/// Request-scoped credentials, passed explicitly to every loader call.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    token: Option<String>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Blank tokens are treated as absent.
    pub fn with_token(token: Option<impl Into<String>>) -> Self {
        let token = token
            .map(Into::into)
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        Self { token }
    }

    /// Reads the `jwt` session cookie, falling back to `Authorization: Bearer`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let from_cookie = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|raw| cookie_value(raw, SESSION_COOKIE))
            .find(|token| !token.trim().is_empty());
        if let Some(token) = from_cookie {
            return Self::with_token(Some(token));
        }

        let from_bearer = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.strip_prefix("Bearer "));
        Self::with_token(from_bearer)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

fn cookie_value<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.trim_matches('"'))
    })
}
