use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::AuthContext;
use crate::envelope::{ApiError, Envelope};
use crate::fetch::{FetchOptions, fetch_with_timeout};
use crate::model::{AuthenticatedUser, GlobalLayout, HomePage, NewSummary, PageMetadata, Summary};
use crate::query;

/// Named reads (and the summary create) against the Strapi REST API.
///
/// Every call returns an [`Envelope`]; transport failures never escape as
/// errors.
#[derive(Debug, Clone)]
pub struct ContentLoader {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ContentLoader {
    pub fn new(client: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn get_home_page_data(&self, auth: &AuthContext) -> Envelope<HomePage> {
        self.get("/api/home-page", &query::build_home_page_query(), auth)
            .await
    }

    pub async fn get_global_data(&self, auth: &AuthContext) -> Envelope<GlobalLayout> {
        self.get("/api/global", &query::build_global_query(), auth)
            .await
    }

    pub async fn get_global_page_metadata(&self, auth: &AuthContext) -> Envelope<PageMetadata> {
        self.get("/api/global", &query::build_metadata_query(), auth)
            .await
    }

    pub async fn get_summaries(
        &self,
        auth: &AuthContext,
        search: &str,
        page: u32,
    ) -> Envelope<Vec<Summary>> {
        let query = query::build_summaries_query(search, page);
        self.get("/api/summaries", &query.to_value(), auth).await
    }

    pub async fn get_summary_by_id(&self, auth: &AuthContext, id: &str) -> Envelope<Summary> {
        let id = id.trim();
        if id.is_empty() || id == "." || id == ".." {
            return Envelope::err(ApiError {
                status: 400,
                name: "ValidationError".to_owned(),
                message: format!("invalid summary id: {id:?}"),
                details: None,
            });
        }
        self.get_segments(
            &["api", "summaries", id],
            &query::build_summary_query(),
            auth,
        )
        .await
    }

    /// `/api/users/me` answers with the bare user object rather than `{data}`.
    pub async fn get_user_me(&self, auth: &AuthContext) -> Envelope<AuthenticatedUser> {
        if !auth.is_authenticated() {
            return Envelope::err(ApiError {
                status: 401,
                name: "UnauthorizedError".to_owned(),
                message: "Missing or invalid credentials".to_owned(),
                details: None,
            });
        }

        let url = match self.endpoint("/api/users/me", &serde_json::Value::Null) {
            Ok(url) => url,
            Err(envelope) => return envelope,
        };
        let (status, body) = match self.send(&url, FetchOptions::get(), auth).await {
            Ok(received) => received,
            Err(envelope) => return envelope,
        };
        if !(200..300).contains(&status) {
            return Envelope::from_body(status, &body);
        }
        match serde_json::from_slice::<AuthenticatedUser>(&body) {
            Ok(user) => Envelope::ok(user, None, status),
            Err(err) => Envelope::fetch_error(format!("invalid user body: {err}")),
        }
    }

    pub async fn create_summary(
        &self,
        auth: &AuthContext,
        record: &NewSummary,
    ) -> Envelope<Summary> {
        let url = match self.endpoint("/api/summaries", &serde_json::Value::Null) {
            Ok(url) => url,
            Err(envelope) => return envelope,
        };
        let body = serde_json::json!({ "data": record });
        match self.send(&url, FetchOptions::post_json(body), auth).await {
            Ok((status, body)) => Envelope::from_body(status, &body),
            Err(envelope) => envelope,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &serde_json::Value,
        auth: &AuthContext,
    ) -> Envelope<T> {
        let segments = path.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>();
        self.get_segments(&segments, query, auth).await
    }

    async fn get_segments<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &serde_json::Value,
        auth: &AuthContext,
    ) -> Envelope<T> {
        let url = match self.endpoint_segments(segments, query) {
            Ok(url) => url,
            Err(envelope) => return envelope,
        };
        match self.send(&url, FetchOptions::get(), auth).await {
            Ok((status, body)) => Envelope::from_body(status, &body),
            Err(envelope) => envelope,
        }
    }

    fn endpoint<T>(&self, path: &str, query: &serde_json::Value) -> Result<Url, Envelope<T>> {
        let segments = path.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>();
        self.endpoint_segments(&segments, query)
    }

    /// Each segment is percent-encoded, so ids cannot add path levels, a
    /// query or a fragment.
    fn endpoint_segments<T>(
        &self,
        segments: &[&str],
        query: &serde_json::Value,
    ) -> Result<Url, Envelope<T>> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| {
                Envelope::fetch_error(format!("cms url cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        let pairs = query::to_query_pairs(query);
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    async fn send<T>(
        &self,
        url: &Url,
        options: FetchOptions,
        auth: &AuthContext,
    ) -> Result<(u16, Vec<u8>), Envelope<T>> {
        let options = options.bearer(auth.token());
        let response = fetch_with_timeout(&self.client, url, options, self.timeout)
            .await
            .map_err(|failure| Envelope::from_failure(&failure))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| Envelope::fetch_error(format!("read response body: {err}")))?;
        tracing::debug!(url = %url.path(), status, bytes = body.len(), "content response");
        Ok((status, body.to_vec()))
    }
}
