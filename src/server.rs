use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::auth::AuthContext;
use crate::config::Config;
use crate::envelope::{ApiError, Envelope};
use crate::loader::ContentLoader;
use crate::render::{
    self, LayoutView, MetadataView, RenderContext, RenderedElement, SummaryCard,
};
use crate::summarize::{OpenaiSummaryGenerator, SummaryOrchestrator};
use crate::transcript::TranscriptClient;

#[derive(Clone)]
pub struct AppState {
    pub loader: ContentLoader,
    pub orchestrator: SummaryOrchestrator,
    pub render: RenderContext,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("build http client")?;
        let loader = ContentLoader::new(
            client.clone(),
            config.cms_url.clone(),
            config.fetch_timeout,
        );
        let orchestrator = SummaryOrchestrator::new(
            Arc::new(loader.clone()),
            Arc::new(TranscriptClient::new(
                client.clone(),
                config.transcript_url.clone(),
            )),
            Arc::new(OpenaiSummaryGenerator::new(client, config.openai.clone())),
            Arc::new(loader.clone()),
        );
        Ok(Self {
            render: RenderContext {
                media_base: config.cms_url.clone(),
            },
            loader,
            orchestrator,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/", get(home_page))
        .route("/dashboard/summaries", get(list_summaries))
        .route("/dashboard/summaries/:id", get(show_summary))
        .route("/api/summarize", post(summarize))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    data: Option<()>,
    error: ApiError,
}

fn api_error_response(error: ApiError) -> Response {
    let status = StatusCode::from_u16(error.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorBody { data: None, error })).into_response()
}

fn envelope_data<T>(envelope: Envelope<T>) -> Result<T, Response> {
    envelope.into_result().map_err(api_error_response)
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub metadata: MetadataView,
    pub layout: Option<LayoutView>,
    pub blocks: Vec<RenderedElement>,
}

async fn home_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let auth = AuthContext::from_headers(&headers);

    let metadata = state.loader.get_global_page_metadata(&auth).await;
    let layout = state.loader.get_global_data(&auth).await;
    let home = match envelope_data(state.loader.get_home_page_data(&auth).await) {
        Ok(home) => home,
        Err(resp) => return resp,
    };

    if let Some(error) = &layout.error {
        tracing::warn!(status = error.status, message = %error.message, "global layout unavailable");
    }

    Json(HomeView {
        metadata: render::render_metadata(metadata.data.as_ref()),
        layout: layout.data.as_ref().map(render::render_layout),
        blocks: render::render_blocks(&home.blocks, &state.render),
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
struct SummariesParams {
    #[serde(default)]
    query: String,
    page: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummariesView {
    pub query: String,
    pub page: u32,
    pub page_count: u32,
    pub cards: Vec<SummaryCard>,
}

async fn list_summaries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SummariesParams>,
) -> Response {
    let auth = AuthContext::from_headers(&headers);
    let page = params
        .page
        .as_deref()
        .and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1);

    let envelope = state.loader.get_summaries(&auth, &params.query, page).await;
    let page_count = envelope.page_count().unwrap_or(0);
    let summaries = match envelope_data(envelope) {
        Ok(summaries) => summaries,
        Err(resp) => return resp,
    };

    Json(SummariesView {
        query: params.query,
        page,
        page_count,
        cards: summaries.iter().map(render::render_summary_card).collect(),
    })
    .into_response()
}

async fn show_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let auth = AuthContext::from_headers(&headers);
    match envelope_data(state.loader.get_summary_by_id(&auth, &id).await) {
        Ok(summary) => Json(summary).into_response(),
        Err(resp) => resp,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    pub video_id: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummarizeResponse {
    pub data: Option<String>,
    pub error: Option<String>,
}

async fn summarize(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Result<Json<SummarizeRequest>, JsonRejection>,
) -> (StatusCode, Json<SummarizeResponse>) {
    let auth = AuthContext::from_headers(&headers);
    // Unreadable bodies count as an empty video id.
    let video_id = match request {
        Ok(Json(request)) => request.video_id,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "unreadable summarize body");
            String::new()
        }
    };
    match state.orchestrator.run(&auth, &video_id).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(SummarizeResponse {
                data: Some(outcome.summary),
                error: None,
            }),
        ),
        Err(err) => (
            err.status(),
            Json(SummarizeResponse {
                data: None,
                error: Some(err.to_string()),
            }),
        ),
    }
}
