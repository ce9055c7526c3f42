//! The "summarize a video" request pipeline.
//!
//! `Validating -> FetchingTranscript -> GeneratingSummary -> Persisting -> Done`.
//! The first failing stage ends the request; nothing is retried or resumed.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::auth::AuthContext;
use crate::config::OpenaiConfig;
use crate::envelope::Envelope;
use crate::error::SummarizeError;
use crate::loader::ContentLoader;
use crate::model::{AuthenticatedUser, NewSummary, Summary};
use crate::openai;
use crate::transcript::TranscriptClient;

const YOUTUBE_ID_LEN: usize = 11;

pub fn summary_prompt(transcript: &str) -> String {
    format!(
        "INSTRUCTIONS:\n\
For the following content, complete these steps.\n\
Generate a title based on the content provided.\n\
Summarize the content and include 5 key topics, writing in first person using a normal tone of voice.\n\
\n\
Write a YouTube video description:\n\
  - Include a heading and sections.\n\
  - Incorporate keywords and key takeaways.\n\
\n\
Generate a bulleted list of key points and benefits.\n\
\n\
Return the best recommended keywords.\n\
\n\
CONTENT:\n\
{transcript}\n"
    )
}

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == YOUTUBE_ID_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Extracts the canonical 11-character video id from a bare id or a
/// YouTube URL (`watch?v=`, `youtu.be/`, `embed/`, `shorts/`, `v/`, `live/`).
pub fn extract_youtube_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if is_video_id(input) {
        return Some(input.to_owned());
    }

    let with_scheme = if input.contains("://") {
        input.to_owned()
    } else {
        format!("https://{input}")
    };
    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = ["www.", "m.", "music."]
        .iter()
        .find_map(|prefix| host.strip_prefix(prefix))
        .unwrap_or(host.as_str())
        .to_owned();

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let candidate = match host.as_str() {
        "youtu.be" => segments.next().map(str::to_owned),
        "youtube.com" | "youtube-nocookie.com" => match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("embed" | "shorts" | "v" | "live") => segments.next().map(str::to_owned),
            _ => None,
        },
        _ => None,
    }?;

    is_video_id(&candidate).then_some(candidate)
}

#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn current_user(&self, auth: &AuthContext) -> Envelope<AuthenticatedUser>;
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn transcript(&self, video_id: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn generate(&self, transcript: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn create(&self, auth: &AuthContext, record: &NewSummary) -> Envelope<Summary>;
}

#[async_trait]
impl AccountSource for ContentLoader {
    async fn current_user(&self, auth: &AuthContext) -> Envelope<AuthenticatedUser> {
        self.get_user_me(auth).await
    }
}

#[async_trait]
impl SummaryStore for ContentLoader {
    async fn create(&self, auth: &AuthContext, record: &NewSummary) -> Envelope<Summary> {
        self.create_summary(auth, record).await
    }
}

#[async_trait]
impl TranscriptSource for TranscriptClient {
    async fn transcript(&self, video_id: &str) -> anyhow::Result<String> {
        self.fetch(video_id).await
    }
}

/// Chat-completion backed generator using the fixed summary prompt.
#[derive(Debug, Clone)]
pub struct OpenaiSummaryGenerator {
    client: reqwest::Client,
    config: OpenaiConfig,
}

impl OpenaiSummaryGenerator {
    pub fn new(client: reqwest::Client, config: OpenaiConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl SummaryGenerator for OpenaiSummaryGenerator {
    async fn generate(&self, transcript: &str) -> anyhow::Result<String> {
        tracing::info!(
            model = %self.config.model,
            transcript_chars = transcript.chars().count(),
            "generate summary"
        );
        openai::chat_completion_text(&self.client, &self.config, &summary_prompt(transcript)).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    FetchingTranscript,
    GeneratingSummary,
    Persisting,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOutcome {
    pub video_id: String,
    pub summary: String,
    pub record: Summary,
}

#[derive(Clone)]
pub struct SummaryOrchestrator {
    accounts: Arc<dyn AccountSource>,
    transcripts: Arc<dyn TranscriptSource>,
    generator: Arc<dyn SummaryGenerator>,
    store: Arc<dyn SummaryStore>,
}

impl SummaryOrchestrator {
    pub fn new(
        accounts: Arc<dyn AccountSource>,
        transcripts: Arc<dyn TranscriptSource>,
        generator: Arc<dyn SummaryGenerator>,
        store: Arc<dyn SummaryStore>,
    ) -> Self {
        Self {
            accounts,
            transcripts,
            generator,
            store,
        }
    }

    pub async fn run(
        &self,
        auth: &AuthContext,
        input: &str,
    ) -> Result<SummaryOutcome, SummarizeError> {
        let request_id = uuid::Uuid::new_v4();
        let result = self.run_stages(request_id, auth, input).await;
        match &result {
            Ok(outcome) => {
                tracing::info!(%request_id, video_id = %outcome.video_id, stage = ?Stage::Done, "summary created");
            }
            Err(err) => {
                tracing::warn!(%request_id, status = err.status().as_u16(), error = %err, "summary request failed");
            }
        }
        result
    }

    async fn run_stages(
        &self,
        request_id: uuid::Uuid,
        auth: &AuthContext,
        input: &str,
    ) -> Result<SummaryOutcome, SummarizeError> {
        tracing::info!(%request_id, stage = ?Stage::Validating, "summary request");
        if !auth.is_authenticated() {
            return Err(SummarizeError::Unauthenticated);
        }
        let video_id = extract_youtube_id(input).ok_or_else(|| SummarizeError::InvalidInput {
            input: input.to_owned(),
        })?;
        self.validate_account(auth).await?;

        tracing::info!(%request_id, stage = ?Stage::FetchingTranscript, %video_id, "summary request");
        let transcript = self
            .transcripts
            .transcript(&video_id)
            .await
            .map_err(|err| SummarizeError::Transcript {
                message: format!("{err:#}"),
            })?;

        tracing::info!(%request_id, stage = ?Stage::GeneratingSummary, %video_id, "summary request");
        let summary = self
            .generator
            .generate(&transcript)
            .await
            .map_err(|err| SummarizeError::Generation {
                message: format!("{err:#}"),
            })?;

        tracing::info!(%request_id, stage = ?Stage::Persisting, %video_id, "summary request");
        let record = NewSummary::for_video(&video_id, summary.clone());
        let record = self
            .store
            .create(auth, &record)
            .await
            .into_result()
            .map_err(|err| SummarizeError::Persist {
                message: err.message,
            })?;

        Ok(SummaryOutcome {
            video_id,
            summary,
            record,
        })
    }

    /// Session must resolve to a user holding at least one credit.
    async fn validate_account(&self, auth: &AuthContext) -> Result<(), SummarizeError> {
        let user = self
            .accounts
            .current_user(auth)
            .await
            .into_result()
            .map_err(|err| {
                tracing::debug!(status = err.status, message = %err.message, "user lookup rejected");
                SummarizeError::Unauthenticated
            })?;
        if user.credits < 1 {
            return Err(SummarizeError::InsufficientCredit {
                credits: user.credits,
            });
        }
        Ok(())
    }
}
