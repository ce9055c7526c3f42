use anyhow::Context as _;
use url::Url;

/// Fetches plain-text transcripts from `<base>/<video id>`.
#[derive(Debug, Clone)]
pub struct TranscriptClient {
    client: reqwest::Client,
    base_url: Url,
}

impl TranscriptClient {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn transcript_url(&self, video_id: &str) -> anyhow::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("transcript base url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .push(video_id);
        Ok(url)
    }

    /// Unauthenticated GET; non-2xx and empty bodies are errors.
    pub async fn fetch(&self, video_id: &str) -> anyhow::Result<String> {
        let url = self.transcript_url(video_id)?;
        tracing::info!(video_id, url = %url, "fetch transcript");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = response.status();
        let text = response.text().await.context("read transcript body")?;
        if !status.is_success() {
            let snippet = text.chars().take(200).collect::<String>();
            anyhow::bail!("transcript service error ({status}): {snippet}");
        }
        if text.trim().is_empty() {
            anyhow::bail!("transcript for {video_id} is empty");
        }
        Ok(text)
    }
}
