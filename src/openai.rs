use anyhow::Context as _;

use crate::config::OpenaiConfig;

pub fn chat_completions_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/chat/completions")
}

/// One-shot chat completion with a single user message.
pub async fn chat_completion_text(
    client: &reqwest::Client,
    config: &OpenaiConfig,
    prompt: &str,
) -> anyhow::Result<String> {
    let Some(api_key) = config.api_key.as_deref() else {
        anyhow::bail!("OPENAI_API_KEY is not set");
    };
    let endpoint = chat_completions_endpoint(&config.base_url);

    let mut body = serde_json::json!({
        "model": config.model,
        "messages": [{ "role": "user", "content": prompt }],
        "max_tokens": config.max_tokens,
    });

    // NOTE: GPT-5 family models reject `temperature`; omit it for them.
    if !config.model.starts_with("gpt-5")
        && let Some(obj) = body.as_object_mut()
    {
        obj.insert("temperature".to_owned(), serde_json::json!(config.temperature));
    }

    let response = client
        .post(&endpoint)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("POST {endpoint}"))?;

    let status = response.status();
    let raw = response.text().await.context("read OpenAI response body")?;
    if !status.is_success() {
        let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
        anyhow::bail!("OpenAI API error ({status}): {message}");
    }

    let value: serde_json::Value = serde_json::from_str(&raw).context("parse OpenAI response")?;
    extract_message_text(&value).context("extract completion text")
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

fn extract_message_text(value: &serde_json::Value) -> anyhow::Result<String> {
    let choices = value
        .get("choices")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow::anyhow!("missing `choices` array in response"))?;

    let text = choices
        .iter()
        .filter_map(|choice| choice.pointer("/message/content")?.as_str())
        .collect::<String>();

    if text.trim().is_empty() {
        anyhow::bail!("OpenAI completion text is empty");
    }
    Ok(text)
}
