use std::str::FromStr;
use std::time::Duration;

use anyhow::Context as _;
use url::Url;

use crate::fetch::DEFAULT_TIMEOUT;

pub const DEFAULT_CMS_URL: &str = "http://localhost:1337";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_OPENAI_MAX_TOKENS: u32 = 4000;

#[derive(Debug, Clone)]
pub struct Config {
    pub cms_url: Url,
    pub fetch_timeout: Duration,
    pub transcript_url: Url,
    pub openai: OpenaiConfig,
}

#[derive(Clone)]
pub struct OpenaiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl std::fmt::Debug for OpenaiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenaiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let cms_url = var("SUMMARYDECK_CMS_URL").unwrap_or_else(|| DEFAULT_CMS_URL.to_owned());
        let cms_url = Url::parse(&cms_url)
            .with_context(|| format!("parse SUMMARYDECK_CMS_URL: {cms_url}"))?;

        let transcript_url = match var("SUMMARYDECK_TRANSCRIPT_URL") {
            Some(raw) => Url::parse(&raw)
                .with_context(|| format!("parse SUMMARYDECK_TRANSCRIPT_URL: {raw}"))?,
            None => cms_url
                .join("/utilai/yt-transcript")
                .context("derive transcript url from cms url")?,
        };

        let fetch_timeout = parse_or_default(
            "SUMMARYDECK_FETCH_TIMEOUT_MS",
            var("SUMMARYDECK_FETCH_TIMEOUT_MS"),
            DEFAULT_TIMEOUT.as_millis() as u64,
        );

        let openai = OpenaiConfig {
            api_key: var("OPENAI_API_KEY"),
            base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_owned()),
            model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_owned()),
            temperature: parse_or_default(
                "OPENAI_TEMPERATURE",
                var("OPENAI_TEMPERATURE"),
                DEFAULT_OPENAI_TEMPERATURE,
            ),
            max_tokens: parse_or_default(
                "OPENAI_MAX_TOKENS",
                var("OPENAI_MAX_TOKENS"),
                DEFAULT_OPENAI_MAX_TOKENS,
            ),
        };

        Ok(Self {
            cms_url,
            fetch_timeout: Duration::from_millis(fetch_timeout),
            transcript_url,
            openai,
        })
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, ?default, "invalid value; using default");
            default
        }
    }
}
