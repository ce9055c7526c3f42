use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use url::Url;

use crate::auth::AuthContext;
use crate::cli::{ConnectionArgs, SummariesArgs, SummarizeArgs, SummaryArgs};
use crate::config::Config;
use crate::envelope::Envelope;
use crate::loader::ContentLoader;
use crate::render::{self, RenderContext};
use crate::summarize::{OpenaiSummaryGenerator, SummaryOrchestrator};
use crate::transcript::TranscriptClient;

/// Everything a single CLI invocation needs.
pub struct Session {
    pub config: Config,
    pub client: reqwest::Client,
    pub loader: ContentLoader,
    pub auth: AuthContext,
    pub json: bool,
}

impl Session {
    pub fn new(conn: &ConnectionArgs) -> anyhow::Result<Self> {
        let mut config = Config::from_env().context("load config")?;
        if let Some(raw) = conn.cms_url.as_deref() {
            config.cms_url = Url::parse(raw).with_context(|| format!("parse --cms-url: {raw}"))?;
        }
        if let Some(ms) = conn.timeout_ms {
            config.fetch_timeout = Duration::from_millis(ms);
        }
        tracing::debug!(?config, "resolved config");

        let client = reqwest::Client::builder()
            .build()
            .context("build http client")?;
        let loader = ContentLoader::new(client.clone(), config.cms_url.clone(), config.fetch_timeout);
        Ok(Self {
            auth: AuthContext::with_token(conn.token.as_deref()),
            config,
            client,
            loader,
            json: conn.json,
        })
    }

    fn render_context(&self) -> RenderContext {
        RenderContext {
            media_base: self.config.cms_url.clone(),
        }
    }
}

fn require<T>(what: &str, envelope: Envelope<T>) -> anyhow::Result<T> {
    envelope.into_result().map_err(|error| {
        anyhow::anyhow!(
            "{what} failed: {} ({}): {}",
            error.name,
            error.status,
            error.message
        )
    })
}

fn to_json(value: &impl serde::Serialize) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("serialize output")
}

pub async fn home(session: &Session) -> anyhow::Result<String> {
    let home = require("home page", session.loader.get_home_page_data(&session.auth).await)?;
    let elements = render::render_blocks(&home.blocks, &session.render_context());
    if session.json {
        return to_json(&elements);
    }
    render::to_markdown(&elements).context("render home page")
}

pub async fn layout(session: &Session) -> anyhow::Result<String> {
    let global = require("global layout", session.loader.get_global_data(&session.auth).await)?;
    let view = render::render_layout(&global);
    if session.json {
        return to_json(&view);
    }

    let mut out = String::new();
    if let Some(header) = &view.header {
        writeln!(out, "header: {} | {}", header.logo.label, header.cta.label)?;
    }
    if let Some(footer) = &view.footer {
        writeln!(out, "footer: {} | {}", footer.logo.label, footer.text)?;
        for link in &footer.social {
            writeln!(out, "  - {}", link.label)?;
        }
    }
    Ok(out)
}

pub async fn metadata(session: &Session) -> anyhow::Result<String> {
    let envelope = session.loader.get_global_page_metadata(&session.auth).await;
    if let Some(error) = &envelope.error {
        tracing::warn!(status = error.status, message = %error.message, "metadata unavailable; using defaults");
    }
    let view = render::render_metadata(envelope.data.as_ref());
    if session.json {
        return to_json(&view);
    }
    Ok(format!("{}\n{}\n", view.title, view.description))
}

pub async fn summaries(session: &Session, args: &SummariesArgs) -> anyhow::Result<String> {
    let envelope = session
        .loader
        .get_summaries(&session.auth, &args.query, args.page)
        .await;
    let page_count = envelope.page_count().unwrap_or(0);
    let summaries = require("summaries", envelope)?;
    let cards = summaries
        .iter()
        .map(render::render_summary_card)
        .collect::<Vec<_>>();
    if session.json {
        return to_json(&cards);
    }

    let mut out = String::new();
    for card in &cards {
        writeln!(out, "{}  {}\n    {}", card.document_id, card.title, card.preview)?;
    }
    writeln!(out, "page {} of {page_count}", args.page.max(1))?;
    Ok(out)
}

pub async fn summary(session: &Session, args: &SummaryArgs) -> anyhow::Result<String> {
    let summary = require(
        "summary",
        session.loader.get_summary_by_id(&session.auth, &args.id).await,
    )?;
    if session.json {
        return to_json(&summary);
    }
    Ok(format!("# {}\n\n{}\n", summary.title, summary.summary))
}

pub async fn me(session: &Session) -> anyhow::Result<String> {
    let user = require("current user", session.loader.get_user_me(&session.auth).await)?;
    if session.json {
        return to_json(&user);
    }
    Ok(format!("{} <{}> credits: {}\n", user.username, user.email, user.credits))
}

pub async fn summarize(session: &Session, args: &SummarizeArgs) -> anyhow::Result<String> {
    let orchestrator = SummaryOrchestrator::new(
        Arc::new(session.loader.clone()),
        Arc::new(TranscriptClient::new(
            session.client.clone(),
            session.config.transcript_url.clone(),
        )),
        Arc::new(OpenaiSummaryGenerator::new(
            session.client.clone(),
            session.config.openai.clone(),
        )),
        Arc::new(session.loader.clone()),
    );

    let outcome = orchestrator
        .run(&session.auth, &args.video)
        .await
        .map_err(|err| anyhow::anyhow!("{err} (HTTP {})", err.status().as_u16()))?;
    if session.json {
        return to_json(&outcome);
    }
    Ok(format!(
        "created {} ({})\n\n{}\n",
        outcome.record.document_id, outcome.record.title, outcome.summary
    ))
}
