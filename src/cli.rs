use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub conn: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// Strapi base URL (overrides SUMMARYDECK_CMS_URL).
    #[arg(long, global = true)]
    pub cms_url: Option<String>,

    /// Session token sent as a bearer credential.
    #[arg(long, global = true, env = "SUMMARYDECK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in milliseconds (overrides SUMMARYDECK_FETCH_TIMEOUT_MS).
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Print raw JSON instead of the rendered view.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the home page blocks.
    Home,
    /// Show the global header and footer.
    Layout,
    /// Show the site title and description.
    Metadata,
    /// List summaries, newest first.
    Summaries(SummariesArgs),
    /// Show one summary by document id.
    Summary(SummaryArgs),
    /// Show the signed-in user and remaining credits.
    Me,
    /// Summarize a YouTube video and save the result.
    Summarize(SummarizeArgs),
}

#[derive(Debug, Args)]
pub struct SummariesArgs {
    /// Case-insensitive search over title and summary text.
    #[arg(long, default_value = "")]
    pub query: String,

    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Summary document id.
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    /// Video id or URL (youtube.com/watch?v=..., youtu.be/...).
    #[arg(long)]
    pub video: String,
}
