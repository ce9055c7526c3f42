use std::io::Write as _;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use summarydeck::cli::{Cli, Command};
use summarydeck::commands::{self, Session};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    summarydeck::logging::init("warn").context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let session = Session::new(&cli.conn).context("start session")?;
    let output = match &cli.command {
        Command::Home => commands::home(&session).await.context("home")?,
        Command::Layout => commands::layout(&session).await.context("layout")?,
        Command::Metadata => commands::metadata(&session).await.context("metadata")?,
        Command::Summaries(args) => commands::summaries(&session, args)
            .await
            .context("summaries")?,
        Command::Summary(args) => commands::summary(&session, args)
            .await
            .context("summary")?,
        Command::Me => commands::me(&session).await.context("me")?,
        Command::Summarize(args) => commands::summarize(&session, args)
            .await
            .context("summarize")?,
    };

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .context("write output")?;
    if !output.ends_with('\n') {
        writeln!(stdout).context("write output")?;
    }
    Ok(())
}
