use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    coursenav::logging::init().context("init logging")?;

    let cli = coursenav::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        coursenav::cli::Command::Outline(args) => {
            coursenav::outline::run(args).context("outline")?;
        }
        coursenav::cli::Command::Navigate(args) => {
            coursenav::navigate::run(args).await.context("navigate")?;
        }
        coursenav::cli::Command::Fetch(args) => {
            coursenav::outline::fetch(args).await.context("fetch")?;
        }
    }

    Ok(())
}
