// ZenDiary - personal diary core
// Entry point and application setup

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zendiary::app::{self, AppState};
use zendiary::commands::Command;
use zendiary::config::DATA_DIR_ENV;

#[derive(Parser, Debug)]
#[command(version, about = "Personal diary: entries, reminders and cloud backup")]
struct Cli {
    /// Directory holding the database and settings
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zendiary=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting ZenDiary");

    let state = AppState::initialize(app::resolve_data_dir(cli.data_dir)).await?;
    cli.command.run(&state).await
}
