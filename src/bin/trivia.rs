use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use trivia_api::db::{self, run_migrations};
use trivia_api::server::app::run_server;
use trivia_api::settings::Settings;
use trivia_api::telemetry::init_tracing;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file, missing file means defaults and environment only
    #[clap(short, long, default_value = "trivia.toml")]
    config: PathBuf,
    #[clap(default_value = "server")]
    runner: Runner,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Runner {
    Server,
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;
    let pool = db::establish_connection(&settings.database_url)
        .await
        .with_context(|| format!("Cannot connect to {}", settings.database_url))?;

    tracing::info!("Running db migrations...");
    run_migrations(&pool).await?;

    match cli.runner {
        Runner::Server => run_server(pool, settings.address()?).await?,
        Runner::Migrate => tracing::info!("Migrations applied"),
    };
    Ok(())
}
