use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use directories::ProjectDirs;
use petclinic_core::{ClientConfig, ClinicApp, Database};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

use commands::Commands;

#[derive(Parser)]
#[command(name = "petclinic")]
#[command(about = "Veterinary clinic record client")]
struct Cli {
    /// Record service origin
    #[arg(long, global = true, env = "PETCLINIC_BASE_URL")]
    base_url: Option<String>,

    /// Session state file
    #[arg(long, global = true, env = "PETCLINIC_STATE_DB")]
    state_db: Option<PathBuf>,

    /// Answer yes to confirmation prompts
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

fn default_state_db() -> PathBuf {
    ProjectDirs::from("", "", "petclinic")
        .map(|dirs| dirs.data_dir().join("petclinic-state.db"))
        .unwrap_or_else(|| PathBuf::from("petclinic-state.db"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("petclinic=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(state_db) = cli.state_db {
        config.state_db = Some(state_db);
    }
    let state_path = config.state_db.clone().unwrap_or_else(default_state_db);

    let db = Database::open(&state_path)
        .with_context(|| format!("opening session state at {}", state_path.display()))?;
    let app = ClinicApp::from_config(&config, db)?;
    tracing::debug!(base_url = %config.base_url, state = %state_path.display(), "client ready");

    let options = commands::RunOptions {
        assume_yes: cli.yes,
        json: cli.json,
    };
    commands::run(&app, cli.command, &options).await
}
