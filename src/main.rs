mod main_runtime;

use chrono::Local;
use clap::Parser;
use pyramid::api::{start_webhook_server, AppState};
use pyramid::bootstrap::build_processor;
use pyramid::cli::{Cli, Commands};
use pyramid::config::AppConfig;
use pyramid::domain::SizingState;
use pyramid::error::{PyramidError, Result};
use pyramid::persistence::{JsonStateStore, StateStore};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = AppConfig::load_from(&cli.config)?;
    if let Some(dry_run) = cli.dry_run {
        config.broker.dry_run = dry_run;
    }

    match cli.command_or_default() {
        Commands::Serve { port } => {
            let _log_guard = main_runtime::init_logging(&config.logging);
            run_serve(config, port).await?;
        }
        Commands::State => {
            main_runtime::init_logging_simple();
            show_state(&config).await?;
        }
        Commands::Reset => {
            main_runtime::init_logging_simple();
            reset_state(&config).await?;
        }
    }

    Ok(())
}

async fn run_serve(config: AppConfig, port: Option<u16>) -> Result<()> {
    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("config: {}", e);
        }
        return Err(PyramidError::Validation(errors.join("; ")));
    }

    if config.broker.dry_run {
        warn!("dry-run mode: orders are logged, not submitted");
    }

    let processor = Arc::new(build_processor(&config)?);
    let port = port.unwrap_or(config.server.port);
    info!(port, "starting pyramid");

    start_webhook_server(AppState::new(processor), &config.server.host, port).await
}

async fn show_state(config: &AppConfig) -> Result<()> {
    let store = JsonStateStore::new(&config.sizing.state_path);
    match store.peek().await? {
        Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
        None => println!(
            "no sizing state persisted at {}",
            config.sizing.state_path.display()
        ),
    }
    Ok(())
}

async fn reset_state(config: &AppConfig) -> Result<()> {
    let store = JsonStateStore::new(&config.sizing.state_path);
    let state = SizingState::new(Local::now().date_naive());
    store.save(&state).await?;
    println!(
        "sizing state reset at {}: {}",
        config.sizing.state_path.display(),
        state
    );
    Ok(())
}
