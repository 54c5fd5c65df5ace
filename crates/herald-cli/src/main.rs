#![doc = include_str!("../README.md")]

mod config;
mod persist;
mod roster;
mod telemetry;

use anyhow::Context;
use clap::Parser;
use config::{AppConfig, CliArgs};
use herald::{StdoutSink, WorkerDispatcher, store::MemoryStore};
use persist::{list_user_ids, persist_completed};
use telemetry::init_telemetry;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = AppConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let inputs = match &config.input {
        Some(path) => roster::load(path)?,
        None => roster::default_roster(),
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    let result = WorkerDispatcher::new(StdoutSink, config.dispatch.clone())
        .with_shutdown(shutdown)
        .run(inputs)
        .await?;

    tracing::info!("Number of people created: {}", result.total_identities_issued);

    let store = MemoryStore::new();
    persist_completed(&store, &result).context("failed to persist run results")?;

    if !config.quiet {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    if config.list_ids {
        let ids = list_user_ids(&store).context("failed to list stored users")?;
        println!("{}", serde_json::to_string(&ids)?);
    }

    Ok(())
}

fn log_startup_info(config: &AppConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting herald with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting herald with a {:?} greeting delay",
            config.dispatch.greeting_delay
        );
    }
}

async fn cancel_on_ctrl_c(token: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal, cancelling waiting tasks");
            token.cancel();
        }
        Err(err) => tracing::error!("Failed to install Ctrl+C handler: {err}"),
    }
}
