//! Snipo CLI - administer GitHub Gist sync for the local snippet library

mod cli;
mod commands;
mod config;
mod error;


use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use snipo_core::crypto::CredentialCipher;
use snipo_core::gist::GistClientFactory;
use snipo_core::services::DatabaseService;
use snipo_core::sync::SyncService;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::commands::{conflicts, daemon, log, mappings, settings, sync};
use crate::config::{CliConfig, ConfigError};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "snipo=info"
        .parse()
        .map_err(|error| ConfigError::Invalid(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();
    let config = CliConfig::from_env()?;
    let db_path = config.resolve_db_path(cli.db_path)?;
    let service = open_service(&config, db_path).await?;

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Show { json } => settings::run_show(&service, json).await?,
            ConfigCommands::Set(args) => settings::run_set(&service, args).await?,
            ConfigCommands::Clear => settings::run_clear(&service).await?,
        },
        Commands::TestToken { token } => settings::run_test_token(&service, &token).await?,
        Commands::Sync { id } => sync::run_sync(&service, id.as_deref()).await?,
        Commands::Enable { id, all } => sync::run_enable(&service, id.as_deref(), all).await?,
        Commands::Disable { id, delete_remote } => {
            sync::run_disable(&service, &id, delete_remote).await?;
        }
        Commands::Unlink { id } => sync::run_unlink(&service, &id).await?,
        Commands::Mappings { json } => mappings::run_mappings(&service, json).await?,
        Commands::Conflicts { all, json } => conflicts::run_conflicts(&service, all, json).await?,
        Commands::Resolve { conflict_id, keep } => {
            conflicts::run_resolve(&service, conflict_id, keep).await?;
        }
        Commands::Log { limit, json } => log::run_log(&service, limit, json).await?,
        Commands::Daemon => daemon::run_daemon(service, config.sync_tick).await?,
    }

    Ok(())
}

async fn open_service(config: &CliConfig, db_path: PathBuf) -> Result<SyncService, CliError> {
    let db = DatabaseService::open_path(db_path).await?;
    let cipher = config
        .secret_key
        .as_deref()
        .map(CredentialCipher::from_secret)
        .transpose()?;
    let factory = Arc::new(GistClientFactory::new(config.github_api_url.clone()));
    Ok(SyncService::new(db, cipher, factory))
}
