//! Memo CLI - backup and restore for the Memo store
//!
//! Exports snapshots and merges snapshots from other devices into the
//! local store.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::common::{open_service, resolve_config_path, resolve_db_path};
use crate::commands::export::run_export;
use crate::commands::import::run_import;
use crate::commands::list::run_list;
use crate::commands::scope::run_scope;
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

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("memo=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let config_path = resolve_config_path(cli.config);
    let service = open_service(&db_path, config_path.as_deref()).await?;

    match cli.command {
        Commands::Export {
            ids,
            exclude,
            focus,
            output,
        } => run_export(&service, ids, exclude, focus, output.as_deref()).await?,
        Commands::Import {
            path,
            strategy,
            dry_run,
            json,
        } => run_import(&service, &path, strategy, dry_run, json).await?,
        Commands::Scope { focus, json } => run_scope(&service, focus, json).await?,
        Commands::List { limit, json } => run_list(&service, limit, json).await?,
    }

    Ok(())
}
