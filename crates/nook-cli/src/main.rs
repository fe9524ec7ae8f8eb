//! Nook CLI - linked notes from the command line, synced when online.

mod cli;
mod commands;
mod config_profiles;
mod error;


use std::path::Path;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands, SyncCommands};
use crate::commands::add::run_add;
use crate::commands::common::{load_session, resolve_db_path, Session};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::edit::run_edit;
use crate::commands::links::run_links;
use crate::commands::list::run_list;
use crate::commands::rename::run_rename;
use crate::commands::search::run_search;
use crate::commands::show::run_show;
use crate::commands::sync::{run_sync, run_sync_watch};
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
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nook_cli=warn,nook_core=warn")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Config { command } => run_config(command, cli.profile.as_deref())?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
        command => {
            let session = load_session(cli.profile.as_deref(), cli.token)?;
            run_note_command(command, &session, &db_path).await?;
        }
    }

    Ok(())
}

async fn run_note_command(
    command: Commands,
    session: &Session,
    db_path: &Path,
) -> Result<(), CliError> {
    match command {
        Commands::Add { title, content } => run_add(session, &title, &content, db_path),
        Commands::List { limit, json } => run_list(session, limit, json, db_path),
        Commands::Search { query, limit, json } => {
            run_search(session, &query.join(" "), limit, json, db_path)
        }
        Commands::Show { id } => run_show(session, &id, db_path),
        Commands::Edit { id } => run_edit(session, &id, db_path),
        Commands::Rename { id, title } => run_rename(session, &id, &title, db_path),
        Commands::Links { id, json } => run_links(session, &id, json, db_path),
        Commands::Sync { command: None } => run_sync(session, db_path).await,
        Commands::Sync {
            command: Some(SyncCommands::Watch { interval }),
        } => run_sync_watch(session, interval, db_path).await,
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}
