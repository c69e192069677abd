//! # tortilla: Sales Ledger CLI
//!
//! Counter-side front end for the tortilla ledger.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. Parse arguments (clap) ───────────────────────────────────────────► │
//! │                                                                         │
//! │  2. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter, written to stderr            │
//! │     • Default: info,tortilla=debug,sqlx=warn; RUST_LOG overrides       │
//! │                                                                         │
//! │  3. Load Configuration ───────────────────────────────────────────────► │
//! │     • defaults → config.toml → TORTILLA_* → flags                      │
//! │                                                                         │
//! │  4. Start Session ────────────────────────────────────────────────────► │
//! │     • users.db, default admin, password check                          │
//! │                                                                         │
//! │  5. Run Command ──────────────────────────────────────────────────────► │
//! │     • stdout: report/JSON output   stderr: logs and errors             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cli;
mod commands;
mod config;
mod error;

use std::process;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::Session;
use crate::config::AppConfig;
use crate::error::CliResult;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let json = cli.json;
    if let Err(err) = run(cli).await {
        match serde_json::to_string_pretty(&err) {
            Ok(body) if json => println!("{body}"),
            _ => eprintln!("{err}"),
        }
        process::exit(err.code.exit_code());
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tortilla_db=trace` - Trace the storage layer only
/// - Default: INFO, DEBUG for the tortilla crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tortilla=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> CliResult<()> {
    let mut config = AppConfig::load(cli.config.clone())?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }
    if let Some(user) = cli.user {
        config.session.user = user;
    }
    config.validate()?;

    if let Command::InitConfig = cli.command {
        let path = config.save(cli.config)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    info!(data_dir = %config.data_dir().display(), "Using data directory");
    let session = Session::start(config, cli.password.as_deref(), cli.json).await?;

    match cli.command {
        Command::Sell(args) => commands::sell(&session, args).await,
        Command::Receipt(args) => commands::receipt(&session, args.index).await,
        Command::List(args) => commands::list(&session, args).await,
        Command::Delete(args) => commands::delete(&session, args.index).await,
        Command::DeleteAll(args) => commands::delete_all(&session, args).await,
        Command::Daily(args) => commands::daily(&session, args.date).await,
        Command::Weekly(args) => commands::weekly(&session, args.date).await,
        Command::Overview(args) => commands::overview(&session, args.range()).await,
        Command::Report(report) => commands::report(&session, report.command).await,
        Command::Export(output) => commands::export(&session, output).await,
        Command::Import(args) => commands::import(&session, args).await,
        Command::User(user) => commands::user(&session, user.command).await,
        Command::InitConfig => Ok(()),
    }
}
