//! # acct CLI entry point
//!
//! Parses command-line arguments, connects to PostgreSQL, and dispatches to
//! the subcommand handlers. Results are printed to stdout as JSON; logs go
//! to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use acct_cli::freeze::{
    run_delay_bot, run_freeze, run_notify, run_unfreeze, run_unwarn, run_warn, AccountArgs,
    DelayBotArgs, FreezeArgs, NotifyArgs,
};
use acct_cli::inspect::{run_list, run_status, ListArgs, StatusArgs};
use acct_cli::settings::{load_config, pool_settings};
use acct_cli::sweep::{exit_code, run_sweep, SweepArgs};
use acct_freeze::{AccountFreezeService, LogTracker};
use acct_pg::PgStore;

/// Account freeze administration.
///
/// Places and lifts freezes, inspects freeze events, and runs the periodic
/// escalation sweeps against the account database.
#[derive(Parser, Debug)]
#[command(name = "acct", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Path to a YAML freeze configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// PostgreSQL connection string. Defaults to `DATABASE_URL`.
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Place a freeze on an account.
    Freeze(FreezeArgs),

    /// Lift a freeze and restore the limits it captured.
    Unfreeze(FreezeArgs),

    /// Record a billing warning.
    Warn(AccountArgs),

    /// Remove a billing warning.
    Unwarn(AccountArgs),

    /// Schedule a bot review after a delay.
    DelayBot(DelayBotArgs),

    /// Count a sent reminder for a freeze.
    Notify(NotifyArgs),

    /// Show the freeze events of one account.
    Status(StatusArgs),

    /// List freeze events across accounts, one page at a time.
    List(ListArgs),

    /// Run an escalation sweep.
    Sweep(SweepArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config = load_config(cli.config.as_deref())?;
    let settings = pool_settings(cli.database_url.as_deref())?;
    let store = PgStore::connect(&settings).await?;
    let svc = AccountFreezeService::new(store, Arc::new(LogTracker), config)?;
    tracing::debug!(command = ?cli.command, "dispatching");

    let (output, code) = match &cli.command {
        Commands::Freeze(args) => (run_freeze(args, &svc).await?, 0),
        Commands::Unfreeze(args) => (run_unfreeze(args, &svc).await?, 0),
        Commands::Warn(args) => (run_warn(args, &svc).await?, 0),
        Commands::Unwarn(args) => (run_unwarn(args, &svc).await?, 0),
        Commands::DelayBot(args) => (run_delay_bot(args, &svc).await?, 0),
        Commands::Notify(args) => (run_notify(args, &svc).await?, 0),
        Commands::Status(args) => (run_status(args, &svc).await?, 0),
        Commands::List(args) => (run_list(args, &svc).await?, 0),
        Commands::Sweep(args) => {
            let reports = run_sweep(args, &svc).await?;
            (serde_json::to_value(&reports)?, exit_code(&reports))
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(code)
}
