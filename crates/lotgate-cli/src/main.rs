//! # lotgate CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lotgate_cli::check::{run_check, CheckArgs};
use lotgate_cli::run::{run_run, RunArgs};
use lotgate_cli::verify::{run_verify_audit, VerifyAuditArgs};

/// Lotgate: permissioned batch lifecycle tooling.
///
/// Checks plant configurations, replays request scripts against the
/// lifecycle engine, and verifies audit logs.
#[derive(Parser, Debug)]
#[command(name = "lotgate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a plant configuration and print a summary.
    Check(CheckArgs),

    /// Replay a request script against a fresh engine.
    Run(RunArgs),

    /// Verify the hash chain of a JSON-lines audit log.
    VerifyAudit(VerifyAuditArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check(args) => run_check(&args),
        Commands::Run(args) => run_run(&args),
        Commands::VerifyAudit(args) => run_verify_audit(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
