//! # Run Subcommand
//!
//! Replays a script against a fresh engine built from a plant
//! configuration. The engine uses a manual clock and, unless `--audit-log`
//! is given, an in-memory audit trail.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use lotgate_audit::AuditEvent;
use lotgate_engine::{ManualClock, PlantConfig};
use lotgate_state::Batch;

use crate::script::{Script, StepOutcome};

/// Arguments for `lotgate run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the plant configuration.
    #[arg(value_name = "PLANT_YAML")]
    pub plant: PathBuf,

    /// Path to the replay script.
    #[arg(value_name = "SCRIPT_YAML")]
    pub script: PathBuf,

    /// Print a JSON report (steps, final batches, audit log) instead of step lines.
    #[arg(long)]
    pub json: bool,

    /// Exit with status 2 if any step is rejected.
    #[arg(long)]
    pub strict: bool,

    /// Persist the replay's audit trail to this JSON-lines file.
    #[arg(long, value_name = "LOG_JSONL")]
    pub audit_log: Option<PathBuf>,
}

/// Full replay report, printed with `--json`.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub steps: Vec<StepOutcome>,
    pub rejected: usize,
    pub halted: bool,
    pub batches: Vec<Batch>,
    pub audit: Vec<AuditEvent>,
}

/// Replay without printing.
pub fn replay(args: &RunArgs) -> Result<RunReport> {
    let mut config = PlantConfig::load(&args.plant)
        .with_context(|| format!("loading plant {}", args.plant.display()))?;
    config.audit.log_path = args.audit_log.clone();
    let script = Script::load(&args.script)?;

    let clock = Arc::new(ManualClock::new(script.start()?));
    let engine = config
        .build_engine(clock.clone())
        .context("building lifecycle engine")?;
    tracing::info!(steps = script.steps.len(), "replaying script");

    let steps = script.replay(&engine, &clock)?;
    let rejected = steps.iter().filter(|s| !s.accepted).count();
    Ok(RunReport {
        steps,
        rejected,
        halted: engine.is_halted(),
        batches: engine.batches(),
        audit: engine.audit().events(),
    })
}

/// Execute the run subcommand.
pub fn run_run(args: &RunArgs) -> Result<u8> {
    let report = replay(args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for step in &report.steps {
            println!("{}", step.line());
        }
        println!(
            "{} steps, {} rejected, {} batches, {} audit events{}",
            report.steps.len(),
            report.rejected,
            report.batches.len(),
            report.audit.len(),
            if report.halted { ", circuit breaker engaged" } else { "" }
        );
    }

    if args.strict && report.rejected > 0 {
        tracing::warn!(rejected = report.rejected, "strict replay saw rejections");
        return Ok(2);
    }
    Ok(0)
}
