//! # Check Subcommand
//!
//! Loads a plant configuration, builds its registries, and prints a short
//! summary. An existing audit log is read and its chain verified; check
//! never creates or writes the file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use lotgate_audit::{read_jsonl, verify_chain};
use lotgate_engine::PlantConfig;

/// Arguments for `lotgate check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the plant configuration.
    #[arg(value_name = "PLANT_YAML")]
    pub plant: PathBuf,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let config = PlantConfig::load(&args.plant)
        .with_context(|| format!("checking {}", args.plant.display()))?;
    for line in summarize(&config)? {
        println!("{line}");
    }
    Ok(0)
}

/// Summary lines for a loaded configuration.
pub fn summarize(config: &PlantConfig) -> Result<Vec<String>> {
    let registry = config.registry();
    let roles = registry.roles();
    let mut lines = vec![
        format!("supervisor: {}", registry.supervisor()),
        format!("operators with tiers: {}", registry.tiers().operator_count()),
        format!("vessels with requirements: {}", registry.tiers().vessel_count()),
        format!("principals with roles: {}", roles.principal_count()),
        format!(
            "telemetry interval: {}s",
            config.throttle().min_interval_secs()
        ),
    ];

    match &config.audit.log_path {
        Some(path) if path.exists() => {
            let events = read_jsonl(path)
                .with_context(|| format!("reading audit log {}", path.display()))?;
            let count = verify_chain(&events)
                .with_context(|| format!("verifying audit log {}", path.display()))?;
            lines.push(format!(
                "audit log: {} ({count} events, chain verified)",
                path.display()
            ));
        }
        Some(path) => lines.push(format!("audit log: {} (not yet created)", path.display())),
        None => lines.push("audit log: in memory".to_string()),
    }
    Ok(lines)
}
