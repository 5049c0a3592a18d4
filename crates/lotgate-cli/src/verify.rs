//! # Verify-Audit Subcommand
//!
//! Recomputes every hash in a JSON-lines audit log and reports the first
//! broken link.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use lotgate_audit::{read_jsonl, verify_chain, GENESIS_HASH};

/// Arguments for `lotgate verify-audit`.
#[derive(Args, Debug)]
pub struct VerifyAuditArgs {
    /// Path to the audit log.
    #[arg(value_name = "LOG_JSONL")]
    pub log: PathBuf,
}

/// Execute the verify-audit subcommand.
///
/// Returns 0 if the chain verifies, 1 if it does not.
pub fn run_verify_audit(args: &VerifyAuditArgs) -> Result<u8> {
    let events = read_jsonl(&args.log)
        .with_context(|| format!("reading audit log {}", args.log.display()))?;

    match verify_chain(&events) {
        Ok(count) => {
            let head = events
                .last()
                .map(|e| e.event_hash.as_str())
                .unwrap_or(GENESIS_HASH);
            println!("OK: {count} events, head {head}");
            Ok(0)
        }
        Err(violation) => {
            tracing::error!(sequence = violation.sequence(), "audit chain broken");
            println!("FAIL: {violation}");
            Ok(1)
        }
    }
}
