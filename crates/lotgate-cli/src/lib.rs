//! # lotgate-cli: Command-Line Interface
//!
//! Provides the `lotgate` binary.
//!
//! ## Subcommands
//!
//! - `lotgate check`: Validate a plant configuration and print a summary.
//! - `lotgate run`: Replay a scripted request sequence against a fresh engine.
//! - `lotgate verify-audit`: Verify the hash chain of a JSON-lines audit log.
//!
//! ```bash
//! lotgate check plant.yaml
//! lotgate run plant.yaml shift.yaml --strict
//! lotgate verify-audit audit.jsonl
//! ```
//!
//! Handlers return a process exit code: 0 on success, 1 when a check
//! fails, 2 when `--strict` sees a rejected step.

pub mod check;
pub mod run;
pub mod script;
pub mod verify;
