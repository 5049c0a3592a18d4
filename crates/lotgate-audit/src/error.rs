//! Audit errors.
//!
//! An [`AuditError`] is an infrastructure failure, not a business refusal.
//! The lifecycle engine treats it as fatal for the current operation and
//! commits nothing.

use thiserror::Error;

use lotgate_core::CanonicalizationError;

/// Failure to record or load audit events.
#[derive(Error, Debug)]
pub enum AuditError {
    /// The backing store could not be read or written.
    #[error("audit log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An event could not be encoded or decoded as JSON.
    #[error("audit event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An event body could not be canonicalized for hashing.
    #[error("audit event canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A line of a JSON-lines log is not a valid event.
    #[error("audit log line {line} is malformed: {source}")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// Decoder error.
        source: serde_json::Error,
    },

    /// An existing log failed chain verification on load.
    #[error("audit log chain is broken: {0}")]
    Chain(#[from] ChainViolation),

    /// The sink refuses writes (used by test doubles and read-only replicas).
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// The first defect found while verifying a hash chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainViolation {
    /// An event's sequence number is not its position.
    #[error("expected sequence {expected}, found {found}")]
    SequenceGap {
        /// Position in the log.
        expected: u64,
        /// Recorded sequence number.
        found: u64,
    },

    /// `previous_hash` does not match the prior event's hash.
    #[error("event {sequence}: previous_hash {found} does not link to {expected}")]
    BrokenLink {
        /// Offending event.
        sequence: u64,
        /// Hash of the prior event (or genesis).
        expected: String,
        /// Recorded `previous_hash`.
        found: String,
    },

    /// `event_hash` does not match the recomputed hash.
    #[error("event {sequence}: recorded hash {recorded} != recomputed {recomputed}")]
    HashMismatch {
        /// Offending event.
        sequence: u64,
        /// Recorded `event_hash`.
        recorded: String,
        /// Hash over the event as it stands.
        recomputed: String,
    },

    /// The event body cannot be canonicalized.
    #[error("event {sequence}: cannot be hashed ({reason})")]
    Unhashable {
        /// Offending event.
        sequence: u64,
        /// Canonicalization error message.
        reason: String,
    },
}

impl ChainViolation {
    /// Sequence number of the offending event.
    pub fn sequence(&self) -> u64 {
        match self {
            Self::SequenceGap { expected, .. } => *expected,
            Self::BrokenLink { sequence, .. }
            | Self::HashMismatch { sequence, .. }
            | Self::Unhashable { sequence, .. } => *sequence,
        }
    }
}
