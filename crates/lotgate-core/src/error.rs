//! # Error Hierarchy
//!
//! Structured error types built with `thiserror`. No `Box<dyn Error>`, no
//! `.unwrap()` outside tests.
//!
//! - [`Rejection`]: expected business refusals. A rejected request has no
//!   effect on any state and is reported synchronously to the caller.
//! - [`ValidationError`]: malformed identifiers, tiers, or role names.
//! - [`CanonicalizationError`]: failure to produce canonical bytes for a
//!   digest.
//!
//! Infrastructure failures (the audit store cannot persist) are not
//! rejections; they live in `lotgate-audit` and abort the operation.

use thiserror::Error;

use crate::authority::{Role, Tier};
use crate::identity::{BatchId, PrincipalId, VesselId};

/// A request refused by a guard, a status precondition, or the telemetry
/// throttle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Operator tier is below the vessel requirement.
    #[error("principal {principal} holds tier {tier}, vessel {vessel} requires tier {required}")]
    InsufficientTier {
        /// The operator attempting the start.
        principal: PrincipalId,
        /// The vessel the batch would run on.
        vessel: VesselId,
        /// The operator's current tier.
        tier: Tier,
        /// The vessel's minimum tier.
        required: Tier,
    },

    /// Principal lacks the required role grant.
    #[error("principal {principal} lacks role {role}")]
    RoleDenied {
        /// The caller.
        principal: PrincipalId,
        /// The role the action requires.
        role: Role,
    },

    /// Principal is not the designated supervisor.
    #[error("principal {principal} is not the supervisor")]
    NotSupervisor {
        /// The caller.
        principal: PrincipalId,
    },

    /// The circuit breaker is engaged and the action is halt-sensitive.
    #[error("system halted: circuit breaker is engaged")]
    SystemHalted,

    /// The telemetry throttle rejected an in-spec update.
    #[error("batch {batch_id}: {elapsed_secs}s since last event, updates require {required_secs}s")]
    IntervalNotReached {
        /// The batch receiving the update.
        batch_id: BatchId,
        /// Seconds elapsed since the batch's last accepted event.
        elapsed_secs: i64,
        /// Minimum interval between in-spec updates, in seconds.
        required_secs: i64,
    },

    /// The action's status precondition is not met.
    #[error("batch {batch_id}: cannot {action} from status {from}")]
    InvalidStateTransition {
        /// The batch.
        batch_id: BatchId,
        /// The batch's current status name.
        from: String,
        /// The attempted action.
        action: String,
    },

    /// No batch with this id was ever scheduled.
    #[error("unknown batch: {batch_id}")]
    UnknownBatch {
        /// The referenced id.
        batch_id: BatchId,
    },

    /// A batch with this id already exists.
    #[error("batch {batch_id} already exists")]
    DuplicateBatch {
        /// The duplicated id.
        batch_id: BatchId,
    },
}

impl Rejection {
    /// Stable machine-readable code for this rejection.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientTier { .. } => "INSUFFICIENT_TIER",
            Self::RoleDenied { .. } => "ROLE_DENIED",
            Self::NotSupervisor { .. } => "NOT_SUPERVISOR",
            Self::SystemHalted => "SYSTEM_HALTED",
            Self::IntervalNotReached { .. } => "INTERVAL_NOT_REACHED",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::UnknownBatch { .. } => "UNKNOWN_BATCH",
            Self::DuplicateBatch { .. } => "DUPLICATE_BATCH",
        }
    }
}

/// Validation errors for domain primitives.
///
/// These carry the invalid input and the expected format so that operators
/// can diagnose misconfiguration without guesswork.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier failed format validation.
    #[error("invalid {kind} identifier \"{value}\": {reason}")]
    InvalidIdentifier {
        /// Which identifier namespace (batch, principal, vessel).
        kind: &'static str,
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Tier above the maximum of 5.
    #[error("tier {0} out of range (expected 0..=5)")]
    TierOutOfRange(u8),

    /// Role name not recognised.
    #[error("unknown role \"{0}\" (expected MANAGER or QC_TECH)")]
    UnknownRole(String),

    /// Timestamp string is not valid UTC ISO 8601.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
