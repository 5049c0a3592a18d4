//! # Replay Scripts
//!
//! A script is a YAML list of requests replayed in order against one engine
//! driven by a manual clock:
//!
//! ```yaml
//! start_at: 2026-01-15T08:00:00Z
//! steps:
//!   - { action: schedule_batch, principal: mgr-1, batch_id: B1 }
//!   - { action: start_batch, principal: op-1, batch_id: B1, vessel_id: V1 }
//!   - { action: advance_clock, minutes: 20 }
//!   - { action: log_process_update, principal: op-1, batch_id: B1, spec_good: true }
//! ```
//!
//! Lifecycle rejections are recorded as step outcomes. Audit failures abort
//! the replay.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use lotgate_core::{BatchId, PrincipalId, Role, Tier, Timestamp, VesselId};
use lotgate_engine::{BatchLifecycle, LifecycleError, ManualClock};

/// Default replay start time.
pub const DEFAULT_START: &str = "2026-01-01T00:00:00Z";

/// A parsed replay script.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Initial clock reading.
    #[serde(default)]
    pub start_at: Option<Timestamp>,
    /// Requests, in order.
    pub steps: Vec<Step>,
}

/// One scripted request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    ScheduleBatch {
        principal: PrincipalId,
        batch_id: BatchId,
    },
    StartBatch {
        principal: PrincipalId,
        batch_id: BatchId,
        vessel_id: VesselId,
    },
    RequestQualityCheck {
        principal: PrincipalId,
        batch_id: BatchId,
    },
    LogProcessUpdate {
        principal: PrincipalId,
        batch_id: BatchId,
        spec_good: bool,
    },
    ManagerBypass {
        principal: PrincipalId,
        batch_id: BatchId,
    },
    FinalizeBatch {
        principal: PrincipalId,
        batch_id: BatchId,
        approved: bool,
    },
    ApproveForShipping {
        principal: PrincipalId,
        batch_id: BatchId,
    },
    ToggleCircuitBreaker {
        principal: PrincipalId,
    },
    /// Move the clock forward.
    AdvanceClock {
        #[serde(default)]
        minutes: i64,
        #[serde(default)]
        seconds: i64,
    },
    /// Administrative tier change.
    SetTier {
        operator: PrincipalId,
        tier: Tier,
    },
    /// Administrative role grant.
    GrantRole {
        grantee: PrincipalId,
        role: Role,
    },
    /// Administrative role revocation.
    RevokeRole {
        grantee: PrincipalId,
        role: Role,
    },
}

impl Step {
    /// The action name as written in scripts.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScheduleBatch { .. } => "schedule_batch",
            Self::StartBatch { .. } => "start_batch",
            Self::RequestQualityCheck { .. } => "request_quality_check",
            Self::LogProcessUpdate { .. } => "log_process_update",
            Self::ManagerBypass { .. } => "manager_bypass",
            Self::FinalizeBatch { .. } => "finalize_batch",
            Self::ApproveForShipping { .. } => "approve_for_shipping",
            Self::ToggleCircuitBreaker { .. } => "toggle_circuit_breaker",
            Self::AdvanceClock { .. } => "advance_clock",
            Self::SetTier { .. } => "set_tier",
            Self::GrantRole { .. } => "grant_role",
            Self::RevokeRole { .. } => "revoke_role",
        }
    }
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    /// 1-based step number.
    pub step: usize,
    pub action: &'static str,
    pub at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<BatchId>,
    /// Whether the request was accepted.
    pub accepted: bool,
    /// Summary on success, rejection message otherwise.
    pub detail: String,
    /// Rejection code, when rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl StepOutcome {
    /// One-line rendering for terminal output.
    pub fn line(&self) -> String {
        let target = self
            .batch_id
            .as_ref()
            .map(|b| format!(" {b}"))
            .unwrap_or_default();
        match self.code {
            None => format!("[{}] {}{}: ok, {}", self.step, self.action, target, self.detail),
            Some(code) => format!(
                "[{}] {}{}: rejected {}: {}",
                self.step, self.action, target, code, self.detail
            ),
        }
    }
}

impl Script {
    /// Parse a YAML script.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("invalid replay script")
    }

    /// Load a script file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script: {}", path.display()))?;
        Self::from_yaml_str(&yaml).with_context(|| format!("in {}", path.display()))
    }

    /// The clock reading the replay starts from.
    pub fn start(&self) -> Result<Timestamp> {
        match self.start_at {
            Some(at) => Ok(at),
            None => Ok(Timestamp::parse(DEFAULT_START)?),
        }
    }

    /// Replay every step. Stops early only on an audit failure.
    pub fn replay(&self, engine: &BatchLifecycle, clock: &ManualClock) -> Result<Vec<StepOutcome>> {
        let mut outcomes = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let outcome = execute(index + 1, step, engine, clock)
                .with_context(|| format!("step {} ({})", index + 1, step.name()))?;
            tracing::debug!(step = outcome.step, accepted = outcome.accepted, "step replayed");
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

fn execute(
    index: usize,
    step: &Step,
    engine: &BatchLifecycle,
    clock: &ManualClock,
) -> Result<StepOutcome> {
    let at = engine.clock().now();
    let outcome = |batch_id: Option<&BatchId>,
                   result: Result<String, LifecycleError>|
     -> Result<StepOutcome> {
        let (accepted, detail, code) = match result {
            Ok(detail) => (true, detail, None),
            Err(LifecycleError::Rejected(r)) => (false, r.to_string(), Some(r.code())),
            Err(LifecycleError::Audit(e)) => bail!("audit log failure: {e}"),
        };
        Ok(StepOutcome {
            step: index,
            action: step.name(),
            at,
            batch_id: batch_id.cloned(),
            accepted,
            detail,
            code,
        })
    };

    match step {
        Step::ScheduleBatch { principal, batch_id } => outcome(
            Some(batch_id),
            engine
                .schedule_batch(principal, batch_id)
                .map(|b| b.status.to_string()),
        ),
        Step::StartBatch {
            principal,
            batch_id,
            vessel_id,
        } => outcome(
            Some(batch_id),
            engine
                .start_batch(principal, batch_id, vessel_id)
                .map(|b| format!("{} on {vessel_id} by {principal}", b.status)),
        ),
        Step::RequestQualityCheck { principal, batch_id } => outcome(
            Some(batch_id),
            engine
                .request_quality_check(principal, batch_id)
                .map(|b| b.status.to_string()),
        ),
        Step::LogProcessUpdate {
            principal,
            batch_id,
            spec_good,
        } => outcome(
            Some(batch_id),
            engine
                .log_process_update(principal, batch_id, *spec_good)
                .map(|b| {
                    if b.out_of_spec {
                        format!("{} (out of spec)", b.status)
                    } else {
                        b.status.to_string()
                    }
                }),
        ),
        Step::ManagerBypass { principal, batch_id } => outcome(
            Some(batch_id),
            engine
                .manager_bypass(principal, batch_id)
                .map(|b| format!("override recorded, {}", b.status)),
        ),
        Step::FinalizeBatch {
            principal,
            batch_id,
            approved,
        } => outcome(
            Some(batch_id),
            engine
                .finalize_batch(principal, batch_id, *approved)
                .map(|report| match report.outcome {
                    lotgate_state::FinalizeOutcome::Approved => report.batch.status.to_string(),
                    lotgate_state::FinalizeOutcome::Scrapped(reason) => {
                        format!("{} ({reason})", report.batch.status)
                    }
                }),
        ),
        Step::ApproveForShipping { principal, batch_id } => outcome(
            Some(batch_id),
            engine
                .approve_for_shipping(principal, batch_id)
                .map(|b| b.status.to_string()),
        ),
        Step::ToggleCircuitBreaker { principal } => outcome(
            None,
            engine
                .toggle_circuit_breaker(principal)
                .map(|engaged| if engaged { "engaged" } else { "released" }.to_string()),
        ),
        Step::AdvanceClock { minutes, seconds } => {
            let secs = minutes
                .checked_mul(60)
                .and_then(|m| m.checked_add(*seconds))
                .context("clock advance overflows")?;
            if secs < 0 {
                bail!("advance_clock cannot move the clock backwards");
            }
            clock.advance_secs(secs);
            outcome(None, Ok(format!("clock at {}", engine.clock().now())))
        }
        Step::SetTier { operator, tier } => {
            engine.registry().set_tier(operator.clone(), *tier);
            outcome(None, Ok(format!("{operator} at tier {tier}")))
        }
        Step::GrantRole { grantee, role } => {
            let added = engine.registry().grant_role(grantee.clone(), *role);
            let note = if added { "granted" } else { "already held" };
            outcome(None, Ok(format!("{role} {note} for {grantee}")))
        }
        Step::RevokeRole { grantee, role } => {
            let removed = engine.registry().revoke_role(grantee, *role);
            let note = if removed { "revoked" } else { "not held" };
            outcome(None, Ok(format!("{role} {note} for {grantee}")))
        }
    }
}
