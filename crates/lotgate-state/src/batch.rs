//! # Batch Lifecycle State Machine
//!
//! A [`Batch`] carries its status, the operator and vessel bound at start,
//! the sticky out-of-spec flag, and an ordered log of every status change.
//!
//! Every mutating method validates its status precondition first and
//! leaves the batch untouched when it returns `Err`.

use serde::{Deserialize, Serialize};

use lotgate_core::{BatchId, PrincipalId, Rejection, Timestamp, VesselId};

// ─── Status ──────────────────────────────────────────────────────────

/// The lifecycle status of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// Created, not yet started on a vessel.
    Scheduled,
    /// Running on a vessel under a qualified operator.
    InProcess,
    /// Handed to quality control for inspection.
    QualityCheck,
    /// Passed quality control; awaiting supervisor release.
    Approved,
    /// Scrapped (terminal).
    Burned,
    /// Released for shipping (terminal).
    Shipped,
}

impl BatchStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [BatchStatus; 6] = [
        Self::Scheduled,
        Self::InProcess,
        Self::QualityCheck,
        Self::Approved,
        Self::Burned,
        Self::Shipped,
    ];

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Burned | Self::Shipped)
    }

    /// The statuses reachable from this one in a single transition.
    pub fn valid_transitions(&self) -> &'static [BatchStatus] {
        match self {
            Self::Scheduled => &[Self::InProcess, Self::Burned],
            Self::InProcess => &[
                Self::InProcess,
                Self::QualityCheck,
                Self::Approved,
                Self::Burned,
            ],
            Self::QualityCheck => &[Self::Approved, Self::Burned],
            Self::Approved => &[Self::Shipped, Self::Burned],
            Self::Burned | Self::Shipped => &[],
        }
    }

    /// Whether `next` is a legal successor of this status.
    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// The canonical status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::InProcess => "IN_PROCESS",
            Self::QualityCheck => "QUALITY_CHECK",
            Self::Approved => "APPROVED",
            Self::Burned => "BURNED",
            Self::Shipped => "SHIPPED",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Actions ─────────────────────────────────────────────────────────

/// The externally requested actions on a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    /// Create the batch in `SCHEDULED`.
    ScheduleBatch,
    /// Bind operator and vessel, enter `IN_PROCESS`.
    StartBatch,
    /// Hand the batch to quality control.
    RequestQualityCheck,
    /// Ingest a telemetry reading.
    LogProcessUpdate,
    /// Record a physical-witness manager override.
    ManagerBypass,
    /// Quality-control decision.
    FinalizeBatch,
    /// Supervisor release for shipping.
    ApproveForShipping,
}

impl BatchAction {
    /// The canonical action name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScheduleBatch => "schedule_batch",
            Self::StartBatch => "start_batch",
            Self::RequestQualityCheck => "request_quality_check",
            Self::LogProcessUpdate => "log_process_update",
            Self::ManagerBypass => "manager_bypass",
            Self::FinalizeBatch => "finalize_batch",
            Self::ApproveForShipping => "approve_for_shipping",
        }
    }
}

impl std::fmt::Display for BatchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Finalize outcome ────────────────────────────────────────────────

/// Why a batch was scrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapReason {
    /// At least one out-of-spec reading was recorded. Takes precedence over
    /// the QC decision.
    OutOfSpec,
    /// Quality control did not approve the batch.
    RejectedByQualityControl,
}

impl ScrapReason {
    /// Human-readable reason recorded in the scrap event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfSpec => "out-of-spec readings recorded",
            Self::RejectedByQualityControl => "rejected by quality control",
        }
    }
}

impl std::fmt::Display for ScrapReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a quality-control decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "reason")]
pub enum FinalizeOutcome {
    /// The batch entered `APPROVED`.
    Approved,
    /// The batch entered `BURNED`.
    Scrapped(ScrapReason),
}

// ─── Transition record ───────────────────────────────────────────────

/// Record of a batch status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTransitionRecord {
    /// Status before the transition.
    pub from: BatchStatus,
    /// Status after the transition.
    pub to: BatchStatus,
    /// Principal whose request caused the transition.
    pub actor: PrincipalId,
    /// When the transition was accepted.
    pub at: Timestamp,
}

// ─── Batch ───────────────────────────────────────────────────────────

/// A production lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Unique batch identifier.
    pub id: BatchId,
    /// Current lifecycle status.
    pub status: BatchStatus,
    /// Operator who most recently started the batch. An audit pointer,
    /// not an ownership relation.
    pub current_operator: Option<PrincipalId>,
    /// Vessel bound at start.
    pub vessel_id: Option<VesselId>,
    /// Time of the last accepted lifecycle or telemetry event. Never decreases.
    pub last_event_at: Timestamp,
    /// Sticky: once set, the core never clears it.
    pub out_of_spec: bool,
    /// When the batch was scheduled.
    pub scheduled_at: Timestamp,
    /// Ordered log of status changes.
    pub transitions: Vec<BatchTransitionRecord>,
}

impl Batch {
    /// Create a batch in `SCHEDULED` with no operator or vessel.
    pub fn schedule(id: BatchId, at: Timestamp) -> Self {
        Self {
            id,
            status: BatchStatus::Scheduled,
            current_operator: None,
            vessel_id: None,
            last_event_at: at,
            out_of_spec: false,
            scheduled_at: at,
            transitions: Vec::new(),
        }
    }

    /// Whether the batch is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Start the batch on a vessel (`SCHEDULED | IN_PROCESS → IN_PROCESS`).
    ///
    /// Starting a batch that is already in process re-binds the operator and
    /// vessel (operator hand-off). Any later status is rejected.
    pub fn start(
        &mut self,
        operator: PrincipalId,
        vessel: VesselId,
        at: Timestamp,
    ) -> Result<(), Rejection> {
        self.require(
            &[BatchStatus::Scheduled, BatchStatus::InProcess],
            BatchAction::StartBatch,
        )?;
        self.current_operator = Some(operator.clone());
        self.vessel_id = Some(vessel);
        self.transition(BatchStatus::InProcess, operator, at);
        Ok(())
    }

    /// Hand the batch to quality control (`IN_PROCESS → QUALITY_CHECK`).
    pub fn request_quality_check(
        &mut self,
        actor: PrincipalId,
        at: Timestamp,
    ) -> Result<(), Rejection> {
        self.require(&[BatchStatus::InProcess], BatchAction::RequestQualityCheck)?;
        self.transition(BatchStatus::QualityCheck, actor, at);
        Ok(())
    }

    /// Record a telemetry reading. Valid in every status.
    ///
    /// An out-of-spec reading sets the sticky flag. Throttling is the
    /// caller's concern.
    pub fn record_telemetry(&mut self, spec_good: bool, at: Timestamp) {
        if !spec_good {
            self.out_of_spec = true;
        }
        self.touch(at);
    }

    /// Apply the quality-control decision from any non-terminal status.
    ///
    /// The batch is approved only if QC approves **and** no out-of-spec
    /// reading was ever recorded. QC cannot clear the out-of-spec flag.
    /// Scrapping is allowed from every non-terminal status; approval only
    /// from `IN_PROCESS | QUALITY_CHECK`, so `SCHEDULED → APPROVED` and
    /// re-approving an approved batch are rejected.
    pub fn finalize(
        &mut self,
        approved: bool,
        actor: PrincipalId,
        at: Timestamp,
    ) -> Result<FinalizeOutcome, Rejection> {
        let outcome = if self.out_of_spec {
            FinalizeOutcome::Scrapped(ScrapReason::OutOfSpec)
        } else if !approved {
            FinalizeOutcome::Scrapped(ScrapReason::RejectedByQualityControl)
        } else {
            FinalizeOutcome::Approved
        };
        let next = match outcome {
            FinalizeOutcome::Approved => BatchStatus::Approved,
            FinalizeOutcome::Scrapped(_) => BatchStatus::Burned,
        };
        if !self.status.can_transition_to(next) {
            return Err(self.invalid(BatchAction::FinalizeBatch));
        }
        self.transition(next, actor, at);
        Ok(outcome)
    }

    /// Release the batch for shipping (`APPROVED → SHIPPED`).
    pub fn ship(&mut self, actor: PrincipalId, at: Timestamp) -> Result<(), Rejection> {
        self.require(&[BatchStatus::Approved], BatchAction::ApproveForShipping)?;
        self.transition(BatchStatus::Shipped, actor, at);
        Ok(())
    }

    /// Advance `last_event_at`, never moving it backwards.
    pub fn touch(&mut self, at: Timestamp) {
        if at > self.last_event_at {
            self.last_event_at = at;
        }
    }

    fn require(&self, allowed: &[BatchStatus], action: BatchAction) -> Result<(), Rejection> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: BatchAction) -> Rejection {
        Rejection::InvalidStateTransition {
            batch_id: self.id.clone(),
            from: self.status.to_string(),
            action: action.to_string(),
        }
    }

    fn transition(&mut self, to: BatchStatus, actor: PrincipalId, at: Timestamp) {
        debug_assert!(self.status.can_transition_to(to));
        self.transitions.push(BatchTransitionRecord {
            from: self.status,
            to,
            actor,
            at,
        });
        self.status = to;
        self.touch(at);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
