//! # Batch Lifecycle Engine
//!
//! Every action runs in two phases:
//!
//! 1. **Check.** Take an [`AccessSnapshot`] and evaluate the action's
//!    guards in order. The snapshot stays held until the action returns, so
//!    registry changes and circuit-breaker toggles wait for it.
//! 2. **Apply.** Lock the batch, stage the mutation on a copy, append the
//!    audit events, then commit the copy. A rejection or an audit failure
//!    leaves the batch exactly as it was.
//!
//! Check order: guards, batch existence, status precondition, throttle.
//! The first failing check is the one reported.
//!
//! [`AccessSnapshot`]: lotgate_access::AccessSnapshot

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;

use lotgate_access::{AccessControlGuard, AccessRegistry, EmergencyHaltSwitch};
use lotgate_audit::{AuditDraft, AuditError, AuditEventKind, AuditSink, InMemoryAuditLog};
use lotgate_core::{BatchId, PrincipalId, Rejection, Role, Timestamp, VesselId};
use lotgate_state::{Batch, BatchAction, FinalizeOutcome};

use crate::clock::{Clock, SystemClock};
use crate::store::BatchStore;
use crate::throttle::TelemetryThrottle;

/// Why an action did not take effect.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A guard, precondition, or the throttle refused the request.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// The audit sink failed. Nothing was committed.
    #[error("audit failure: {0}")]
    Audit(#[from] AuditError),
}

impl LifecycleError {
    /// The rejection, if this was a business refusal.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(r) => Some(r),
            Self::Audit(_) => None,
        }
    }
}

/// Result of a quality-control decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeReport {
    /// The batch after the decision.
    pub batch: Batch,
    /// Approved or scrapped, with reason.
    pub outcome: FinalizeOutcome,
}

/// The permissioned batch state machine.
#[derive(Debug)]
pub struct BatchLifecycle {
    guard: AccessControlGuard,
    store: BatchStore,
    audit: Arc<dyn AuditSink>,
    throttle: TelemetryThrottle,
    clock: Arc<dyn Clock>,
}

impl BatchLifecycle {
    /// Assemble an engine from its collaborators.
    pub fn new(
        registry: Arc<AccessRegistry>,
        halt: Arc<EmergencyHaltSwitch>,
        audit: Arc<dyn AuditSink>,
        throttle: TelemetryThrottle,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            guard: AccessControlGuard::new(registry, halt),
            store: BatchStore::new(),
            audit,
            throttle,
            clock,
        }
    }

    /// An engine with an in-memory audit log, the default throttle, and the
    /// system clock.
    pub fn with_registry(registry: Arc<AccessRegistry>) -> Self {
        Self::new(
            registry,
            Arc::new(EmergencyHaltSwitch::new()),
            Arc::new(InMemoryAuditLog::new()),
            TelemetryThrottle::default(),
            Arc::new(SystemClock),
        )
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Create a batch in `SCHEDULED`. Requires `MANAGER`; halt-gated.
    pub fn schedule_batch(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
    ) -> Result<Batch, LifecycleError> {
        let result = self.schedule_inner(principal, batch_id);
        self.observe(BatchAction::ScheduleBatch, principal, batch_id, &result);
        result
    }

    fn schedule_inner(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
    ) -> Result<Batch, LifecycleError> {
        let access = self.guard.snapshot();
        access.check_role(principal, Role::Manager)?;
        access.check_not_halted()?;

        self.store.insert_new(batch_id, || {
            let now = self.clock.now();
            let batch = Batch::schedule(batch_id.clone(), now);
            self.audit.append(AuditDraft::message(
                AuditEventKind::BatchScheduled,
                batch_id,
                principal,
                "Batch scheduled",
                now,
            ))?;
            Ok::<_, LifecycleError>(batch)
        })
    }

    /// Start a batch on a vessel. Requires the principal's tier to meet the
    /// vessel requirement; halt-gated. Restarting an in-process batch hands
    /// it to a new operator.
    pub fn start_batch(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
        vessel_id: &VesselId,
    ) -> Result<Batch, LifecycleError> {
        let result = self.start_inner(principal, batch_id, vessel_id);
        self.observe(BatchAction::StartBatch, principal, batch_id, &result);
        result
    }

    fn start_inner(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
        vessel_id: &VesselId,
    ) -> Result<Batch, LifecycleError> {
        let access = self.guard.snapshot();
        access.check_qualified(principal, vessel_id)?;
        access.check_not_halted()?;

        self.apply(batch_id, |batch, now| {
            batch.start(principal.clone(), vessel_id.clone(), now)?;
            let event = AuditDraft::message(
                AuditEventKind::BatchStarted,
                batch_id,
                principal,
                "Batch started",
                now,
            )
            .with_metadata(json!({
                "operator": principal,
                "vessel_id": vessel_id,
            }));
            Ok(((), vec![event]))
        })
        .map(|((), batch)| batch)
    }

    /// Hand an in-process batch to quality control. The principal must be
    /// the batch's current operator or hold `QC_TECH`; halt-gated.
    pub fn request_quality_check(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
    ) -> Result<Batch, LifecycleError> {
        let result = self.quality_check_inner(principal, batch_id);
        self.observe(BatchAction::RequestQualityCheck, principal, batch_id, &result);
        result
    }

    fn quality_check_inner(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
    ) -> Result<Batch, LifecycleError> {
        let access = self.guard.snapshot();
        access.check_not_halted()?;

        self.apply(batch_id, |batch, now| {
            let is_operator = batch.current_operator.as_ref() == Some(principal);
            if !is_operator {
                access.check_role(principal, Role::QcTech)?;
            }
            batch.request_quality_check(principal.clone(), now)?;
            let event = AuditDraft::message(
                AuditEventKind::QualityCheckRequested,
                batch_id,
                principal,
                "Quality check requested",
                now,
            );
            Ok(((), vec![event]))
        })
        .map(|((), batch)| batch)
    }

    /// Ingest a telemetry reading. Halt-gated; in-spec readings are
    /// throttled, out-of-spec readings are not and set the sticky flag.
    pub fn log_process_update(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
        spec_good: bool,
    ) -> Result<Batch, LifecycleError> {
        let result = self.process_update_inner(principal, batch_id, spec_good);
        self.observe(BatchAction::LogProcessUpdate, principal, batch_id, &result);
        result
    }

    fn process_update_inner(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
        spec_good: bool,
    ) -> Result<Batch, LifecycleError> {
        let access = self.guard.snapshot();
        access.check_not_halted()?;

        self.apply(batch_id, |batch, now| {
            self.throttle
                .admit(batch_id, batch.last_event_at, now, spec_good)?;
            batch.record_telemetry(spec_good, now);
            let event = if spec_good {
                AuditDraft::message(
                    AuditEventKind::ProcessUpdateVerified,
                    batch_id,
                    principal,
                    "Process update verified",
                    now,
                )
            } else {
                AuditDraft::message(
                    AuditEventKind::OutOfSpecAlert,
                    batch_id,
                    principal,
                    "Out-of-spec reading recorded",
                    now,
                )
            };
            Ok(((), vec![event.with_metadata(json!({ "spec_good": spec_good }))]))
        })
        .map(|((), batch)| batch)
    }

    /// Record a physical-witness manager override. Requires `MANAGER`.
    /// Not halt-gated and changes nothing beyond the audit log.
    pub fn manager_bypass(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
    ) -> Result<Batch, LifecycleError> {
        let result = self.bypass_inner(principal, batch_id);
        self.observe(BatchAction::ManagerBypass, principal, batch_id, &result);
        result
    }

    fn bypass_inner(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
    ) -> Result<Batch, LifecycleError> {
        let access = self.guard.snapshot();
        access.check_role(principal, Role::Manager)?;

        self.apply(batch_id, |batch, now| {
            let event = AuditDraft::message(
                AuditEventKind::ManagerOverride,
                batch_id,
                principal,
                "Manager override: physical witness recorded",
                now,
            )
            .with_metadata(json!({ "status": batch.status }));
            Ok(((), vec![event]))
        })
        .map(|((), batch)| batch)
    }

    /// Quality-control decision. Requires `QC_TECH`; halt-gated. An
    /// out-of-spec batch is scrapped even when `approved` is true.
    pub fn finalize_batch(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
        approved: bool,
    ) -> Result<FinalizeReport, LifecycleError> {
        let result = self.finalize_inner(principal, batch_id, approved);
        self.observe(BatchAction::FinalizeBatch, principal, batch_id, &result);
        result
    }

    fn finalize_inner(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
        approved: bool,
    ) -> Result<FinalizeReport, LifecycleError> {
        let access = self.guard.snapshot();
        access.check_role(principal, Role::QcTech)?;
        access.check_not_halted()?;

        self.apply(batch_id, |batch, now| {
            let outcome = batch.finalize(approved, principal.clone(), now)?;
            let event = match outcome {
                FinalizeOutcome::Approved => AuditDraft::message(
                    AuditEventKind::BatchApproved,
                    batch_id,
                    principal,
                    "Batch approved by quality control",
                    now,
                ),
                FinalizeOutcome::Scrapped(reason) => AuditDraft::reason(
                    AuditEventKind::BatchScrapped,
                    batch_id,
                    principal,
                    reason.as_str(),
                    now,
                ),
            };
            Ok((outcome, vec![event.with_metadata(json!({ "qc_approved": approved }))]))
        })
        .map(|(outcome, batch)| FinalizeReport { batch, outcome })
    }

    /// Release an approved batch for shipping. Supervisor only; halt-gated.
    /// Records the shipment and its announcement as one append.
    pub fn approve_for_shipping(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
    ) -> Result<Batch, LifecycleError> {
        let result = self.ship_inner(principal, batch_id);
        self.observe(BatchAction::ApproveForShipping, principal, batch_id, &result);
        result
    }

    fn ship_inner(
        &self,
        principal: &PrincipalId,
        batch_id: &BatchId,
    ) -> Result<Batch, LifecycleError> {
        let access = self.guard.snapshot();
        access.check_supervisor(principal)?;
        access.check_not_halted()?;

        self.apply(batch_id, |batch, now| {
            batch.ship(principal.clone(), now)?;
            let events = vec![
                AuditDraft::reason(
                    AuditEventKind::BatchShipped,
                    batch_id,
                    principal,
                    "approved for shipping by supervisor",
                    now,
                ),
                AuditDraft::message(
                    AuditEventKind::ShippingAnnounced,
                    batch_id,
                    principal,
                    "Batch shipped",
                    now,
                ),
            ];
            Ok(((), events))
        })
        .map(|((), batch)| batch)
    }

    /// Flip the circuit breaker. Supervisor only; never halt-gated.
    /// Returns the new state.
    pub fn toggle_circuit_breaker(&self, principal: &PrincipalId) -> Result<bool, LifecycleError> {
        if let Err(rejection) = self.guard.check_supervisor(principal) {
            tracing::warn!(
                principal = %principal,
                code = rejection.code(),
                "circuit breaker toggle rejected"
            );
            return Err(rejection.into());
        }
        self.guard
            .halt_switch()
            .toggle_with(|engaged| {
                let now = self.clock.now();
                self.audit
                    .append(AuditDraft::circuit_breaker(principal, engaged, now))
                    .map(|_| ())
            })
            .map_err(|e| {
                tracing::error!(principal = %principal, error = %e, "circuit breaker toggle not recorded");
                LifecycleError::Audit(e)
            })
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// A copy of one batch.
    pub fn batch(&self, batch_id: &BatchId) -> Option<Batch> {
        self.store.get(batch_id)
    }

    /// Copies of all batches, ordered by id.
    pub fn batches(&self) -> Vec<Batch> {
        self.store.list()
    }

    /// Whether the circuit breaker is engaged.
    pub fn is_halted(&self) -> bool {
        self.guard.halt_switch().is_engaged()
    }

    /// The audit log.
    pub fn audit(&self) -> &Arc<dyn AuditSink> {
        &self.audit
    }

    /// The access registry, for tier and role administration.
    pub fn registry(&self) -> &Arc<AccessRegistry> {
        self.guard.registry()
    }

    /// The configured telemetry throttle.
    pub fn throttle(&self) -> TelemetryThrottle {
        self.throttle
    }

    /// The engine clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Stage `f` on a copy of the batch, append its events, then commit.
    fn apply<R>(
        &self,
        batch_id: &BatchId,
        f: impl FnOnce(&mut Batch, Timestamp) -> Result<(R, Vec<AuditDraft>), Rejection>,
    ) -> Result<(R, Batch), LifecycleError> {
        let cell = self.store.cell(batch_id)?;
        let mut current = cell.lock();
        let now = self.clock.now();

        let mut staged = current.clone();
        let (output, events) = f(&mut staged, now)?;
        self.audit.append_all(events)?;

        *current = staged.clone();
        Ok((output, staged))
    }

    fn observe<T>(
        &self,
        action: BatchAction,
        principal: &PrincipalId,
        batch_id: &BatchId,
        result: &Result<T, LifecycleError>,
    ) {
        match result {
            Ok(_) => tracing::info!(
                action = %action,
                principal = %principal,
                batch_id = %batch_id,
                "action accepted"
            ),
            Err(LifecycleError::Rejected(rejection)) => tracing::warn!(
                action = %action,
                principal = %principal,
                batch_id = %batch_id,
                code = rejection.code(),
                reason = %rejection,
                "action rejected"
            ),
            Err(LifecycleError::Audit(e)) => tracing::error!(
                action = %action,
                principal = %principal,
                batch_id = %batch_id,
                error = %e,
                "audit append failed, action aborted"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use lotgate_core::Tier;
    use lotgate_state::{BatchStatus, ScrapReason};

    struct Fixture {
        engine: BatchLifecycle,
        clock: Arc<ManualClock>,
    }

    fn p(s: &str) -> PrincipalId {
        PrincipalId::new(s).unwrap()
    }

    fn b(s: &str) -> BatchId {
        BatchId::new(s).unwrap()
    }

    fn v(s: &str) -> VesselId {
        VesselId::new(s).unwrap()
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(AccessRegistry::new(p("sup")));
        registry.set_tier(p("op"), Tier::new(3).unwrap());
        registry.set_vessel_requirement(v("V1"), Tier::new(3).unwrap());
        registry.grant_role(p("mgr"), Role::Manager);
        registry.grant_role(p("qc"), Role::QcTech);
        let clock = Arc::new(ManualClock::new(
            Timestamp::parse("2026-01-15T08:00:00Z").unwrap(),
        ));
        let engine = BatchLifecycle::new(
            registry,
            Arc::new(EmergencyHaltSwitch::new()),
            Arc::new(InMemoryAuditLog::new()),
            TelemetryThrottle::default(),
            clock.clone(),
        );
        Fixture { engine, clock }
    }

    fn started(f: &Fixture) {
        f.engine.schedule_batch(&p("mgr"), &b("B1")).unwrap();
        f.engine.start_batch(&p("op"), &b("B1"), &v("V1")).unwrap();
    }

    fn rejection<T: std::fmt::Debug>(result: Result<T, LifecycleError>) -> Rejection {
        match result {
            Err(LifecycleError::Rejected(r)) => r,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn schedule_requires_manager() {
        let f = fixture();
        let r = rejection(f.engine.schedule_batch(&p("op"), &b("B1")));
        assert_eq!(r.code(), "ROLE_DENIED");
        assert!(f.engine.batch(&b("B1")).is_none());
        assert!(f.engine.audit().is_empty());
    }

    #[test]
    fn duplicate_schedule_rejected() {
        let f = fixture();
        f.engine.schedule_batch(&p("mgr"), &b("B1")).unwrap();
        let r = rejection(f.engine.schedule_batch(&p("mgr"), &b("B1")));
        assert_eq!(r.code(), "DUPLICATE_BATCH");
        assert_eq!(f.engine.audit().len(), 1);
    }

    #[test]
    fn start_records_operator_and_vessel() {
        let f = fixture();
        started(&f);
        let batch = f.engine.batch(&b("B1")).unwrap();
        assert_eq!(batch.status, BatchStatus::InProcess);
        assert_eq!(batch.current_operator, Some(p("op")));
        assert_eq!(batch.vessel_id, Some(v("V1")));
        let last = f.engine.audit().last_n(1);
        assert_eq!(last[0].kind, AuditEventKind::BatchStarted);
        assert_eq!(last[0].detail.text(), "Batch started");
    }

    #[test]
    fn start_unknown_batch() {
        let f = fixture();
        let r = rejection(f.engine.start_batch(&p("op"), &b("B404"), &v("V1")));
        assert_eq!(r.code(), "UNKNOWN_BATCH");
    }

    #[test]
    fn guard_failure_reported_before_unknown_batch() {
        let f = fixture();
        let r = rejection(f.engine.finalize_batch(&p("op"), &b("B404"), true));
        assert_eq!(r.code(), "ROLE_DENIED");
    }

    #[test]
    fn quality_check_by_operator_or_qc() {
        let f = fixture();
        started(&f);
        let r = rejection(f.engine.request_quality_check(&p("mgr"), &b("B1")));
        assert_eq!(r.code(), "ROLE_DENIED");
        let batch = f.engine.request_quality_check(&p("op"), &b("B1")).unwrap();
        assert_eq!(batch.status, BatchStatus::QualityCheck);
        let r = rejection(f.engine.request_quality_check(&p("qc"), &b("B1")));
        assert_eq!(r.code(), "INVALID_STATE_TRANSITION");
    }

    #[test]
    fn bypass_leaves_batch_untouched() {
        let f = fixture();
        started(&f);
        let before = f.engine.batch(&b("B1")).unwrap();
        f.clock.advance_secs(60);
        let after = f.engine.manager_bypass(&p("mgr"), &b("B1")).unwrap();
        assert_eq!(before, after);
        let last = f.engine.audit().last_n(1);
        assert_eq!(last[0].kind, AuditEventKind::ManagerOverride);
    }

    #[test]
    fn finalize_out_of_spec_scraps() {
        let f = fixture();
        started(&f);
        f.engine.log_process_update(&p("op"), &b("B1"), false).unwrap();
        let report = f.engine.finalize_batch(&p("qc"), &b("B1"), true).unwrap();
        assert_eq!(report.outcome, FinalizeOutcome::Scrapped(ScrapReason::OutOfSpec));
        assert_eq!(report.batch.status, BatchStatus::Burned);
        let last = f.engine.audit().last_n(1);
        assert_eq!(last[0].kind, AuditEventKind::BatchScrapped);
        assert_eq!(last[0].detail.text(), "out-of-spec readings recorded");
    }

    #[test]
    fn ship_emits_two_events() {
        let f = fixture();
        started(&f);
        f.engine.finalize_batch(&p("qc"), &b("B1"), true).unwrap();
        let before = f.engine.audit().len();
        let batch = f.engine.approve_for_shipping(&p("sup"), &b("B1")).unwrap();
        assert_eq!(batch.status, BatchStatus::Shipped);
        let tail = f.engine.audit().last_n(2);
        assert_eq!(f.engine.audit().len(), before + 2);
        assert_eq!(tail[0].kind, AuditEventKind::BatchShipped);
        assert_eq!(tail[1].kind, AuditEventKind::ShippingAnnounced);
    }

    #[test]
    fn toggle_requires_supervisor() {
        let f = fixture();
        let r = rejection(f.engine.toggle_circuit_breaker(&p("mgr")));
        assert_eq!(r.code(), "NOT_SUPERVISOR");
        assert!(!f.engine.is_halted());
        assert!(f.engine.toggle_circuit_breaker(&p("sup")).unwrap());
        assert!(f.engine.is_halted());
    }
}
