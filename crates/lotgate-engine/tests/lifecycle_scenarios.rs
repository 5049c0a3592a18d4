//! End-to-end scenarios for the batch lifecycle: qualification, throttling,
//! out-of-spec escalation, shipping, and the circuit breaker.

mod common;

use common::{b, p, rejection, tier, v, Plant};
use lotgate_audit::{AuditDetail, AuditEventKind};
use lotgate_core::Rejection;
use lotgate_engine::Clock;
use lotgate_state::{BatchStatus, FinalizeOutcome, ScrapReason};

// =========================================================================
// Qualification
// =========================================================================

#[test]
fn under_tier_operator_rejected_until_certified() {
    let plant = Plant::new();
    plant.schedule("B1");

    let r = rejection(plant.engine.start_batch(&p("op2"), &b("B1"), &v("V3")));
    assert_eq!(
        r,
        Rejection::InsufficientTier {
            principal: p("op2"),
            vessel: v("V3"),
            tier: tier(2),
            required: tier(3),
        }
    );
    assert_eq!(
        plant.engine.batch(&b("B1")).unwrap().status,
        BatchStatus::Scheduled
    );

    plant.engine.registry().set_tier(p("op2"), tier(3));
    let batch = plant
        .engine
        .start_batch(&p("op2"), &b("B1"), &v("V3"))
        .unwrap();
    assert_eq!(batch.status, BatchStatus::InProcess);
    assert_eq!(batch.current_operator, Some(p("op2")));
}

#[test]
fn operator_hand_off_rebinds_operator() {
    let plant = Plant::new();
    plant.start("B1");
    plant.engine.registry().set_tier(p("op2"), tier(3));
    plant.advance_minutes(5);
    let batch = plant
        .engine
        .start_batch(&p("op2"), &b("B1"), &v("V3"))
        .unwrap();
    assert_eq!(batch.status, BatchStatus::InProcess);
    assert_eq!(batch.current_operator, Some(p("op2")));
    assert_eq!(batch.transitions.len(), 2);
}

// =========================================================================
// Telemetry throttle
// =========================================================================

#[test]
fn in_spec_update_throttled_for_twenty_minutes() {
    let plant = Plant::new();
    plant.start("B1");

    plant.advance_minutes(10);
    let r = rejection(plant.engine.log_process_update(&p("op3"), &b("B1"), true));
    assert!(matches!(
        r,
        Rejection::IntervalNotReached {
            elapsed_secs: 600,
            required_secs: 1200,
            ..
        }
    ));

    plant.advance_minutes(10);
    let batch = plant
        .engine
        .log_process_update(&p("op3"), &b("B1"), true)
        .unwrap();
    assert!(!batch.out_of_spec);
    assert_eq!(batch.last_event_at, plant.clock.now());
}

#[test]
fn out_of_spec_update_never_throttled() {
    let plant = Plant::new();
    plant.start("B1");
    for _ in 0..3 {
        let batch = plant
            .engine
            .log_process_update(&p("op3"), &b("B1"), false)
            .unwrap();
        assert!(batch.out_of_spec);
    }
    let alerts = plant
        .engine
        .audit()
        .events()
        .into_iter()
        .filter(|e| e.kind == AuditEventKind::OutOfSpecAlert)
        .count();
    assert_eq!(alerts, 3);
}

#[test]
fn out_of_spec_update_resets_throttle_window() {
    let plant = Plant::new();
    plant.start("B1");
    plant.advance_minutes(15);
    plant
        .engine
        .log_process_update(&p("op3"), &b("B1"), false)
        .unwrap();
    plant.advance_minutes(10);
    let r = rejection(plant.engine.log_process_update(&p("op3"), &b("B1"), true));
    assert_eq!(r.code(), "INTERVAL_NOT_REACHED");
}

#[test]
fn update_on_unknown_batch() {
    let plant = Plant::new();
    let r = rejection(plant.engine.log_process_update(&p("op3"), &b("B9"), false));
    assert_eq!(r, Rejection::UnknownBatch { batch_id: b("B9") });
}

#[test]
fn clock_moving_backwards_never_lowers_last_event() {
    let plant = Plant::new();
    plant.start("B1");
    let before = plant.engine.batch(&b("B1")).unwrap().last_event_at;
    plant.advance_minutes(-30);
    let batch = plant
        .engine
        .log_process_update(&p("op3"), &b("B1"), false)
        .unwrap();
    assert_eq!(batch.last_event_at, before);
}

// =========================================================================
// Finalize and ship
// =========================================================================

#[test]
fn out_of_spec_batch_finalized_approved_is_burned() {
    let plant = Plant::new();
    plant.start("B1");
    plant
        .engine
        .log_process_update(&p("op3"), &b("B1"), false)
        .unwrap();

    let report = plant
        .engine
        .finalize_batch(&p("qc"), &b("B1"), true)
        .unwrap();
    assert_eq!(report.batch.status, BatchStatus::Burned);
    assert_eq!(
        report.outcome,
        FinalizeOutcome::Scrapped(ScrapReason::OutOfSpec)
    );

    let events = plant.engine.audit().events_for_batch(&b("B1"));
    let scrap = events.last().unwrap();
    assert_eq!(scrap.kind, AuditEventKind::BatchScrapped);
    assert_eq!(
        scrap.detail,
        AuditDetail::Reason("out-of-spec readings recorded".into())
    );
}

#[test]
fn qc_rejection_burns_with_reason() {
    let plant = Plant::new();
    plant.start("B1");
    let report = plant
        .engine
        .finalize_batch(&p("qc"), &b("B1"), false)
        .unwrap();
    assert_eq!(report.batch.status, BatchStatus::Burned);
    let last = plant.engine.audit().last_n(1).remove(0);
    assert_eq!(
        last.detail,
        AuditDetail::Reason("rejected by quality control".into())
    );
}

#[test]
fn finalize_requires_qc_role() {
    let plant = Plant::new();
    plant.start("B1");
    let r = rejection(plant.engine.finalize_batch(&p("mgr"), &b("B1"), true));
    assert_eq!(
        r,
        Rejection::RoleDenied {
            principal: p("mgr"),
            role: lotgate_core::Role::QcTech,
        }
    );
}

#[test]
fn approving_a_scheduled_batch_is_invalid() {
    let plant = Plant::new();
    plant.schedule("B1");
    let r = rejection(plant.engine.finalize_batch(&p("qc"), &b("B1"), true));
    assert_eq!(r.code(), "INVALID_STATE_TRANSITION");
    assert_eq!(
        plant.engine.batch(&b("B1")).unwrap().status,
        BatchStatus::Scheduled
    );
}

#[test]
fn qc_can_scrap_scheduled_and_approved_batches() {
    let plant = Plant::new();
    plant.schedule("B1");
    plant.approve("B2");

    for id in ["B1", "B2"] {
        let report = plant
            .engine
            .finalize_batch(&p("qc"), &b(id), false)
            .unwrap();
        assert_eq!(report.batch.status, BatchStatus::Burned);
        assert_eq!(
            report.outcome,
            FinalizeOutcome::Scrapped(ScrapReason::RejectedByQualityControl)
        );
        let last = plant.engine.audit().events_for_batch(&b(id)).pop().unwrap();
        assert_eq!(last.kind, AuditEventKind::BatchScrapped);
    }

    let r = rejection(plant.engine.approve_for_shipping(&p("sup"), &b("B2")));
    assert_eq!(r.code(), "INVALID_STATE_TRANSITION");
}

#[test]
fn approved_batch_cannot_be_reapproved() {
    let plant = Plant::new();
    plant.approve("B1");
    let before = plant.engine.audit().len();
    let r = rejection(plant.engine.finalize_batch(&p("qc"), &b("B1"), true));
    assert_eq!(r.code(), "INVALID_STATE_TRANSITION");
    assert_eq!(plant.engine.audit().len(), before);
}

#[test]
fn full_happy_path_through_quality_check() {
    let plant = Plant::new();
    plant.start("B1");
    plant.advance_minutes(20);
    plant
        .engine
        .log_process_update(&p("op3"), &b("B1"), true)
        .unwrap();
    plant
        .engine
        .request_quality_check(&p("op3"), &b("B1"))
        .unwrap();
    plant
        .engine
        .finalize_batch(&p("qc"), &b("B1"), true)
        .unwrap();
    let batch = plant
        .engine
        .approve_for_shipping(&p("sup"), &b("B1"))
        .unwrap();
    assert_eq!(batch.status, BatchStatus::Shipped);

    let kinds: Vec<AuditEventKind> = plant
        .engine
        .audit()
        .events_for_batch(&b("B1"))
        .iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        [
            AuditEventKind::BatchScheduled,
            AuditEventKind::BatchStarted,
            AuditEventKind::ProcessUpdateVerified,
            AuditEventKind::QualityCheckRequested,
            AuditEventKind::BatchApproved,
            AuditEventKind::BatchShipped,
            AuditEventKind::ShippingAnnounced,
        ]
    );
}

#[test]
fn ship_rejected_for_every_status_but_approved() {
    let plant = Plant::new();

    plant.schedule("scheduled");
    plant.start("in-process");
    plant.start("qc");
    plant
        .engine
        .request_quality_check(&p("op3"), &b("qc"))
        .unwrap();
    plant.start("burned");
    plant
        .engine
        .finalize_batch(&p("qc"), &b("burned"), false)
        .unwrap();
    plant.approve("shipped");
    plant
        .engine
        .approve_for_shipping(&p("sup"), &b("shipped"))
        .unwrap();

    for id in ["scheduled", "in-process", "qc", "burned", "shipped"] {
        let before = plant.engine.batch(&b(id)).unwrap();
        let r = rejection(plant.engine.approve_for_shipping(&p("sup"), &b(id)));
        assert_eq!(r.code(), "INVALID_STATE_TRANSITION", "batch {id}");
        assert_eq!(plant.engine.batch(&b(id)).unwrap(), before);
    }
}

#[test]
fn ship_requires_supervisor() {
    let plant = Plant::new();
    plant.approve("B1");
    let r = rejection(plant.engine.approve_for_shipping(&p("mgr"), &b("B1")));
    assert_eq!(r, Rejection::NotSupervisor { principal: p("mgr") });
    assert_eq!(
        plant.engine.batch(&b("B1")).unwrap().status,
        BatchStatus::Approved
    );
}

#[test]
fn terminal_batches_reject_lifecycle_actions() {
    let plant = Plant::new();
    plant.start("B1");
    plant
        .engine
        .finalize_batch(&p("qc"), &b("B1"), false)
        .unwrap();

    let r = rejection(plant.engine.start_batch(&p("op3"), &b("B1"), &v("V3")));
    assert_eq!(r.code(), "INVALID_STATE_TRANSITION");
    for approved in [true, false] {
        let r = rejection(plant.engine.finalize_batch(&p("qc"), &b("B1"), approved));
        assert_eq!(r.code(), "INVALID_STATE_TRANSITION");
    }
    let r = rejection(plant.engine.request_quality_check(&p("qc"), &b("B1")));
    assert_eq!(r.code(), "INVALID_STATE_TRANSITION");
    assert_eq!(
        plant.engine.batch(&b("B1")).unwrap().status,
        BatchStatus::Burned
    );
}

// =========================================================================
// Circuit breaker
// =========================================================================

#[test]
fn halt_blocks_gated_actions_but_not_bypass() {
    let plant = Plant::new();
    plant.start("B1");
    plant.approve("B2");
    plant.halt();

    let cases = [
        rejection(plant.engine.schedule_batch(&p("mgr"), &b("B3"))),
        rejection(plant.engine.start_batch(&p("op3"), &b("B1"), &v("V3"))),
        rejection(plant.engine.request_quality_check(&p("op3"), &b("B1"))),
        rejection(plant.engine.log_process_update(&p("op3"), &b("B1"), false)),
        rejection(plant.engine.finalize_batch(&p("qc"), &b("B1"), true)),
        rejection(plant.engine.approve_for_shipping(&p("sup"), &b("B2"))),
    ];
    for r in cases {
        assert_eq!(r, Rejection::SystemHalted);
    }

    plant.engine.manager_bypass(&p("mgr"), &b("B1")).unwrap();
    assert_eq!(
        plant.engine.audit().last_n(1)[0].kind,
        AuditEventKind::ManagerOverride
    );
}

#[test]
fn toggle_twice_restores_and_records_both() {
    let plant = Plant::new();
    assert!(plant.engine.toggle_circuit_breaker(&p("sup")).unwrap());
    assert!(!plant.engine.toggle_circuit_breaker(&p("sup")).unwrap());
    assert!(!plant.engine.is_halted());

    let toggles: Vec<_> = plant
        .engine
        .audit()
        .events()
        .into_iter()
        .filter(|e| e.kind == AuditEventKind::CircuitBreakerToggled)
        .collect();
    assert_eq!(toggles.len(), 2);
    assert_eq!(
        toggles[0].metadata,
        Some(serde_json::json!({ "engaged": true }))
    );
    assert_eq!(
        toggles[1].metadata,
        Some(serde_json::json!({ "engaged": false }))
    );
}

#[test]
fn non_supervisor_toggle_changes_nothing() {
    let plant = Plant::new();
    for who in ["mgr", "qc", "op3"] {
        let r = rejection(plant.engine.toggle_circuit_breaker(&p(who)));
        assert_eq!(r.code(), "NOT_SUPERVISOR");
    }
    assert!(!plant.engine.is_halted());
    assert!(plant.engine.audit().is_empty());
}

#[test]
fn authorization_reported_before_halt() {
    let plant = Plant::new();
    plant.start("B1");
    plant.halt();
    let r = rejection(plant.engine.finalize_batch(&p("op3"), &b("B1"), true));
    assert_eq!(r.code(), "ROLE_DENIED");
}

#[test]
fn bypass_requires_manager() {
    let plant = Plant::new();
    plant.start("B1");
    let r = rejection(plant.engine.manager_bypass(&p("qc"), &b("B1")));
    assert_eq!(r.code(), "ROLE_DENIED");
    let r = rejection(plant.engine.manager_bypass(&p("mgr"), &b("B404")));
    assert_eq!(r.code(), "UNKNOWN_BATCH");
}
