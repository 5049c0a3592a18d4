//! Shared plant fixture for engine integration tests.
//!
//! Principals: `sup` (supervisor), `mgr` (MANAGER), `qc` (QC_TECH),
//! `op3` (tier 3), `op2` (tier 2). Vessel `V3` requires tier 3.

#![allow(dead_code)]

use std::sync::Arc;

use lotgate_access::{AccessRegistry, EmergencyHaltSwitch};
use lotgate_audit::{AuditSink, InMemoryAuditLog};
use lotgate_core::{BatchId, PrincipalId, Rejection, Role, Tier, Timestamp, VesselId};
use lotgate_engine::{BatchLifecycle, LifecycleError, ManualClock, TelemetryThrottle};

pub const T0: &str = "2026-01-15T08:00:00Z";

pub fn p(s: &str) -> PrincipalId {
    PrincipalId::new(s).unwrap()
}

pub fn b(s: &str) -> BatchId {
    BatchId::new(s).unwrap()
}

pub fn v(s: &str) -> VesselId {
    VesselId::new(s).unwrap()
}

pub fn tier(level: u8) -> Tier {
    Tier::new(level).unwrap()
}

pub struct Plant {
    pub engine: BatchLifecycle,
    pub clock: Arc<ManualClock>,
}

impl Plant {
    pub fn new() -> Self {
        Self::with_sink(Arc::new(InMemoryAuditLog::new()))
    }

    pub fn with_sink(sink: Arc<dyn AuditSink>) -> Self {
        let registry = Arc::new(AccessRegistry::new(p("sup")));
        registry.set_tier(p("op3"), tier(3));
        registry.set_tier(p("op2"), tier(2));
        registry.set_vessel_requirement(v("V3"), tier(3));
        registry.grant_role(p("mgr"), Role::Manager);
        registry.grant_role(p("qc"), Role::QcTech);
        let clock = Arc::new(ManualClock::new(Timestamp::parse(T0).unwrap()));
        let engine = BatchLifecycle::new(
            registry,
            Arc::new(EmergencyHaltSwitch::new()),
            sink,
            TelemetryThrottle::default(),
            clock.clone(),
        );
        Self { engine, clock }
    }

    pub fn schedule(&self, id: &str) {
        self.engine.schedule_batch(&p("mgr"), &b(id)).unwrap();
    }

    pub fn start(&self, id: &str) {
        self.schedule(id);
        self.engine.start_batch(&p("op3"), &b(id), &v("V3")).unwrap();
    }

    pub fn approve(&self, id: &str) {
        self.start(id);
        self.engine.finalize_batch(&p("qc"), &b(id), true).unwrap();
    }

    pub fn halt(&self) {
        assert!(self.engine.toggle_circuit_breaker(&p("sup")).unwrap());
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.clock.advance_secs(minutes * 60);
    }
}

pub fn rejection<T: std::fmt::Debug>(result: Result<T, LifecycleError>) -> Rejection {
    match result {
        Err(LifecycleError::Rejected(r)) => r,
        other => panic!("expected a rejection, got {other:?}"),
    }
}
