//! # Access Control Guard
//!
//! Guard predicates are evaluated against an [`AccessSnapshot`], which holds
//! read guards on the halt switch and both registry tables. Every check made
//! during one operation therefore sees the same view, and that view cannot
//! change until the snapshot is dropped.
//!
//! Lock order is halt switch, then tiers, then roles.

use std::sync::Arc;

use parking_lot::RwLockReadGuard;

use lotgate_core::{PrincipalId, Rejection, Role, VesselId};

use crate::halt::EmergencyHaltSwitch;
use crate::registry::{AccessRegistry, RoleRegistry, TierRegistry};

/// Entry point for guard evaluation.
#[derive(Debug, Clone)]
pub struct AccessControlGuard {
    registry: Arc<AccessRegistry>,
    halt: Arc<EmergencyHaltSwitch>,
}

impl AccessControlGuard {
    /// Create a guard over shared registry and halt switch.
    pub fn new(registry: Arc<AccessRegistry>, halt: Arc<EmergencyHaltSwitch>) -> Self {
        Self { registry, halt }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Arc<AccessRegistry> {
        &self.registry
    }

    /// The underlying halt switch.
    pub fn halt_switch(&self) -> &Arc<EmergencyHaltSwitch> {
        &self.halt
    }

    /// Take a consistent snapshot for the duration of one operation.
    pub fn snapshot(&self) -> AccessSnapshot<'_> {
        let halted = self.halt.hold();
        let tiers = self.registry.read_tiers();
        let roles = self.registry.read_roles();
        AccessSnapshot {
            halted,
            tiers,
            roles,
            supervisor: self.registry.supervisor(),
        }
    }

    /// Supervisor check that needs no snapshot. The supervisor identity is
    /// immutable, so this is safe to call while holding the halt write lock.
    pub fn check_supervisor(&self, principal: &PrincipalId) -> Result<(), Rejection> {
        supervisor_check(self.registry.supervisor(), principal)
    }
}

/// A held, read-only view of the access state.
pub struct AccessSnapshot<'a> {
    halted: RwLockReadGuard<'a, bool>,
    tiers: RwLockReadGuard<'a, TierRegistry>,
    roles: RwLockReadGuard<'a, RoleRegistry>,
    supervisor: &'a PrincipalId,
}

impl AccessSnapshot<'_> {
    /// Ok iff the principal's tier meets the vessel's requirement.
    pub fn check_qualified(
        &self,
        principal: &PrincipalId,
        vessel: &VesselId,
    ) -> Result<(), Rejection> {
        let tier = self.tiers.tier_of(principal);
        let required = self.tiers.requirement_of(vessel);
        if tier >= required {
            Ok(())
        } else {
            Err(Rejection::InsufficientTier {
                principal: principal.clone(),
                vessel: vessel.clone(),
                tier,
                required,
            })
        }
    }

    /// Ok iff the principal holds `role`.
    pub fn check_role(&self, principal: &PrincipalId, role: Role) -> Result<(), Rejection> {
        if self.roles.has_role(principal, role) {
            Ok(())
        } else {
            Err(Rejection::RoleDenied {
                principal: principal.clone(),
                role,
            })
        }
    }

    /// Ok iff the principal is the supervisor.
    pub fn check_supervisor(&self, principal: &PrincipalId) -> Result<(), Rejection> {
        supervisor_check(self.supervisor, principal)
    }

    /// Ok iff the circuit breaker is disengaged.
    pub fn check_not_halted(&self) -> Result<(), Rejection> {
        if *self.halted {
            Err(Rejection::SystemHalted)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for AccessSnapshot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessSnapshot")
            .field("halted", &*self.halted)
            .field("supervisor", self.supervisor)
            .finish_non_exhaustive()
    }
}

fn supervisor_check(supervisor: &PrincipalId, principal: &PrincipalId) -> Result<(), Rejection> {
    if principal == supervisor {
        Ok(())
    } else {
        Err(Rejection::NotSupervisor {
            principal: principal.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotgate_core::Tier;

    fn principal(s: &str) -> PrincipalId {
        PrincipalId::new(s).unwrap()
    }

    fn vessel(s: &str) -> VesselId {
        VesselId::new(s).unwrap()
    }

    fn guard() -> AccessControlGuard {
        let registry = Arc::new(AccessRegistry::new(principal("sup")));
        registry.set_tier(principal("op-2"), Tier::new(2).unwrap());
        registry.set_tier(principal("op-3"), Tier::new(3).unwrap());
        registry.set_vessel_requirement(vessel("V3"), Tier::new(3).unwrap());
        registry.grant_role(principal("mgr"), Role::Manager);
        AccessControlGuard::new(registry, Arc::new(EmergencyHaltSwitch::new()))
    }

    #[test]
    fn qualification_compares_tiers() {
        let g = guard();
        let snap = g.snapshot();
        assert!(snap.check_qualified(&principal("op-3"), &vessel("V3")).is_ok());
        match snap.check_qualified(&principal("op-2"), &vessel("V3")) {
            Err(Rejection::InsufficientTier { tier, required, .. }) => {
                assert_eq!(tier.level(), 2);
                assert_eq!(required.level(), 3);
            }
            other => panic!("expected InsufficientTier, got {other:?}"),
        }
    }

    #[test]
    fn unset_vessel_admits_uncertified_operator() {
        let g = guard();
        let snap = g.snapshot();
        assert!(snap
            .check_qualified(&principal("nobody"), &vessel("V-free"))
            .is_ok());
    }

    #[test]
    fn role_check_uses_grants() {
        let g = guard();
        let snap = g.snapshot();
        assert!(snap.check_role(&principal("mgr"), Role::Manager).is_ok());
        assert_eq!(
            snap.check_role(&principal("mgr"), Role::QcTech),
            Err(Rejection::RoleDenied {
                principal: principal("mgr"),
                role: Role::QcTech,
            })
        );
    }

    #[test]
    fn supervisor_check() {
        let g = guard();
        assert!(g.check_supervisor(&principal("sup")).is_ok());
        assert!(matches!(
            g.snapshot().check_supervisor(&principal("mgr")),
            Err(Rejection::NotSupervisor { .. })
        ));
    }

    #[test]
    fn halt_check_reflects_switch() {
        let g = guard();
        assert!(g.snapshot().check_not_halted().is_ok());
        g.halt_switch().toggle_with(|_| Ok::<(), ()>(())).unwrap();
        assert_eq!(g.snapshot().check_not_halted(), Err(Rejection::SystemHalted));
    }

    #[test]
    fn tier_change_visible_to_next_snapshot() {
        let g = guard();
        assert!(g
            .snapshot()
            .check_qualified(&principal("op-2"), &vessel("V3"))
            .is_err());
        g.registry().set_tier(principal("op-2"), Tier::new(3).unwrap());
        assert!(g
            .snapshot()
            .check_qualified(&principal("op-2"), &vessel("V3"))
            .is_ok());
    }
}
