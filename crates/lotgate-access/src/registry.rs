//! # Tier and Role Registries
//!
//! [`TierRegistry`] maps operators to competency tiers and vessels to minimum
//! tiers. [`RoleRegistry`] records role grants. Both are total: an unset
//! entry reads as [`Tier::NONE`] or "not granted".
//!
//! [`AccessRegistry`] owns both tables behind `parking_lot` locks together
//! with the supervisor identity, which is fixed at construction.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};

use lotgate_core::{PrincipalId, Role, Tier, VesselId};

/// Operator tiers and vessel requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRegistry {
    operators: BTreeMap<PrincipalId, Tier>,
    vessels: BTreeMap<VesselId, Tier>,
}

impl TierRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The tier held by `principal`, or [`Tier::NONE`] if unset.
    pub fn tier_of(&self, principal: &PrincipalId) -> Tier {
        self.operators.get(principal).copied().unwrap_or_default()
    }

    /// The minimum tier for `vessel`, or [`Tier::NONE`] if unset.
    pub fn requirement_of(&self, vessel: &VesselId) -> Tier {
        self.vessels.get(vessel).copied().unwrap_or_default()
    }

    /// Set an operator's tier. Setting [`Tier::NONE`] clears the entry.
    pub fn set_tier(&mut self, principal: PrincipalId, tier: Tier) {
        if tier.is_none() {
            self.operators.remove(&principal);
        } else {
            self.operators.insert(principal, tier);
        }
    }

    /// Set a vessel's minimum tier. Setting [`Tier::NONE`] clears the entry.
    pub fn set_vessel_requirement(&mut self, vessel: VesselId, tier: Tier) {
        if tier.is_none() {
            self.vessels.remove(&vessel);
        } else {
            self.vessels.insert(vessel, tier);
        }
    }

    /// Number of operators with a non-zero tier.
    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    /// Number of vessels with a non-zero requirement.
    pub fn vessel_count(&self) -> usize {
        self.vessels.len()
    }
}

/// Role grants per principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    grants: BTreeMap<PrincipalId, BTreeSet<Role>>,
}

impl RoleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `principal` holds `role`.
    pub fn has_role(&self, principal: &PrincipalId, role: Role) -> bool {
        self.grants
            .get(principal)
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Grant `role` to `principal`. Returns `false` if it was already held.
    pub fn grant(&mut self, principal: PrincipalId, role: Role) -> bool {
        self.grants.entry(principal).or_default().insert(role)
    }

    /// Revoke `role` from `principal`. Returns `false` if it was not held.
    pub fn revoke(&mut self, principal: &PrincipalId, role: Role) -> bool {
        let Some(roles) = self.grants.get_mut(principal) else {
            return false;
        };
        let removed = roles.remove(&role);
        if roles.is_empty() {
            self.grants.remove(principal);
        }
        removed
    }

    /// All roles held by `principal`, in a stable order.
    pub fn roles_of(&self, principal: &PrincipalId) -> Vec<Role> {
        self.grants
            .get(principal)
            .map(|roles| roles.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of principals with at least one grant.
    pub fn principal_count(&self) -> usize {
        self.grants.len()
    }
}

/// Shared owner of the tier and role tables and the supervisor identity.
///
/// Mutations take the corresponding write lock; guard evaluation holds read
/// locks for the duration of an operation (see [`crate::AccessControlGuard`]).
#[derive(Debug)]
pub struct AccessRegistry {
    supervisor: PrincipalId,
    tiers: RwLock<TierRegistry>,
    roles: RwLock<RoleRegistry>,
}

impl AccessRegistry {
    /// Create a registry with empty tables and the given supervisor.
    pub fn new(supervisor: PrincipalId) -> Self {
        Self::with_tables(supervisor, TierRegistry::new(), RoleRegistry::new())
    }

    /// Create a registry from pre-populated tables.
    pub fn with_tables(supervisor: PrincipalId, tiers: TierRegistry, roles: RoleRegistry) -> Self {
        Self {
            supervisor,
            tiers: RwLock::new(tiers),
            roles: RwLock::new(roles),
        }
    }

    /// The designated supervisor.
    pub fn supervisor(&self) -> &PrincipalId {
        &self.supervisor
    }

    /// Set an operator's competency tier.
    pub fn set_tier(&self, principal: PrincipalId, tier: Tier) {
        tracing::info!(principal = %principal, tier = %tier, "operator tier set");
        self.tiers.write().set_tier(principal, tier);
    }

    /// Set a vessel's minimum tier.
    pub fn set_vessel_requirement(&self, vessel: VesselId, tier: Tier) {
        tracing::info!(vessel = %vessel, tier = %tier, "vessel requirement set");
        self.tiers.write().set_vessel_requirement(vessel, tier);
    }

    /// Grant a role.
    pub fn grant_role(&self, principal: PrincipalId, role: Role) -> bool {
        tracing::info!(principal = %principal, role = %role, "role granted");
        self.roles.write().grant(principal, role)
    }

    /// Revoke a role.
    pub fn revoke_role(&self, principal: &PrincipalId, role: Role) -> bool {
        tracing::info!(principal = %principal, role = %role, "role revoked");
        self.roles.write().revoke(principal, role)
    }

    /// A copy of the tier table.
    pub fn tiers(&self) -> TierRegistry {
        self.tiers.read().clone()
    }

    /// A copy of the role table.
    pub fn roles(&self) -> RoleRegistry {
        self.roles.read().clone()
    }

    pub(crate) fn read_tiers(&self) -> RwLockReadGuard<'_, TierRegistry> {
        self.tiers.read()
    }

    pub(crate) fn read_roles(&self) -> RwLockReadGuard<'_, RoleRegistry> {
        self.roles.read()
    }
}
