//! # lotgate-access: Guards, Registries, and the Halt Switch
//!
//! Decides whether a principal may perform an action:
//!
//! - [`TierRegistry`] / [`RoleRegistry`]: competency tiers, vessel
//!   requirements, and role grants, owned by an [`AccessRegistry`].
//! - [`EmergencyHaltSwitch`]: the global circuit breaker.
//! - [`AccessControlGuard`]: pure predicates over an [`AccessSnapshot`].
//!
//! Nothing here mutates batches or writes audit events.

pub mod guard;
pub mod halt;
pub mod registry;

pub use guard::{AccessControlGuard, AccessSnapshot};
pub use halt::EmergencyHaltSwitch;
pub use registry::{AccessRegistry, RoleRegistry, TierRegistry};
