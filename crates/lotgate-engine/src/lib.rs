//! # lotgate-engine: Permissioned Batch Lifecycle
//!
//! Ties the access guards, the batch state machine, the telemetry throttle,
//! and the audit trail into one engine, [`BatchLifecycle`].
//!
//! ## Concurrency
//!
//! - Each batch lives behind its own mutex. Guard evaluation, mutation, and
//!   audit append for one batch id are serialized; distinct ids proceed in
//!   parallel.
//! - Guards read a snapshot that holds the halt switch and registry read
//!   locks until the action completes. A circuit-breaker toggle takes the
//!   write lock, so an in-flight action either fully applies under the old
//!   state or is rejected under the new one.
//! - Lock order: halt switch, registry, batch table, batch, audit sink.
//!   Locks are `parking_lot` and never held across `.await`.
//!
//! ## Atomicity
//!
//! Audit events are appended before the batch change is committed. If the
//! append fails the action returns [`LifecycleError::Audit`] and the batch
//! is unchanged; there is never a committed change without its events.

pub mod clock;
pub mod config;
pub mod lifecycle;
pub mod store;
pub mod throttle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuditConfig, ConfigError, PlantConfig, TelemetryConfig};
pub use lifecycle::{BatchLifecycle, FinalizeReport, LifecycleError};
pub use store::BatchStore;
pub use throttle::{TelemetryThrottle, DEFAULT_MIN_UPDATE_INTERVAL_SECS};
