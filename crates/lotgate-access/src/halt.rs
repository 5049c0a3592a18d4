//! # Emergency Halt Switch
//!
//! A single global flag. While engaged, every halt-sensitive action is
//! rejected with `SystemHalted`.
//!
//! Operations hold a read guard on the flag for their full duration. A
//! toggle takes the write lock, so it waits for in-flight operations and
//! blocks new ones until the flip is recorded.

use parking_lot::{RwLock, RwLockReadGuard};

/// The circuit breaker.
#[derive(Debug, Default)]
pub struct EmergencyHaltSwitch {
    engaged: RwLock<bool>,
}

impl EmergencyHaltSwitch {
    /// Create a disengaged switch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state. Not held: use [`EmergencyHaltSwitch::hold`] when the
    /// answer must stay valid for an operation.
    pub fn is_engaged(&self) -> bool {
        *self.engaged.read()
    }

    /// Hold the current state for the lifetime of the returned guard.
    pub fn hold(&self) -> RwLockReadGuard<'_, bool> {
        self.engaged.read()
    }

    /// Flip the switch.
    ///
    /// `record` receives the new state while the write lock is held and must
    /// durably record the toggle. The flip is committed only if it returns
    /// `Ok`; otherwise the switch keeps its old state and the error is
    /// returned.
    pub fn toggle_with<E>(&self, record: impl FnOnce(bool) -> Result<(), E>) -> Result<bool, E> {
        let mut engaged = self.engaged.write();
        let next = !*engaged;
        record(next)?;
        *engaged = next;
        tracing::warn!(engaged = next, "circuit breaker toggled");
        Ok(next)
    }
}
