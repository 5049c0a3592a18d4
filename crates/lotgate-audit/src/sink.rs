//! # Audit Sinks
//!
//! [`AuditSink`] is the append-only log abstraction. Implementations seal
//! drafts into the hash chain and persist them; all events of one
//! `append_all` call land together or not at all.

use parking_lot::Mutex;

use lotgate_core::BatchId;

use crate::chain::ChainHead;
use crate::error::AuditError;
use crate::event::{AuditDraft, AuditEvent};

/// An append-only, ordered audit log.
pub trait AuditSink: Send + Sync + std::fmt::Debug {
    /// Seal and persist `drafts` atomically, in order.
    ///
    /// On `Err`, no event from this call is visible or persisted.
    fn append_all(&self, drafts: Vec<AuditDraft>) -> Result<Vec<AuditEvent>, AuditError>;

    /// The full ordered log.
    fn events(&self) -> Vec<AuditEvent>;

    /// Append a single event.
    fn append(&self, draft: AuditDraft) -> Result<AuditEvent, AuditError> {
        let mut sealed = self.append_all(vec![draft])?;
        sealed
            .pop()
            .ok_or_else(|| AuditError::Unavailable("sink returned no event".into()))
    }

    /// Number of events recorded.
    fn len(&self) -> usize {
        self.events().len()
    }

    /// Whether the log is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events concerning one batch, in log order.
    fn events_for_batch(&self, batch_id: &BatchId) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.concerns(batch_id))
            .collect()
    }

    /// The last `n` events (or all, if fewer exist).
    fn last_n(&self, n: usize) -> Vec<AuditEvent> {
        let mut events = self.events();
        let start = events.len().saturating_sub(n);
        events.split_off(start)
    }
}

/// Log held in memory. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    head: ChainHead,
    events: Vec<AuditEvent>,
}

impl InMemoryAuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for InMemoryAuditLog {
    fn append_all(&self, drafts: Vec<AuditDraft>) -> Result<Vec<AuditEvent>, AuditError> {
        let mut state = self.inner.lock();
        let (sealed, head) = state.head.seal_all(drafts)?;
        state.events.extend(sealed.iter().cloned());
        state.head = head;
        tracing::debug!(
            count = sealed.len(),
            next_sequence = state.head.next_sequence,
            "audit events appended"
        );
        Ok(sealed)
    }

    fn events(&self) -> Vec<AuditEvent> {
        self.inner.lock().events.clone()
    }

    fn len(&self) -> usize {
        self.inner.lock().events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::verify_chain;
    use crate::event::AuditEventKind;
    use lotgate_core::{PrincipalId, Timestamp};

    fn draft(batch: &str, kind: AuditEventKind) -> AuditDraft {
        AuditDraft::message(
            kind,
            &BatchId::new(batch).unwrap(),
            &PrincipalId::new("op-1").unwrap(),
            kind.as_str(),
            Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
        )
    }

    #[test]
    fn append_assigns_gap_free_sequence() {
        let log = InMemoryAuditLog::new();
        assert!(log.is_empty());
        let a = log.append(draft("B1", AuditEventKind::BatchScheduled)).unwrap();
        let b = log.append(draft("B1", AuditEventKind::BatchStarted)).unwrap();
        assert_eq!(a.sequence, 0);
        assert_eq!(b.sequence, 1);
        assert_eq!(log.len(), 2);
        assert_eq!(verify_chain(&log.events()), Ok(2));
    }

    #[test]
    fn append_all_is_contiguous() {
        let log = InMemoryAuditLog::new();
        log.append(draft("B1", AuditEventKind::BatchApproved)).unwrap();
        let sealed = log
            .append_all(vec![
                draft("B1", AuditEventKind::BatchShipped),
                draft("B1", AuditEventKind::ShippingAnnounced),
            ])
            .unwrap();
        assert_eq!(sealed.len(), 2);
        assert_eq!(sealed[0].sequence, 1);
        assert_eq!(sealed[1].previous_hash, sealed[0].event_hash);
    }

    #[test]
    fn failed_append_all_records_nothing() {
        let log = InMemoryAuditLog::new();
        let bad = draft("B1", AuditEventKind::OutOfSpecAlert)
            .with_metadata(serde_json::json!({ "reading": 0.5 }));
        let result = log.append_all(vec![draft("B1", AuditEventKind::BatchStarted), bad]);
        assert!(result.is_err());
        assert!(log.is_empty());

        let next = log.append(draft("B1", AuditEventKind::BatchStarted)).unwrap();
        assert_eq!(next.sequence, 0);
    }

    #[test]
    fn filters_by_batch_and_tail() {
        let log = InMemoryAuditLog::new();
        log.append(draft("B1", AuditEventKind::BatchScheduled)).unwrap();
        log.append(draft("B2", AuditEventKind::BatchScheduled)).unwrap();
        log.append(draft("B1", AuditEventKind::BatchStarted)).unwrap();

        let b1 = log.events_for_batch(&BatchId::new("B1").unwrap());
        assert_eq!(b1.len(), 2);
        assert_eq!(b1[1].kind, AuditEventKind::BatchStarted);

        let tail = log.last_n(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].sequence, 1);
        assert_eq!(log.last_n(10).len(), 3);
    }
}
