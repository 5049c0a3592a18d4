//! # Hash Chain
//!
//! `event_hash = SHA-256(previous_hash ‖ JCS(body))`, where `body` is every
//! event field except the two hashes and `previous_hash` is the lowercase hex
//! of the prior event's hash. The first event chains from [`GENESIS_HASH`].

use uuid::Uuid;

use lotgate_core::{CanonicalBytes, Sha256Accumulator};

use crate::error::{AuditError, ChainViolation};
use crate::event::{AuditDraft, AuditEvent, EventBody};

/// The `previous_hash` of the first event.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Position of the next event in a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHead {
    /// Sequence number the next event receives.
    pub next_sequence: u64,
    /// Hash the next event chains from.
    pub last_hash: String,
}

impl ChainHead {
    /// The head of an empty log.
    pub fn genesis() -> Self {
        Self {
            next_sequence: 0,
            last_hash: GENESIS_HASH.to_string(),
        }
    }

    /// The head after `events`, which must already be verified.
    pub fn after(events: &[AuditEvent]) -> Self {
        match events.last() {
            Some(last) => Self {
                next_sequence: last.sequence + 1,
                last_hash: last.event_hash.clone(),
            },
            None => Self::genesis(),
        }
    }

    /// Seal `drafts` in order, returning the events and the advanced head.
    ///
    /// `self` is not modified, so a caller can discard the result if the
    /// write fails.
    pub fn seal_all(&self, drafts: Vec<AuditDraft>) -> Result<(Vec<AuditEvent>, Self), AuditError> {
        let mut head = self.clone();
        let mut sealed = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let event = seal(draft, head.next_sequence, &head.last_hash)?;
            head.next_sequence += 1;
            head.last_hash.clone_from(&event.event_hash);
            sealed.push(event);
        }
        Ok((sealed, head))
    }
}

impl Default for ChainHead {
    fn default() -> Self {
        Self::genesis()
    }
}

fn seal(draft: AuditDraft, sequence: u64, previous_hash: &str) -> Result<AuditEvent, AuditError> {
    let mut event = AuditEvent {
        sequence,
        id: Uuid::new_v4(),
        kind: draft.kind,
        batch_id: draft.batch_id,
        actor: draft.actor,
        detail: draft.detail,
        timestamp: draft.timestamp,
        metadata: draft.metadata,
        previous_hash: previous_hash.to_string(),
        event_hash: String::new(),
    };
    event.event_hash = compute_event_hash(previous_hash, &event.body())?;
    Ok(event)
}

fn compute_event_hash(previous_hash: &str, body: &EventBody<'_>) -> Result<String, AuditError> {
    let canonical = CanonicalBytes::new(body)?;
    let mut acc = Sha256Accumulator::new();
    acc.update(previous_hash.as_bytes());
    acc.update(canonical.as_bytes());
    Ok(acc.finalize().to_hex())
}

/// Verify a full log from genesis.
///
/// Checks, for every event in order: the sequence number is its index, the
/// `previous_hash` links to the prior event, and `event_hash` matches the
/// recomputed hash. Returns the number of verified events, or the first
/// violation.
pub fn verify_chain(events: &[AuditEvent]) -> Result<usize, ChainViolation> {
    let mut expected_prev = GENESIS_HASH.to_string();
    for (index, event) in events.iter().enumerate() {
        let index = index as u64;
        if event.sequence != index {
            return Err(ChainViolation::SequenceGap {
                expected: index,
                found: event.sequence,
            });
        }
        if event.previous_hash != expected_prev {
            return Err(ChainViolation::BrokenLink {
                sequence: index,
                expected: expected_prev,
                found: event.previous_hash.clone(),
            });
        }
        let recomputed = compute_event_hash(&event.previous_hash, &event.body())
            .map_err(|e| ChainViolation::Unhashable {
                sequence: index,
                reason: e.to_string(),
            })?;
        if recomputed != event.event_hash {
            return Err(ChainViolation::HashMismatch {
                sequence: index,
                recorded: event.event_hash.clone(),
                recomputed,
            });
        }
        expected_prev.clone_from(&event.event_hash);
    }
    Ok(events.len())
}
