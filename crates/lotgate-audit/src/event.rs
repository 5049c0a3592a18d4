//! # Audit Events
//!
//! An [`AuditDraft`] is what the lifecycle engine asks to record. A sink
//! seals it into an [`AuditEvent`] by assigning the next sequence number and
//! an id, and chaining its hash to the previous event.
//!
//! Each event carries either a free-form message (announcements, alerts) or
//! a reason (scrap and ship records), see [`AuditDetail`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lotgate_core::{BatchId, PrincipalId, Timestamp};

/// The type of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    /// A batch was created in `SCHEDULED`.
    BatchScheduled,
    /// Announcement: a batch entered `IN_PROCESS`.
    BatchStarted,
    /// A batch was handed to quality control.
    QualityCheckRequested,
    /// An in-spec telemetry reading was accepted.
    ProcessUpdateVerified,
    /// An out-of-spec telemetry reading was recorded.
    OutOfSpecAlert,
    /// Announcement: a manager recorded a physical-witness override.
    ManagerOverride,
    /// Announcement: quality control approved the batch.
    BatchApproved,
    /// The batch was scrapped, with a reason.
    BatchScrapped,
    /// The batch was released for shipping, with a reason.
    BatchShipped,
    /// Announcement accompanying [`AuditEventKind::BatchShipped`].
    ShippingAnnounced,
    /// The circuit breaker changed state.
    CircuitBreakerToggled,
}

impl AuditEventKind {
    /// Return the string value for serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BatchScheduled => "batch_scheduled",
            Self::BatchStarted => "batch_started",
            Self::QualityCheckRequested => "quality_check_requested",
            Self::ProcessUpdateVerified => "process_update_verified",
            Self::OutOfSpecAlert => "out_of_spec_alert",
            Self::ManagerOverride => "manager_override",
            Self::BatchApproved => "batch_approved",
            Self::BatchScrapped => "batch_scrapped",
            Self::BatchShipped => "batch_shipped",
            Self::ShippingAnnounced => "shipping_announced",
            Self::CircuitBreakerToggled => "circuit_breaker_toggled",
        }
    }
}

impl std::fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The human-readable payload of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditDetail {
    /// Announcement or alert text.
    Message(String),
    /// Reason for a scrap or ship decision.
    Reason(String),
}

impl AuditDetail {
    /// The text, whichever variant.
    pub fn text(&self) -> &str {
        match self {
            Self::Message(s) | Self::Reason(s) => s,
        }
    }
}

/// An event not yet appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDraft {
    /// Event type.
    pub kind: AuditEventKind,
    /// Batch concerned, if any. Circuit-breaker events have none.
    pub batch_id: Option<BatchId>,
    /// Principal whose request produced the event.
    pub actor: Option<PrincipalId>,
    /// Message or reason.
    pub detail: AuditDetail,
    /// When the request was accepted.
    pub timestamp: Timestamp,
    /// Optional structured context. Must not contain floats.
    pub metadata: Option<serde_json::Value>,
}

impl AuditDraft {
    /// A batch event carrying a message.
    pub fn message(
        kind: AuditEventKind,
        batch_id: &BatchId,
        actor: &PrincipalId,
        message: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            kind,
            batch_id: Some(batch_id.clone()),
            actor: Some(actor.clone()),
            detail: AuditDetail::Message(message.into()),
            timestamp,
            metadata: None,
        }
    }

    /// A batch event carrying a reason.
    pub fn reason(
        kind: AuditEventKind,
        batch_id: &BatchId,
        actor: &PrincipalId,
        reason: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            kind,
            batch_id: Some(batch_id.clone()),
            actor: Some(actor.clone()),
            detail: AuditDetail::Reason(reason.into()),
            timestamp,
            metadata: None,
        }
    }

    /// A circuit-breaker toggle event recording the new state.
    pub fn circuit_breaker(actor: &PrincipalId, engaged: bool, timestamp: Timestamp) -> Self {
        let message = if engaged {
            "circuit breaker engaged"
        } else {
            "circuit breaker released"
        };
        Self {
            kind: AuditEventKind::CircuitBreakerToggled,
            batch_id: None,
            actor: Some(actor.clone()),
            detail: AuditDetail::Message(message.to_string()),
            timestamp,
            metadata: Some(serde_json::json!({ "engaged": engaged })),
        }
    }

    /// Attach structured metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A sealed, hash-chained audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position in the log, 0-based and gap-free.
    pub sequence: u64,
    /// Unique event id.
    pub id: Uuid,
    /// Event type.
    pub kind: AuditEventKind,
    /// Batch concerned, if any.
    pub batch_id: Option<BatchId>,
    /// Principal whose request produced the event.
    pub actor: Option<PrincipalId>,
    /// Message or reason.
    pub detail: AuditDetail,
    /// When the request was accepted.
    pub timestamp: Timestamp,
    /// Optional structured context.
    pub metadata: Option<serde_json::Value>,
    /// Hex SHA-256 of the previous event, or the genesis hash.
    pub previous_hash: String,
    /// Hex SHA-256 over `previous_hash` and the canonical body.
    pub event_hash: String,
}

/// The hashed portion of an event: every field except the two hashes.
#[derive(Serialize)]
pub(crate) struct EventBody<'a> {
    pub sequence: u64,
    pub id: &'a Uuid,
    pub kind: AuditEventKind,
    pub batch_id: Option<&'a BatchId>,
    pub actor: Option<&'a PrincipalId>,
    pub detail: &'a AuditDetail,
    pub timestamp: &'a Timestamp,
    pub metadata: Option<&'a serde_json::Value>,
}

impl AuditEvent {
    pub(crate) fn body(&self) -> EventBody<'_> {
        EventBody {
            sequence: self.sequence,
            id: &self.id,
            kind: self.kind,
            batch_id: self.batch_id.as_ref(),
            actor: self.actor.as_ref(),
            detail: &self.detail,
            timestamp: &self.timestamp,
            metadata: self.metadata.as_ref(),
        }
    }

    /// Whether this event concerns `batch_id`.
    pub fn concerns(&self, batch_id: &BatchId) -> bool {
        self.batch_id.as_ref() == Some(batch_id)
    }
}
