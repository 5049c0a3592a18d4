//! # lotgate-audit: Append-Only Audit Trail
//!
//! Every accepted state-relevant action produces one or more audit events.
//! Events are sealed into a SHA-256 hash chain so that an exported log can
//! be verified independently.
//!
//! - **Events** (`event.rs`): [`AuditEventKind`], [`AuditDraft`], [`AuditEvent`].
//! - **Chain** (`chain.rs`): sealing and [`verify_chain`].
//! - **Sinks** (`sink.rs`, `jsonl.rs`): the [`AuditSink`] trait with
//!   in-memory and JSON-lines implementations.
//!
//! A failed append is an [`AuditError`]: the caller must not commit the
//! state change the events describe.

pub mod chain;
pub mod error;
pub mod event;
pub mod jsonl;
pub mod sink;

pub use chain::{verify_chain, ChainHead, GENESIS_HASH};
pub use error::{AuditError, ChainViolation};
pub use event::{AuditDetail, AuditDraft, AuditEvent, AuditEventKind};
pub use jsonl::{read_jsonl, JsonlAuditLog};
pub use sink::{AuditSink, InMemoryAuditLog};
