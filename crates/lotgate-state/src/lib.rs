//! # lotgate-state: Batch Lifecycle Records
//!
//! Models a production lot and the directed graph its status may follow.
//!
//! ## Status Graph
//!
//! ```text
//! SCHEDULED ──start──▶ IN_PROCESS ──request_quality_check──▶ QUALITY_CHECK
//!   │                   │    ▲ │                                  │
//!   │                   └────┘ │ (operator hand-off)              │
//!   │                          ├──finalize──▶ APPROVED ──ship──▶ SHIPPED
//!   │                          │               ▲   │
//!   │                          │               │   └─finalize─┐
//!   │                          │               └────finalize──┼───┤
//!   │                          └──finalize──▶ BURNED ◀────────┘   │
//!   └────────────finalize(scrap)──────────────▶ ▲ ◀──finalize─────┘
//! ```
//!
//! `BURNED` and `SHIPPED` are absorbing. The status never moves backwards
//! except into `BURNED`.
//!
//! ## Design
//!
//! The lifecycle uses an enum with validated transitions rather than
//! typestate types: the engine stores batches of every status in one table
//! and receives the requested action at runtime, so each transition method
//! checks its precondition and returns a [`Rejection`] on failure.
//! Authorization is not this crate's concern; `lotgate-engine` evaluates
//! the guards before calling into a [`Batch`].
//!
//! [`Rejection`]: lotgate_core::Rejection

pub mod batch;

pub use batch::{
    Batch, BatchAction, BatchStatus, BatchTransitionRecord, FinalizeOutcome, ScrapReason,
};
