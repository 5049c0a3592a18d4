#![deny(missing_docs)]

//! # lotgate-core: Foundational Types for Lotgate
//!
//! This crate defines the primitives every other crate in the workspace
//! depends on. It has no internal crate dependencies. It uses `serde`,
//! `serde_json`, `serde_jcs`, `thiserror`, `chrono`, and `sha2` from the
//! external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** [`BatchId`], [`PrincipalId`] and
//!    [`VesselId`] are distinct validated types. You cannot pass a vessel
//!    where a batch is expected.
//!
//! 2. **Total competency mappings.** [`Tier`] is bounded to `0..=5`, where
//!    `0` is the value of every unset operator tier and vessel requirement.
//!    Lookups never fail; they deny by default.
//!
//! 3. **One rejection taxonomy.** [`Rejection`] enumerates every expected
//!    business refusal. Each variant carries its context and a stable
//!    machine code.
//!
//! 4. **[`CanonicalBytes`] is the sole path to digest computation.** The audit
//!    hash chain hashes only canonicalized bytes.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `lotgate-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod authority;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use authority::{Role, Tier};
pub use canonical::CanonicalBytes;
pub use digest::{ContentDigest, DigestAlgorithm, Sha256Accumulator};
pub use error::{CanonicalizationError, Rejection, ValidationError};
pub use identity::{BatchId, PrincipalId, VesselId};
pub use temporal::Timestamp;
