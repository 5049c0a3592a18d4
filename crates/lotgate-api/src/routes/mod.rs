//! # Route Modules
//!
//! One router per resource. Each takes [`AppState`](crate::state::AppState)
//! and is merged under the principal middleware by [`crate::app`].

pub mod audit;
pub mod batches;
pub mod circuit_breaker;
