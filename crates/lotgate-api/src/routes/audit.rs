//! # Audit Trail API
//!
//! Read-only access to the hash-chained audit log, optionally filtered to
//! one batch and truncated to the most recent events.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use lotgate_audit::{verify_chain, AuditEvent};
use lotgate_core::BatchId;

use crate::error::AppError;
use crate::state::AppState;

/// Query parameters for `GET /v1/audit`.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    /// Only events concerning this batch.
    pub batch_id: Option<String>,
    /// Only the last `n` matching events.
    pub last: Option<usize>,
}

/// Result of `GET /v1/audit/verify`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChainReport {
    pub valid: bool,
    pub events: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<String>,
}

/// Build the audit router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/audit", get(list_events))
        .route("/v1/audit/verify", get(verify))
}

/// GET /v1/audit?batch_id=&last=
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEvent>>, AppError> {
    let batch_id = query.batch_id.map(BatchId::new).transpose()?;
    let mut events = state
        .run(move |engine| {
            let audit = engine.audit();
            Ok(match &batch_id {
                Some(id) => audit.events_for_batch(id),
                None => audit.events(),
            })
        })
        .await?;
    if let Some(n) = query.last {
        let start = events.len().saturating_sub(n);
        events.drain(..start);
    }
    Ok(Json(events))
}

/// GET /v1/audit/verify: Recompute the hash chain.
async fn verify(State(state): State<AppState>) -> Result<Json<ChainReport>, AppError> {
    let report = state
        .run(|engine| {
            let events = engine.audit().events();
            Ok(match verify_chain(&events) {
                Ok(count) => ChainReport {
                    valid: true,
                    events: count,
                    violation: None,
                },
                Err(violation) => {
                    tracing::error!(error = %violation, "audit chain failed verification");
                    ChainReport {
                        valid: false,
                        events: events.len(),
                        violation: Some(violation.to_string()),
                    }
                }
            })
        })
        .await?;
    Ok(Json(report))
}
