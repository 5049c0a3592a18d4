//! # Circuit Breaker API
//!
//! Read the emergency halt flag and let the supervisor flip it.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::Caller;
use crate::error::AppError;
use crate::state::AppState;

/// Circuit breaker state.
#[derive(Debug, Serialize, Deserialize)]
pub struct CircuitBreakerStatus {
    /// Whether lifecycle actions are halted.
    pub engaged: bool,
}

/// Build the circuit breaker router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/circuit-breaker", get(status))
        .route("/v1/circuit-breaker/toggle", post(toggle))
}

/// GET /v1/circuit-breaker
async fn status(State(state): State<AppState>) -> Result<Json<CircuitBreakerStatus>, AppError> {
    let engaged = state.run(|engine| Ok(engine.is_halted())).await?;
    Ok(Json(CircuitBreakerStatus { engaged }))
}

/// POST /v1/circuit-breaker/toggle: Supervisor only. Returns the new state.
async fn toggle(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<CircuitBreakerStatus>, AppError> {
    let engaged = state
        .run(move |engine| Ok(engine.toggle_circuit_breaker(caller.principal())?))
        .await?;
    Ok(Json(CircuitBreakerStatus { engaged }))
}
