//! # lotgate-api: HTTP Service for the Batch Lifecycle
//!
//! Exposes the lifecycle engine over HTTP. Authentication is performed by
//! the upstream identity layer, which forwards the principal in the
//! `X-Principal-Id` header.
//!
//! ## API Surface
//!
//! | Prefix                  | Module                        |
//! |-------------------------|-------------------------------|
//! | `/v1/batches/*`         | [`routes::batches`]           |
//! | `/v1/circuit-breaker/*` | [`routes::circuit_breaker`]   |
//! | `/v1/audit/*`           | [`routes::audit`]             |
//! | `/health/*`             | probes, no principal required |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → PrincipalMiddleware → Handler
//! ```
//!
//! Lifecycle rejections map to HTTP statuses in [`error::AppError`].

pub mod auth;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

/// Assemble the application router.
///
/// Health probes (`/health/*`) are mounted outside the principal
/// middleware so they remain reachable without an identity.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::batches::router())
        .merge(routes::circuit_breaker::router())
        .merge(routes::audit::router())
        .layer(from_fn(auth::principal_middleware))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new()
        .merge(health)
        .merge(api)
        .layer(TraceLayer::new_for_http())
}

async fn liveness() -> &'static str {
    "ok"
}

async fn readiness() -> &'static str {
    "ready"
}
