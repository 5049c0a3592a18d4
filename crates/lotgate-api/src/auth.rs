//! # Principal Identity Middleware
//!
//! Authentication happens upstream. The identity layer forwards the
//! authenticated principal in the `X-Principal-Id` header; this middleware
//! validates it and injects a [`Caller`] into the request extensions.
//!
//! Requests without a valid header are rejected with 401 before reaching
//! any handler.

use axum::extract::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use lotgate_core::PrincipalId;

use crate::error::AppError;

/// Header carrying the authenticated principal.
pub const PRINCIPAL_HEADER: &str = "x-principal-id";

/// The authenticated principal for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub PrincipalId);

impl Caller {
    /// The principal.
    pub fn principal(&self) -> &PrincipalId {
        &self.0
    }
}

/// Extracts the identity that [`principal_middleware`] injected.
/// Returns 401 if no identity is present.
#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no principal in request context".into()))
    }
}

/// Parse the principal header value.
pub fn parse_principal(value: Option<&str>) -> Result<PrincipalId, String> {
    let raw = value.ok_or_else(|| format!("missing {PRINCIPAL_HEADER} header"))?;
    PrincipalId::new(raw).map_err(|e| e.to_string())
}

/// Validate `X-Principal-Id` and inject a [`Caller`].
pub async fn principal_middleware(mut request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(PRINCIPAL_HEADER)
        .and_then(|v| v.to_str().ok());

    match parse_principal(header) {
        Ok(principal) => {
            request.extensions_mut().insert(Caller(principal));
            next.run(request).await
        }
        Err(msg) => {
            tracing::warn!(reason = %msg, "request without a valid principal");
            AppError::Unauthorized(msg).into_response()
        }
    }
}
