//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers to extract
//! and validate JSON bodies and path identifiers in handlers.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use lotgate_core::BatchId;

use crate::error::AppError;

/// Trait for request types that can validate their business rules
/// beyond what serde deserialization checks.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Parse a `:batch_id` path segment.
pub fn batch_id_from_path(raw: String) -> Result<BatchId, AppError> {
    Ok(BatchId::new(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NonEmpty(String);

    impl Validate for NonEmpty {
        fn validate(&self) -> Result<(), String> {
            if self.0.is_empty() {
                Err("empty".into())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn validated_json_passes_through() {
        let value = extract_validated_json(Ok(Json(NonEmpty("x".into())))).unwrap();
        assert_eq!(value.0, "x");
    }

    #[test]
    fn validation_failure_is_422() {
        let err = extract_validated_json(Ok(Json(NonEmpty(String::new())))).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn invalid_path_batch_id() {
        assert!(batch_id_from_path("B-1".into()).is_ok());
        assert!(matches!(
            batch_id_from_path("bad id".into()),
            Err(AppError::Validation(_))
        ));
    }
}
