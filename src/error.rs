//! Error taxonomy for the HTTP surface
//!
//! This module provides:
//! - Stable error codes with metric categories
//! - [`ApiError`], the single error type returned by handlers and services
//! - The JSON error body every failing request receives
//!
//! Validation always runs before any store call, so a [`ApiError::Validation`]
//! guarantees nothing was written. Store failures are never retried or
//! reclassified; their message is passed through verbatim with a 500.

use crate::lifecycle::LifecycleError;
use crate::metrics::METRICS;
use crate::store::StoreError;
use crate::validation::{FieldViolation, ValidationError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type for handlers and services
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ERROR CODES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed or out-of-range input
    ValidationFailed,
    /// Request body was not JSON
    MalformedBody,
    /// Referenced identifier does not exist
    NotFound,
    /// Known path, unsupported method
    MethodNotAllowed,
    /// Application status change not permitted
    IllegalTransition,
    /// Hosted store failed
    StoreFailure,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "validation_failed",
            ErrorCode::MalformedBody => "malformed_body",
            ErrorCode::NotFound => "not_found",
            ErrorCode::MethodNotAllowed => "method_not_allowed",
            ErrorCode::IllegalTransition => "illegal_transition",
            ErrorCode::StoreFailure => "store_failure",
        }
    }

    /// Get the error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::MalformedBody
            | ErrorCode::MethodNotAllowed => "client_error",
            ErrorCode::IllegalTransition => "lifecycle_error",
            ErrorCode::NotFound => "resource_not_found",
            ErrorCode::StoreFailure => "dependency_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// API ERROR
// =============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        ApiError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn malformed_body(message: impl Into<String>) -> Self {
        ApiError::Validation(ValidationError::single("body", message))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Validation(err) if err.has_field("body") => ErrorCode::MalformedBody,
            ApiError::Validation(_) => ErrorCode::ValidationFailed,
            ApiError::NotFound { .. } => ErrorCode::NotFound,
            ApiError::MethodNotAllowed(_) => ErrorCode::MethodNotAllowed,
            ApiError::Lifecycle(_) => ErrorCode::IllegalTransition,
            ApiError::Store(_) => ErrorCode::StoreFailure,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Lifecycle(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body sent to the client.
    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Validation(err) => ErrorBody {
                error: "Validation failed".to_string(),
                code: self.code(),
                errors: err.violations.clone(),
            },
            ApiError::Lifecycle(err) => ErrorBody {
                error: err.to_string(),
                code: self.code(),
                errors: vec![FieldViolation::new("status", err.to_string())],
            },
            ApiError::NotFound { .. } | ApiError::MethodNotAllowed(_) | ApiError::Store(_) => {
                ErrorBody {
                    error: self.to_string(),
                    code: self.code(),
                    errors: Vec::new(),
                }
            }
        }
    }
}

/// Error payload. `errors` is present only for validation failures.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldViolation>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        METRICS.record_error(code);

        match &self {
            ApiError::Store(err) => {
                tracing::error!(error_code = %code, error = %err, "store call failed");
            }
            ApiError::NotFound { entity, id } => {
                tracing::debug!(error_code = %code, entity, id = %id, "entity not found");
            }
            other => {
                tracing::info!(error_code = %code, error = %other, "request rejected");
            }
        }

        (self.status_code(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApplicationStatus;

    #[test]
    fn status_codes_follow_taxonomy() {
        let validation = ApiError::from(ValidationError::single("petId", "is required"));
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.code(), ErrorCode::ValidationFailed);

        let missing = ApiError::not_found("Pet", "p1");
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), "Pet not found");

        let store = ApiError::from(StoreError::new("connection reset"));
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.body().error, "connection reset");
    }

    #[test]
    fn validation_body_lists_violations() {
        let err = ApiError::from(ValidationError::single("status", "must be one of: a, b"));
        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["errors"][0]["field"], "status");
        assert_eq!(json["code"], "validation_failed");
    }

    #[test]
    fn illegal_transition_reports_status_field() {
        let err = ApiError::from(LifecycleError::IllegalTransition {
            from: ApplicationStatus::Approved,
            to: ApplicationStatus::Rejected,
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["errors"][0]["field"], "status");
        assert_eq!(body["code"], "illegal_transition");
    }

    #[test]
    fn unsupported_method_is_405() {
        let err = ApiError::MethodNotAllowed("DELETE".to_string());
        assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["error"], "method DELETE not allowed");
        assert_eq!(body["code"], "method_not_allowed");
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn malformed_body_has_own_code() {
        let err = ApiError::malformed_body("expected value at line 1");
        assert_eq!(err.code(), ErrorCode::MalformedBody);
        assert_eq!(err.code().category(), "client_error");
    }
}
