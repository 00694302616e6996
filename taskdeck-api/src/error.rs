/// API error handling
///
/// This module provides a unified error type for all API endpoints with:
/// - Automatic HTTP status code mapping
/// - JSON error responses
/// - Field-level validation details
/// - Server-side logging of internal errors
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::error::{ApiError, ApiResult};
///
/// async fn handler() -> ApiResult<String> {
///     Err(ApiError::NotFound("Task not found".to_string()))
/// }
/// ```
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskdeck_shared::{auth::middleware::BearerError, CoreError, FieldError};

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),

    /// 401 Unauthorized
    Unauthorized(String),

    /// 404 Not Found
    NotFound(String),

    /// 409 Conflict
    Conflict(String),

    /// 422 Unprocessable Entity, one entry per failing field
    ValidationError(Vec<FieldError>),

    /// 500 Internal Server Error; the message is logged, never returned
    InternalError(String),

    /// 503 Service Unavailable
    ServiceUnavailable(String),
}

/// JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub error: String,

    /// Error message (human-readable)
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCredentials
            | CoreError::PasswordLoginUnavailable
            | CoreError::TokenInvalid
            | CoreError::UserNotFound => ApiError::Unauthorized(err.to_string()),
            CoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            CoreError::InvalidReference(_) | CoreError::NotInTrash => {
                ApiError::BadRequest(err.to_string())
            }
            CoreError::Validation(errors) => ApiError::ValidationError(errors),
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
            CoreError::Storage(err) => ApiError::InternalError(format!("Storage error: {}", err)),
            CoreError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<BearerError> for ApiError {
    fn from(err: BearerError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

/// Flattens `validator` output into the field/message list
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<FieldError> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    FieldError::new(
                        field.to_string(),
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "Validation failed".to_string()),
                    )
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                ApiError::ValidationError(vec![FieldError::new("body", err.body_text())])
            }
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_shared::store::StoreError;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_core_error_status_mapping() {
        let cases = [
            (CoreError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (CoreError::PasswordLoginUnavailable, StatusCode::UNAUTHORIZED),
            (CoreError::TokenInvalid, StatusCode::UNAUTHORIZED),
            (CoreError::UserNotFound, StatusCode::UNAUTHORIZED),
            (CoreError::NotFound("Task"), StatusCode::NOT_FOUND),
            (
                CoreError::InvalidReference("projectId".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::NotInTrash, StatusCode::BAD_REQUEST),
            (
                CoreError::invalid("title", "Title is required"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CoreError::Conflict("Email already registered".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                CoreError::Storage(StoreError::persistence(std::io::Error::other("down"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                CoreError::Internal("hash".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (core, status) in cases {
            let response = ApiError::from(core).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_validation_error() {
        let err = ApiError::ValidationError(vec![
            FieldError::new("email", "Invalid email format"),
            FieldError::new("password", "Password too short"),
        ]);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }
}
