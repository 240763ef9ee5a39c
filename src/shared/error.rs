use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::error;

/// Request-level error taxonomy. Validation errors carry the offending
/// field so the response body can be keyed the way clients expect
/// (`{"stage": "..."}` rather than a bare message).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found."))
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => Self::NotFound("Record not found.".to_string()),
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for ApiError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            Self::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ field: message }),
            ),
            Self::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "detail": msg }),
            ),
            Self::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "detail": msg }),
            ),
            // Internals are logged, never surfaced.
            Self::Database(msg) => {
                error!("database error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "detail": "Internal server error." }),
                )
            }
            Self::Unavailable(msg) => {
                error!("service unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    serde_json::json!({ "detail": "Service temporarily unavailable." }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_field_keyed() {
        let err = ApiError::validation("stage", "Deals can only be closed from the 'Revenue' stage.");
        assert_eq!(
            err.to_string(),
            "stage: Deals can only be closed from the 'Revenue' stage."
        );
    }

    #[test]
    fn diesel_not_found_maps_to_404() {
        let err: ApiError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
