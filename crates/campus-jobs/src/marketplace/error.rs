use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use super::validation::ValidationErrors;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Failure kinds surfaced by every marketplace operation.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("the application deadline for this job has passed")]
    DeadlinePassed,
    #[error("{0}")]
    InvalidState(&'static str),
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("storage unavailable")]
    StoreUnavailable(#[source] RepositoryError),
}

impl MarketError {
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::Unauthenticated(_) => "unauthenticated",
            MarketError::NotFound(_) => "not_found",
            MarketError::Forbidden(_) => "forbidden",
            MarketError::Conflict(_) => "conflict",
            MarketError::DeadlinePassed => "deadline_passed",
            MarketError::InvalidState(_) => "invalid_state",
            MarketError::Validation(_) => "validation_failed",
            MarketError::StoreUnavailable(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            MarketError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            MarketError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketError::Forbidden(_) => StatusCode::FORBIDDEN,
            MarketError::Conflict(_)
            | MarketError::DeadlinePassed
            | MarketError::InvalidState(_)
            | MarketError::Validation(_) => StatusCode::BAD_REQUEST,
            MarketError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for MarketError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict => MarketError::Conflict("record already exists"),
            RepositoryError::NotFound => MarketError::NotFound("record"),
            unavailable @ RepositoryError::Unavailable(_) => {
                MarketError::StoreUnavailable(unavailable)
            }
        }
    }
}

impl From<ValidationErrors> for MarketError {
    fn from(value: ValidationErrors) -> Self {
        MarketError::Validation(value)
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = match &self {
            MarketError::StoreUnavailable(source) => {
                error!(error = %source, "request failed on storage");
                json!({ "error": "internal server error", "code": self.code() })
            }
            MarketError::Validation(errors) => json!({
                "error": "validation failed",
                "code": self.code(),
                "fields": errors,
            }),
            other => json!({ "error": other.to_string(), "code": other.code() }),
        };

        (status, Json(payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_kinds_to_status_codes() {
        assert_eq!(
            MarketError::NotFound("job").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MarketError::Conflict("duplicate").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            MarketError::from(RepositoryError::Unavailable("offline".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn storage_failures_hide_diagnostics() {
        let response =
            MarketError::StoreUnavailable(RepositoryError::Unavailable("pg: timeout at 10.0.0.3".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("read body");
        let text = String::from_utf8(body.to_vec()).expect("utf8 body");
        assert!(!text.contains("10.0.0.3"));
        assert!(text.contains("internal server error"));
    }

    #[tokio::test]
    async fn validation_failures_list_fields() {
        let response = MarketError::Validation(ValidationErrors::single("title", "is required"))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("read body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["fields"][0]["field"], "title");
        assert_eq!(payload["code"], "validation_failed");
    }
}
