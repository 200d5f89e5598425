use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Cannot move from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("Collection '{0}' is not available")]
    DependencyUnavailable(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        AppError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::NotFound,
            StoreError::CollectionMissing(collection) => {
                AppError::DependencyUnavailable(collection)
            }
            other => AppError::Store(other),
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl utoipa::ToSchema for AppError {
    fn name() -> std::borrow::Cow<'static, str> {
        "ErrorResponse".into()
    }
}

impl utoipa::PartialSchema for AppError {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        ErrorResponse::schema()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Store(e) => {
                tracing::error!("Store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Store error".to_string())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            AppError::InvalidTransition { from, to } => (
                StatusCode::CONFLICT,
                format!("Cannot change status from '{}' to '{}'", from, to),
            ),
            AppError::DependencyUnavailable(collection) => {
                tracing::warn!("Collection '{}' unavailable", collection);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("'{}' is not available yet", collection),
                )
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({
            "error": error_message,
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_taxonomy() {
        assert!(matches!(
            AppError::from(StoreError::not_found("reports", "x")),
            AppError::NotFound
        ));
        assert!(matches!(
            AppError::from(StoreError::CollectionMissing("crews".to_string())),
            AppError::DependencyUnavailable(c) if c == "crews"
        ));
    }

    #[test]
    fn invalid_transition_is_conflict() {
        let resp = AppError::invalid_transition("resolved", "dismissed").into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
