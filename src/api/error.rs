//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::accounts::AccountError;
use crate::db::DatabaseError;
use crate::ledger::LedgerError;
use crate::licensing::LicensingError;
use crate::review::ReviewError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail.clone()),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::InvalidState(detail) => {
                (StatusCode::CONFLICT, "INVALID_STATE", detail.clone())
            }
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id} not found"))
            }
            DatabaseError::ConstraintViolation(detail) => ApiError::Conflict(detail),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NonPositiveQuantity => {
                ApiError::BadRequest("quantity must be positive".into())
            }
            LedgerError::InsufficientStock { .. } => ApiError::InvalidState(err.to_string()),
            LedgerError::MedicineNotFound(id) => {
                ApiError::NotFound(format!("medicine {id} not found"))
            }
            LedgerError::Database(e) => e.into(),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::NotFound(id) => ApiError::NotFound(format!("report {id} not found")),
            ReviewError::InvalidTransition { .. } | ReviewError::NotActionable(_) => {
                ApiError::InvalidState(err.to_string())
            }
            ReviewError::OutOfScope | ReviewError::NotSubmitter => {
                ApiError::Forbidden(err.to_string())
            }
            ReviewError::Database(e) => e.into(),
        }
    }
}

impl From<LicensingError> for ApiError {
    fn from(err: LicensingError) -> Self {
        match err {
            LicensingError::NotFound(id) => {
                ApiError::NotFound(format!("license application {id} not found"))
            }
            LicensingError::InvalidTransition { .. } | LicensingError::NotActionable(_) => {
                ApiError::InvalidState(err.to_string())
            }
            LicensingError::NotReviewer | LicensingError::NotApplicant => {
                ApiError::Forbidden(err.to_string())
            }
            LicensingError::Database(e) => e.into(),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::EmailTaken => ApiError::Conflict(err.to_string()),
            AccountError::InvalidCredentials => ApiError::Unauthorized,
            AccountError::NotApproved(_) => ApiError::Forbidden(err.to_string()),
            AccountError::NotFound(id) => {
                ApiError::NotFound(format!("registration {id} not found"))
            }
            AccountError::OutOfScope => ApiError::Forbidden(err.to_string()),
            AccountError::AlreadyDecided(_) => ApiError::InvalidState(err.to_string()),
            AccountError::Invalid(detail) => ApiError::BadRequest(detail),
            AccountError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn invalid_state_returns_409() {
        let response = ApiError::InvalidState("stock underflow".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "INVALID_STATE");
    }

    #[tokio::test]
    async fn internal_hides_detail_from_client() {
        let response = ApiError::Internal("something broke".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn insufficient_stock_maps_to_409() {
        let api_err: ApiError = LedgerError::InsufficientStock {
            requested: 80,
            available: 70,
        }
        .into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn scope_violations_map_to_403() {
        let api_err: ApiError = ReviewError::OutOfScope.into();
        assert_eq!(api_err.into_response().status(), StatusCode::FORBIDDEN);
        let api_err: ApiError = LicensingError::NotReviewer.into();
        assert_eq!(api_err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_row_maps_to_404() {
        let api_err: ApiError = DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: "x".into(),
        }
        .into();
        assert_eq!(api_err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
