//! HTTP error mapping.
//!
//! Every failure leaves the API as `{code, message, details?}` with a
//! stable `code`. Internal failures are logged and answered generically.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use scoop_core::{CoreError, ValidationError};
use scoop_db::DbError;

/// Seconds a client should wait before retrying a busy write.
pub const RETRY_AFTER_SECS: u32 = 1;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        ApiError::Db(DbError::Domain(error))
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        CoreError::Validation(error).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ApiError {
    /// Stable error code and HTTP status.
    pub fn code(&self) -> (&'static str, StatusCode) {
        match self {
            ApiError::Unauthorized(_) => ("UNAUTHORIZED", StatusCode::UNAUTHORIZED),
            ApiError::Forbidden(_) => ("FORBIDDEN", StatusCode::FORBIDDEN),
            ApiError::BadRequest(_) => ("VALIDATION_ERROR", StatusCode::BAD_REQUEST),
            ApiError::Db(db) => match db {
                DbError::NotFound { .. } => ("NOT_FOUND", StatusCode::NOT_FOUND),
                DbError::UniqueViolation { .. } => ("CONFLICT", StatusCode::CONFLICT),
                DbError::Busy(_) | DbError::PoolExhausted => {
                    ("STORAGE_BUSY", StatusCode::SERVICE_UNAVAILABLE)
                }
                DbError::ConnectionFailed(_) => {
                    ("STORAGE_UNAVAILABLE", StatusCode::SERVICE_UNAVAILABLE)
                }
                DbError::Domain(core) => match core {
                    CoreError::NotFound { .. } => ("NOT_FOUND", StatusCode::NOT_FOUND),
                    CoreError::Validation(_) => ("VALIDATION_ERROR", StatusCode::BAD_REQUEST),
                    CoreError::InsufficientStock { .. } => {
                        ("INSUFFICIENT_STOCK", StatusCode::CONFLICT)
                    }
                    CoreError::InvalidTransition { .. } | CoreError::StockRecordExists { .. } => {
                        ("CONFLICT", StatusCode::CONFLICT)
                    }
                },
                DbError::ForeignKeyViolation { .. }
                | DbError::MigrationFailed(_)
                | DbError::QueryFailed(_)
                | DbError::TransactionFailed(_)
                | DbError::Internal(_) => ("INTERNAL", StatusCode::INTERNAL_SERVER_ERROR),
            },
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::Db(DbError::Domain(CoreError::InsufficientStock {
                pool,
                branch_id,
                item_id,
                requested,
                available,
            })) => Some(json!({
                "pool": pool,
                "branch_id": branch_id,
                "item_id": item_id,
                "requested": requested,
                "available": available,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, status) = self.code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed with internal error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            code,
            message,
            details: self.details(),
        };

        let mut response = (status, Json(body)).into_response();
        if code == "STORAGE_BUSY" {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoop_core::{Quantity, StockPool};

    #[test]
    fn test_codes() {
        let not_found: ApiError = CoreError::not_found("Order", "o-1").into();
        assert_eq!(not_found.code(), ("NOT_FOUND", StatusCode::NOT_FOUND));

        let busy = ApiError::Db(DbError::Busy("locked".to_string()));
        assert_eq!(busy.code(), ("STORAGE_BUSY", StatusCode::SERVICE_UNAVAILABLE));

        let internal = ApiError::Db(DbError::QueryFailed("syntax".to_string()));
        assert_eq!(internal.code().0, "INTERNAL");
    }

    #[test]
    fn test_busy_sets_retry_after() {
        let response = ApiError::Db(DbError::PoolExhausted).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");
    }

    #[test]
    fn test_insufficient_stock_details() {
        let error: ApiError = CoreError::InsufficientStock {
            pool: StockPool::RawMaterial,
            branch_id: "centro".to_string(),
            item_id: "choc".to_string(),
            requested: Quantity::from_hundredths(600),
            available: Quantity::from_hundredths(500),
        }
        .into();

        let details = error.details().unwrap();
        assert_eq!(details["pool"], "raw_material");
        assert_eq!(details["requested"], "6.00");
        assert_eq!(details["available"], "5.00");
    }
}
