//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Shopfront                              │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<Json<T>, ApiError>                                              │
//! │         │                                                               │
//! │         ├── DbError ─────────┐                                          │
//! │         ├── CoreError ───────┤                                          │
//! │         ├── ValidationError ─┼──► ApiError { code, message }            │
//! │         └── PaymentError ────┘            │                             │
//! │                                           ▼                             │
//! │                         HTTP status from code + JSON body               │
//! │                                                                         │
//! │  Internal details (SQL text, provider payloads) are logged here and     │
//! │  never reach the client.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shopfront_core::{CoreError, ValidationError};
use shopfront_db::DbError;

use crate::services::payment::PaymentError;

/// Error returned from handlers.
///
/// ## Serialization
/// This is what the frontend receives when a request fails:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: p42"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Duplicate or already-processed resource (409)
    Conflict,

    /// Not logged in or bad credentials (401)
    Unauthorized,

    /// Logged in without the required role (403)
    Forbidden,

    /// Cart operation failed (422)
    CartError,

    /// Payment provider failed (502)
    PaymentError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::CartError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::PaymentError => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden() -> Self {
        ApiError::new(ErrorCode::Forbidden, "Admin access required")
    }

    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::InvalidRecord { entity, reason } => {
                tracing::error!(entity = %entity, "Invalid stored record: {}", reason);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::Serialization(e) => {
                tracing::error!("Column serialization failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::NotInCart(_) | CoreError::CartTooLarge { .. } | CoreError::EmptyCart => {
                ApiError::cart(err.to_string())
            }
            CoreError::QuantityTooLarge { .. }
            | CoreError::CouponNotRedeemable { .. }
            | CoreError::CouponMinimumNotMet { .. } => ApiError::validation(err.to_string()),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts payment provider failures. The provider's own message is logged,
/// the shopper sees a generic one.
impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotConfigured => {
                tracing::error!("Payment provider credentials are not configured");
                ApiError::new(ErrorCode::PaymentError, "Payments are unavailable")
            }
            other => {
                tracing::error!(error = %other, "Payment provider request failed");
                ApiError::new(ErrorCode::PaymentError, "Payment provider request failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_core::coupon::CouponRejection;

    #[test]
    fn test_db_errors_hide_details() {
        let err = ApiError::from(DbError::QueryFailed("near \"SELEC\": syntax error".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");

        let err = ApiError::from(DbError::duplicate("code", "WELCOME10"));
        assert_eq!(err.code.status(), StatusCode::CONFLICT);
        assert_eq!(err.message, "code 'WELCOME10' already exists");
    }

    #[test]
    fn test_core_errors_map_to_statuses() {
        let err = ApiError::from(CoreError::EmptyCart);
        assert_eq!(err.code.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ApiError::from(CoreError::CouponNotRedeemable {
            code: "SPRING10".into(),
            reason: CouponRejection::Expired,
        });
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Coupon SPRING10 cannot be used: coupon has expired");
    }

    #[test]
    fn test_payment_errors_are_generic() {
        let err = ApiError::from(PaymentError::Status {
            status: 422,
            message: "UNPROCESSABLE_ENTITY: currency mismatch".into(),
        });
        assert_eq!(err.code.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.message, "Payment provider request failed");
    }
}
