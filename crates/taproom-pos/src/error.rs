//! # API Error Type
//!
//! Unified error type for every `PosService` operation.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Taproom POS                            │
//! │                                                                         │
//! │  PosService::complete_payment(...)                                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Cart rule broken?  ─── CoreError::InsufficientStock ──┐               │
//! │         │                                               │               │
//! │         ▼                                               ▼               │
//! │  Store rejected?    ─── DbError::QueryFailed ─────► ApiError           │
//! │         │                                         { code, message }    │
//! │         ▼                                               │               │
//! │  Success                                   .during("complete payment") │
//! │                                                         │               │
//! │                                                         ▼               │
//! │                          "complete payment failed: Query failed: ..."   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store errors are passed through verbatim. Nothing is retried here.

use serde::Serialize;
use taproom_core::CoreError;
use taproom_db::DbError;
use ts_rs::TS;

/// Error returned from service operations.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "complete payment failed: Insufficient stock for Beer: available 0, requested 1"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Lookup miss, unknown cart, tab or line
    NotFound,

    /// The stocked item has nothing on hand
    OutOfStock,

    /// A stock ceiling was hit on add, increment or settlement
    InsufficientStock,

    /// Missing or malformed input (tab name, payment method, empty cart)
    ValidationError,

    /// The store failed to read or write
    PersistenceError,

    /// The tab changed since it was reopened
    ConcurrencyConflict,

    /// Anything else
    Internal,
}

pub type ApiResult<T> = Result<T, ApiError>;

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

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Prefixes the message with the operation that failed.
    pub fn during(mut self, operation: &str) -> Self {
        self.message = format!("{} failed: {}", operation, self.message);
        self
    }

    /// True for errors caused by what is (or isn't) on the shelf.
    pub fn is_stock_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::OutOfStock | ErrorCode::InsufficientStock
        )
    }
}

/// Attaches the failing operation's name to any error convertible to
/// `ApiError`.
pub trait Operation<T> {
    fn during(self, operation: &str) -> ApiResult<T>;
}

impl<T, E> Operation<T> for Result<T, E>
where
    E: Into<ApiError>,
{
    fn during(self, operation: &str) -> ApiResult<T> {
        self.map_err(|e| e.into().during(operation))
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            e @ DbError::UniqueViolation { .. } => ApiError::validation(e.to_string()),
            e @ DbError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            e @ DbError::ConcurrencyConflict { .. } => {
                ApiError::new(ErrorCode::ConcurrencyConflict, e.to_string())
            }
            DbError::Validation(e) => ApiError::validation(e.to_string()),
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::internal(format!("Internal database error: {}", e))
            }
            e => {
                tracing::error!(error = %e, "Store operation failed");
                ApiError::new(ErrorCode::PersistenceError, e.to_string())
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            e @ CoreError::NotFound(_) => ApiError::new(ErrorCode::NotFound, e.to_string()),
            e @ CoreError::LineNotFound(_) => ApiError::new(ErrorCode::NotFound, e.to_string()),
            e @ CoreError::OutOfStock { .. } => ApiError::new(ErrorCode::OutOfStock, e.to_string()),
            e @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
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
    use taproom_core::ValidationError;

    #[test]
    fn test_core_errors_map_to_codes() {
        let err: ApiError = CoreError::OutOfStock {
            name: "Beer".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::OutOfStock);
        assert!(err.is_stock_error());

        let err: ApiError = CoreError::Validation(ValidationError::EmptyCart).into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "cart is empty");

        let err: ApiError = CoreError::NotFound("code '123'".to_string()).into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_db_errors_map_to_codes() {
        let err: ApiError = DbError::conflict("order-1", 2).into();
        assert_eq!(err.code, ErrorCode::ConcurrencyConflict);

        let err: ApiError = DbError::QueryFailed("disk I/O error".to_string()).into();
        assert_eq!(err.code, ErrorCode::PersistenceError);
        assert_eq!(err.message, "Query failed: disk I/O error");

        let err: ApiError = DbError::not_found("Open tab", "order-9").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Open tab not found: order-9");
    }

    #[test]
    fn test_during_names_the_operation() {
        let result: Result<(), DbError> = Err(DbError::InsufficientStock {
            name: "Beer".to_string(),
            available: 0,
            requested: 1,
        });

        let err = result.during("complete payment").unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(
            err.message,
            "complete payment failed: Insufficient stock for Beer: available 0, requested 1"
        );
    }

    #[test]
    fn test_serialized_shape() {
        let err = ApiError::validation("tab name is required");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "tab name is required");
    }
}
