//! # Error Types
//!
//! Domain-specific error types for taproom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  taproom-core errors (this file)                                       │
//! │  ├── CoreError        - Lookup misses, stock ceilings, cart misuse     │
//! │  └── ValidationError  - Missing or malformed input                     │
//! │                                                                         │
//! │  taproom-db errors (separate crate)                                    │
//! │  └── DbError          - Store failures, settlement conflicts           │
//! │                                                                         │
//! │  taproom-pos errors                                                    │
//! │  └── ApiError         - What the UI process sees (serialized)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError                          │
//! │                          DbError  ──┘                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every cart/pricing error is raised before any mutation happens, so a
//! failed operation always leaves the cart exactly as it was.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// A code or selection did not resolve to any product.
    #[error("No product matches {0}")]
    NotFound(String),

    /// The stocked item has nothing on hand.
    ///
    /// ## When This Occurs
    /// - `add_item` on an item whose quantity is 0
    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    /// Adding or incrementing would exceed the live stock count.
    ///
    /// ## User Workflow
    /// ```text
    /// Beer in cart: 3, stock: 5
    ///      │
    ///      ▼
    /// change_quantity(+3) → needs 6
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Beer", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// Line stays at 3
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// The cart has no line for the given product.
    #[error("Cart has no line for {0}")]
    LineNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// The order cannot be committed with no lines.
    #[error("cart is empty")]
    EmptyCart,
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Beer".to_string(),
            available: 5,
            requested: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Beer: available 5, requested 6"
        );

        let err = CoreError::OutOfStock {
            name: "Cider".to_string(),
        };
        assert_eq!(err.to_string(), "Cider is out of stock");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let err: CoreError = ValidationError::Required {
            field: "tab name".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: tab name is required");
    }
}
