//! # Validation Module
//!
//! Input validation for catalog records and settlement requests.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Service (taproom-pos)                                         │
//! │  └── Parses payment method / role strings                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Tab name, prices, stock counts, barcodes, non-empty carts          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  ├── CHECK (price_cents >= 0), CHECK (quantity >= 0)                    │
//! │  └── UNIQUE barcode                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 120;
const MAX_BARCODE_LEN: usize = 64;

/// Largest quantity one cart line may hold.
pub const MAX_LINE_QUANTITY: i64 = 10_000;

/// Largest unit price, in cents.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Validates a tab (table) name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use taproom_core::validation::validate_tab_name;
///
/// assert_eq!(validate_tab_name("  Table 4 ").unwrap(), "Table 4");
/// assert!(validate_tab_name("   ").is_err());
/// ```
pub fn validate_tab_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "tab name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "tab name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed.
///
/// ## Example
/// ```rust
/// use taproom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(450).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-1).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Applies `delta` to a line quantity.
///
/// A result of zero or less is returned as-is (the caller drops the line).
/// Overflow, or a result above [`MAX_LINE_QUANTITY`], is rejected.
///
/// ```rust
/// use taproom_core::validation::checked_line_quantity;
///
/// assert_eq!(checked_line_quantity(2, 1).unwrap(), 3);
/// assert_eq!(checked_line_quantity(2, -5).unwrap(), -3);
/// assert!(checked_line_quantity(2, i64::MAX).is_err());
/// ```
pub fn checked_line_quantity(current: i64, delta: i64) -> ValidationResult<i64> {
    match current.checked_add(delta) {
        Some(requested) if requested <= MAX_LINE_QUANTITY => Ok(requested),
        _ => Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        }),
    }
}

/// Validates a stock count or low-stock threshold (>= 0).
pub fn validate_stock_count(field: &str, count: i64) -> ValidationResult<()> {
    if count < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a restock delta (> 0).
pub fn validate_restock(delta: i64) -> ValidationResult<()> {
    if delta <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "restock quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional barcode and normalises blank strings to `None`.
pub fn normalize_barcode(barcode: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(code) = barcode.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    if code.len() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if !code.chars().all(|c| c.is_ascii_graphic()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only printable characters without spaces".to_string(),
        });
    }

    Ok(Some(code.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================
