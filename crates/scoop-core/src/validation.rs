//! # Validation Module
//!
//! Input validation utilities for the order and inventory requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP boundary (apps/api)                                     │
//! │  ├── JSON shape (deserialization, decimal places)                      │
//! │  └── Caller role and branch scope                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Request types (order.rs, stock.rs)                           │
//! │  └── THIS MODULE: field rules, checked before a transaction opens      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (available >= 0), CHECK (stock_hundredths >= 0)             │
//! │  ├── UNIQUE (branch_id, item_id) on stock records                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use scoop_core::validation::{validate_id, validate_line_quantity};
//!
//! validate_id("branch_id", "centro").unwrap();
//! validate_line_quantity(5).unwrap();
//! assert!(validate_line_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::quantity::Quantity;
use crate::{
    MAX_COMPONENT_HUNDREDTHS, MAX_ITEM_QUANTITY, MAX_STOCK_HUNDREDTHS, MAX_STOCK_UNITS,
    MAX_TRANSFER_UNITS,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest identifier accepted for any entity.
pub const MAX_ID_LEN: usize = 64;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an entity identifier.
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most 64 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use scoop_core::validation::validate_id;
///
/// assert!(validate_id("catalog_item_id", "VANILLA-CONE").is_ok());
/// assert!(validate_id("catalog_item_id", "").is_err());
/// assert!(validate_id("catalog_item_id", "has space").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional free-text field (custom item name, movement reason).
///
/// Absent is fine; present-but-blank is rejected.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    let Some(value) = value else {
        return Ok(());
    };

    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the quantity on a catalog line.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## Flow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  POST /orders  { lines: [{ catalog_item_id: "cone", quantity: 5 }] }    │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_line_quantity(5) ← THIS FUNCTION                             │
/// │       │                                                                 │
/// │       ├── qty <= 0?  → "quantity must be positive"                     │
/// │       ├── qty > 999? → "quantity must be between 1 and 999"            │
/// │       └── OK → composer resolves and prices the line                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a raw-material amount inside a customized item.
///
/// Bounded by `MAX_COMPONENT_HUNDREDTHS` so that price × quantity stays
/// within i64 cents for any realistic base price.
pub fn validate_component_quantity(quantity: Quantity) -> ValidationResult<()> {
    if !quantity.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if quantity.hundredths() > MAX_COMPONENT_HUNDREDTHS {
        return Err(ValidationError::TooLarge {
            field: "quantity".to_string(),
            max: Quantity::from_hundredths(MAX_COMPONENT_HUNDREDTHS).to_string(),
        });
    }
    Ok(())
}

/// Validates a whole-unit amount moved between branches.
pub fn validate_transfer_units(units: i64) -> ValidationResult<()> {
    if units <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if units > MAX_TRANSFER_UNITS {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_TRANSFER_UNITS,
        });
    }
    Ok(())
}

/// Validates an absolute finished-good level (adjust/assign).
pub fn validate_stock_units(field: &str, units: i64) -> ValidationResult<()> {
    if units < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    if units > MAX_STOCK_UNITS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK_UNITS,
        });
    }
    Ok(())
}

/// Validates an absolute raw-material level (adjust/assign).
pub fn validate_stock_level(field: &str, level: Quantity) -> ValidationResult<()> {
    if level.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    if level.hundredths() > MAX_STOCK_HUNDREDTHS {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: Quantity::from_hundredths(MAX_STOCK_HUNDREDTHS).to_string(),
        });
    }
    Ok(())
}

/// Validates a price in cents.
///
/// ## Example
/// ```rust
/// use scoop_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("id", "VANILLA-CONE").is_ok());
        assert!(validate_id("id", "branch_01").is_ok());

        assert!(validate_id("id", "").is_err());
        assert!(validate_id("id", "   ").is_err());
        assert!(validate_id("id", "has space").is_err());
        assert!(validate_id("id", &"A".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_optional_text() {
        assert!(validate_optional_text("name", None, 10).is_ok());
        assert!(validate_optional_text("name", Some("Sundae"), 10).is_ok());
        assert!(validate_optional_text("name", Some("  "), 10).is_err());
        assert!(validate_optional_text("name", Some("Banana split deluxe"), 10).is_err());
    }

    #[test]
    fn test_validate_line_quantity() {
        assert!(validate_line_quantity(1).is_ok());
        assert!(validate_line_quantity(999).is_ok());

        assert!(validate_line_quantity(0).is_err());
        assert!(validate_line_quantity(-1).is_err());
        assert!(validate_line_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_stock_levels() {
        assert!(validate_stock_units("available", 0).is_ok());
        assert!(validate_stock_units("available", -1).is_err());

        assert!(validate_stock_level("stock", Quantity::from_hundredths(25)).is_ok());
        assert!(validate_stock_level("stock", Quantity::from_hundredths(-1)).is_err());

        assert!(validate_component_quantity(Quantity::zero()).is_err());
        assert!(validate_transfer_units(0).is_err());
        assert!(validate_transfer_units(3).is_ok());
    }

    #[test]
    fn test_quantities_have_upper_bounds() {
        let max_component = Quantity::from_hundredths(MAX_COMPONENT_HUNDREDTHS);
        assert!(validate_component_quantity(max_component).is_ok());
        assert!(matches!(
            validate_component_quantity(Quantity::from_hundredths(90_000_000_000_000_000)),
            Err(ValidationError::TooLarge { .. })
        ));

        assert!(validate_transfer_units(MAX_TRANSFER_UNITS).is_ok());
        assert!(validate_transfer_units(MAX_TRANSFER_UNITS + 1).is_err());
        assert!(validate_transfer_units(i64::MAX).is_err());

        assert!(validate_stock_units("available", MAX_STOCK_UNITS).is_ok());
        assert!(validate_stock_units("available", i64::MAX).is_err());

        assert!(validate_stock_level("stock", Quantity::from_hundredths(MAX_STOCK_HUNDREDTHS)).is_ok());
        assert!(validate_stock_level("stock", Quantity::from_hundredths(i64::MAX)).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }
}
