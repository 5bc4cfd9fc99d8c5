//! # Error Types
//!
//! Domain-specific error types for scoop-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  scoop-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  scoop-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures + wrapped CoreError          │
//! │                                                                         │
//! │  HTTP API errors (apps/api)                                            │
//! │  └── ApiError         - What the client sees (code + status)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item ID, branch, amounts)
//! 3. Errors are enum variants, never String
//! 4. Every expected failure kind stays distinguishable up to the client

use thiserror::Error;

use crate::quantity::Quantity;
use crate::types::{OrderState, StockPool};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// The API layer maps each variant to its own error code.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    ///
    /// ## When This Occurs
    /// - Branch, staff member or customer on a new order is unknown
    /// - Catalog item or raw material on a line cannot be resolved
    /// - Order ID doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Insufficient stock to settle an order or move stock.
    ///
    /// ## When This Occurs
    /// - Settlement finds a stock record missing or below the demanded amount
    /// - Transfer origin holds less than the requested quantity
    ///
    /// ## User Workflow
    /// ```text
    /// PATCH /orders/{id} { state: "paid" }
    ///      │
    ///      ▼
    /// Lock stock row (branch, "VANILLA-CONE"): available = 3
    ///      │
    ///      ▼
    /// InsufficientStock { item_id: "VANILLA-CONE", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole settlement rolls back, order stays pending
    /// ```
    #[error(
        "Insufficient stock for {pool} {item_id} at branch {branch_id}: available {}, requested {}",
        describe_amount(.pool, .available),
        describe_amount(.pool, .requested)
    )]
    InsufficientStock {
        pool: StockPool,
        branch_id: String,
        item_id: String,
        requested: Quantity,
        available: Quantity,
    },

    /// Order is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Confirming an order that is already paid
    /// - Confirming or cancelling a cancelled order
    /// - Cancelling a paid order (there is no compensation path)
    #[error("Order {order_id} is {from}, cannot move to {to}")]
    InvalidTransition {
        order_id: String,
        from: OrderState,
        to: OrderState,
    },

    /// A stock record for this branch and item already exists.
    #[error("{pool} {item_id} is already assigned to branch {branch_id}")]
    StockRecordExists {
        pool: StockPool,
        branch_id: String,
        item_id: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Finished goods are counted in whole units, raw materials in hundredths.
fn describe_amount(pool: &StockPool, amount: &Quantity) -> String {
    match pool {
        StockPool::FinishedGood => amount.whole_units().to_string(),
        StockPool::RawMaterial => amount.to_string(),
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Used for early validation before any transaction is opened.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value exceeds its upper bound. `max` is rendered in the field's own units.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., too many decimal places, unknown kind).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., the same raw material twice in one item).
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },

    /// Two mutually exclusive fields were both supplied.
    #[error("only one of {first} or {second} may be supplied")]
    Exclusive { first: String, second: String },

    /// Neither of two alternative fields was supplied.
    #[error("one of {first} or {second} is required")]
    OneRequired { first: String, second: String },
}

impl ValidationError {
    /// Qualifies the field name(s) with a path prefix: `quantity` → `lines[2].quantity`.
    pub fn within(self, prefix: impl std::fmt::Display) -> Self {
        let qualify = |field: String| format!("{}.{}", prefix, field);
        match self {
            ValidationError::Required { field } => ValidationError::Required {
                field: qualify(field),
            },
            ValidationError::TooLong { field, max } => ValidationError::TooLong {
                field: qualify(field),
                max,
            },
            ValidationError::OutOfRange { field, min, max } => ValidationError::OutOfRange {
                field: qualify(field),
                min,
                max,
            },
            ValidationError::TooLarge { field, max } => ValidationError::TooLarge {
                field: qualify(field),
                max,
            },
            ValidationError::MustBePositive { field } => ValidationError::MustBePositive {
                field: qualify(field),
            },
            ValidationError::MustNotBeNegative { field } => ValidationError::MustNotBeNegative {
                field: qualify(field),
            },
            ValidationError::InvalidFormat { field, reason } => ValidationError::InvalidFormat {
                field: qualify(field),
                reason,
            },
            ValidationError::NotAllowed { field, allowed } => ValidationError::NotAllowed {
                field: qualify(field),
                allowed,
            },
            ValidationError::Duplicate { field, value } => ValidationError::Duplicate {
                field: qualify(field),
                value,
            },
            ValidationError::Exclusive { first, second } => ValidationError::Exclusive {
                first: qualify(first),
                second: qualify(second),
            },
            ValidationError::OneRequired { first, second } => ValidationError::OneRequired {
                first: qualify(first),
                second: qualify(second),
            },
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_finished_good_message() {
        let err = CoreError::InsufficientStock {
            pool: StockPool::FinishedGood,
            branch_id: "centro".to_string(),
            item_id: "VANILLA-CONE".to_string(),
            requested: Quantity::from_units(5),
            available: Quantity::from_units(3),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for finished good VANILLA-CONE at branch centro: available 3, requested 5"
        );
    }

    #[test]
    fn test_insufficient_raw_material_message() {
        let err = CoreError::InsufficientStock {
            pool: StockPool::RawMaterial,
            branch_id: "centro".to_string(),
            item_id: "CHOC-BASE".to_string(),
            requested: Quantity::from_hundredths(50),
            available: Quantity::from_hundredths(25),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for raw material CHOC-BASE at branch centro: available 0.25, requested 0.50"
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = CoreError::InvalidTransition {
            order_id: "o-1".to_string(),
            from: OrderState::Paid,
            to: OrderState::Paid,
        };
        assert_eq!(err.to_string(), "Order o-1 is paid, cannot move to paid");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "lines".to_string(),
        };
        assert_eq!(err.to_string(), "lines is required");

        let err = ValidationError::Exclusive {
            first: "catalog_item_id".to_string(),
            second: "customization".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "only one of catalog_item_id or customization may be supplied"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "branch_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
