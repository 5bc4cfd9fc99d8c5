//! Stock movement requests: transfers, absolute adjustments, assignments.
//!
//! Every request validates its own shape before a transaction is opened.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::quantity::Quantity;
use crate::validation::{
    validate_id, validate_optional_text, validate_stock_level, validate_stock_units,
    validate_transfer_units, ValidationResult,
};

/// Longest free-text reason accepted on a movement.
pub const MAX_REASON_LEN: usize = 255;

/// Moves finished goods from one branch to another.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransferRequest {
    pub origin_branch_id: String,
    pub destination_branch_id: String,
    pub catalog_item_id: String,
    /// Whole units, must be positive.
    pub quantity: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

impl TransferRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("origin_branch_id", &self.origin_branch_id)?;
        validate_id("destination_branch_id", &self.destination_branch_id)?;
        validate_id("catalog_item_id", &self.catalog_item_id)?;

        if self.origin_branch_id == self.destination_branch_id {
            return Err(ValidationError::InvalidFormat {
                field: "destination_branch_id".to_string(),
                reason: "must differ from origin_branch_id".to_string(),
            });
        }

        validate_transfer_units(self.quantity)?;
        validate_optional_text("reason", self.reason.as_deref(), MAX_REASON_LEN)
    }
}

/// Absolute set of a finished-good record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinishedGoodLevel {
    pub available: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

impl FinishedGoodLevel {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_stock_units("available", self.available)?;
        validate_optional_text("reason", self.reason.as_deref(), MAX_REASON_LEN)
    }
}

/// Absolute set of a raw-material record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RawMaterialLevel {
    #[ts(type = "string")]
    pub stock: Quantity,
    #[serde(default)]
    pub reason: Option<String>,
}

impl RawMaterialLevel {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_stock_level("stock", self.stock)?;
        validate_optional_text("reason", self.reason.as_deref(), MAX_REASON_LEN)
    }
}

/// Starts carrying a catalog item at a branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssignFinishedGood {
    pub catalog_item_id: String,
    #[serde(default)]
    pub initial: i64,
}

impl AssignFinishedGood {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("catalog_item_id", &self.catalog_item_id)?;
        validate_stock_units("initial", self.initial)
    }
}

/// Starts carrying a raw material at a branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssignRawMaterial {
    pub raw_material_id: String,
    #[serde(default)]
    #[ts(type = "string")]
    pub initial: Quantity,
}

impl AssignRawMaterial {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("raw_material_id", &self.raw_material_id)?;
        validate_stock_level("initial", self.initial)
    }
}
