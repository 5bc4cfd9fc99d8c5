//! # Domain Types
//!
//! Core domain types used throughout Scoop.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │    LineItem     │   │  LineItemKind   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │──►│  quantity       │──►│  Catalog        │       │
//! │  │  branch/staff   │   │  unit_price     │   │  Customized ────┼──┐    │
//! │  │  state          │   │  subtotal       │   └─────────────────┘  │    │
//! │  │  total_cents    │   └─────────────────┘                        │    │
//! │  └─────────────────┘                                              ▼    │
//! │                        ┌─────────────────┐   ┌─────────────────┐       │
//! │                        │ CustomizedItem  │──►│   Component     │       │
//! │                        │  margin         │   │  raw_material   │       │
//! │                        └─────────────────┘   │  quantity (0.25)│       │
//! │                                              └─────────────────┘       │
//! │                                                                         │
//! │  Stock pools (per branch):  FinishedGoodStock   RawMaterialStock        │
//! │  Reference data:            Branch  StaffMember  Customer               │
//! │                             CatalogItem  RawMaterial                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Line items and components copy the price (and display name) that applied
//! when the order was composed. Later catalog price changes never touch
//! existing orders.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::quantity::{Margin, Quantity};

// =============================================================================
// Reference Data
// =============================================================================

/// A physical sales location. Every stock record is scoped to one branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A staff member who takes orders.
///
/// `role` is the master-data role name. It is carried for display only;
/// authorization decisions happen at the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub username: String,
    pub role: String,
    pub branch_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl Customer {
    /// Name shown on orders: last name when present, else first name.
    pub fn display_name(&self) -> &str {
        self.last_name.as_deref().unwrap_or(&self.first_name)
    }
}

/// A fixed, pre-defined sellable product with a standard price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    /// Current base price in cents. Snapshotted onto line items.
    pub base_price_cents: i64,
    /// Ice cream vs topping/garnish.
    pub is_ice_cream: bool,
}

impl CatalogItem {
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

/// Unit of measure for a raw material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MeasureUnit {
    Kg,
    Liter,
    Unit,
    Gram,
}

/// An ingredient stocked per branch and consumed by customized items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RawMaterial {
    pub id: String,
    pub name: String,
    pub unit: MeasureUnit,
    /// Base price per unit of measure, in cents.
    pub base_price_cents: i64,
    /// Below this level the material is flagged as low stock.
    /// Never blocks settlement.
    #[ts(type = "string")]
    pub min_stock: Quantity,
    #[ts(as = "Option<String>")]
    pub expires_on: Option<NaiveDate>,
}

impl RawMaterial {
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }

    #[inline]
    pub fn is_low(&self, stock: Quantity) -> bool {
        stock < self.min_stock
    }
}

// =============================================================================
// Order State
// =============================================================================

/// The lifecycle state of an order.
///
/// ```text
///   Pending ──confirm──► Paid       (settles stock, terminal)
///      │
///      └────cancel────► Cancelled  (no stock effect, terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Composed and priced, stock untouched.
    Pending,
    /// Paid and settled against branch stock.
    Paid,
    /// Abandoned before payment.
    Cancelled,
}

impl OrderState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pending => "pending",
            OrderState::Paid => "paid",
            OrderState::Cancelled => "cancelled",
        }
    }

    /// Paid and Cancelled accept no further transitions.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, OrderState::Pending)
    }
}

impl Default for OrderState {
    fn default() -> Self {
        OrderState::Pending
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

// =============================================================================
// Order
// =============================================================================

/// A customer order with its line items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub branch_id: String,
    pub branch_name: String,
    pub staff_id: String,
    pub staff_name: String,
    /// None for anonymous walk-in orders.
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub state: OrderState,
    pub payment_method: Option<PaymentMethod>,
    /// Derived from line subtotals by reconciliation.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    pub lines: Vec<LineItem>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Sum of the persisted line subtotals.
    pub fn lines_total(&self) -> Money {
        self.lines.iter().map(LineItem::subtotal).sum()
    }

    /// True when the stored total disagrees with the lines.
    pub fn total_is_stale(&self) -> bool {
        self.total() != self.lines_total()
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A line in an order.
///
/// `subtotal_cents == quantity × unit_price_cents` always holds; both prices
/// are snapshots taken when the order was composed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    /// Zero-based position within the order.
    pub position: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub item: LineItemKind,
}

impl LineItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    pub fn catalog_item_id(&self) -> Option<&str> {
        match &self.item {
            LineItemKind::Catalog { catalog_item_id, .. } => Some(catalog_item_id),
            LineItemKind::Customized(_) => None,
        }
    }

    pub fn customized_item(&self) -> Option<&CustomizedItem> {
        match &self.item {
            LineItemKind::Catalog { .. } => None,
            LineItemKind::Customized(item) => Some(item),
        }
    }
}

/// What a line sells: exactly one of a catalog item or a customized item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineItemKind {
    Catalog {
        catalog_item_id: String,
        /// Catalog name at the time of reading.
        name: String,
    },
    Customized(CustomizedItem),
}

// =============================================================================
// Customized Item
// =============================================================================

/// An order-specific composition of raw materials.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomizedItem {
    pub id: String,
    pub name: Option<String>,
    /// Margin every component was priced with.
    #[ts(type = "string")]
    pub margin: Margin,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub components: Vec<Component>,
}

impl CustomizedItem {
    /// Sum of the component subtotals: the parent line's unit price.
    pub fn components_total(&self) -> Money {
        self.components.iter().map(Component::subtotal).sum()
    }
}

/// One raw material inside a customized item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Component {
    pub raw_material_id: String,
    pub name: String,
    pub unit: MeasureUnit,
    #[ts(type = "string")]
    pub quantity: Quantity,
    /// Base price × (1 + margin), snapshotted.
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl Component {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Stock
// =============================================================================

/// The two per-branch stock pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockPool {
    FinishedGood,
    RawMaterial,
}

impl fmt::Display for StockPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockPool::FinishedGood => f.write_str("finished good"),
            StockPool::RawMaterial => f.write_str("raw material"),
        }
    }
}

/// Finished-good stock at one branch. `available` never goes negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinishedGoodStock {
    pub branch_id: String,
    pub catalog_item_id: String,
    pub available: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Raw-material stock at one branch. `stock` never goes negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RawMaterialStock {
    pub branch_id: String,
    pub raw_material_id: String,
    #[ts(type = "string")]
    pub stock: Quantity,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Finished-good inventory row joined with its catalog item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinishedGoodStockView {
    pub branch_id: String,
    pub catalog_item_id: String,
    pub name: String,
    pub is_ice_cream: bool,
    pub available: i64,
}

/// Raw-material inventory row joined with its material.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RawMaterialStockView {
    pub branch_id: String,
    pub raw_material_id: String,
    pub name: String,
    pub unit: MeasureUnit,
    pub base_price_cents: i64,
    #[ts(type = "string")]
    pub stock: Quantity,
    #[ts(type = "string")]
    pub min_stock: Quantity,
    #[ts(as = "Option<String>")]
    pub expires_on: Option<NaiveDate>,
    pub low_stock: bool,
}

/// A raw material below its minimum at a branch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LowStockAlert {
    pub branch_id: String,
    pub branch_name: String,
    pub raw_material_id: String,
    pub name: String,
    pub unit: MeasureUnit,
    #[ts(type = "string")]
    pub current: Quantity,
    #[ts(type = "string")]
    pub minimum: Quantity,
    /// `minimum - current`
    #[ts(type = "string")]
    pub shortfall: Quantity,
    #[ts(as = "Option<String>")]
    pub expires_on: Option<NaiveDate>,
}

/// Both sides of a completed branch transfer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransferOutcome {
    pub origin: FinishedGoodStock,
    pub destination: FinishedGoodStock,
}

/// Result of an absolute raw-material adjustment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RawMaterialAdjustment {
    pub record: RawMaterialStock,
    pub low_stock: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn component(id: &str, subtotal: i64) -> Component {
        Component {
            raw_material_id: id.to_string(),
            name: id.to_string(),
            unit: MeasureUnit::Kg,
            quantity: Quantity::from_hundredths(50),
            unit_price_cents: subtotal * 2,
            subtotal_cents: subtotal,
        }
    }

    #[test]
    fn test_order_state_terminal() {
        assert!(!OrderState::Pending.is_terminal());
        assert!(OrderState::Paid.is_terminal());
        assert!(OrderState::Cancelled.is_terminal());
        assert_eq!(OrderState::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_line_item_kind_serializes_with_tag() {
        let line = LineItem {
            id: "l-1".to_string(),
            position: 0,
            quantity: 2,
            unit_price_cents: 350,
            subtotal_cents: 700,
            item: LineItemKind::Catalog {
                catalog_item_id: "cone".to_string(),
                name: "Cone".to_string(),
            },
        };
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["item"]["kind"], "catalog");
        assert_eq!(json["item"]["catalog_item_id"], "cone");
        assert_eq!(line.catalog_item_id(), Some("cone"));
        assert!(line.customized_item().is_none());
    }

    #[test]
    fn test_customized_components_total() {
        let item = CustomizedItem {
            id: "c-1".to_string(),
            name: Some("Sundae".to_string()),
            margin: Margin::default(),
            created_at: Utc::now(),
            components: vec![component("m1", 260), component("m2", 75)],
        };
        assert_eq!(item.components_total().cents(), 335);

        let json = serde_json::to_value(LineItemKind::Customized(item)).unwrap();
        assert_eq!(json["kind"], "customized");
        assert_eq!(json["margin"], "0.30");
        assert_eq!(json["components"][0]["quantity"], "0.50");
    }

    #[test]
    fn test_raw_material_low_flag() {
        let material = RawMaterial {
            id: "m1".to_string(),
            name: "Chocolate base".to_string(),
            unit: MeasureUnit::Kg,
            base_price_cents: 400,
            min_stock: Quantity::from_units(2),
            expires_on: None,
        };
        assert!(material.is_low(Quantity::from_hundredths(150)));
        assert!(!material.is_low(Quantity::from_units(2)));
    }

    #[test]
    fn test_customer_display_name() {
        let anonymous_last = Customer {
            id: "c".to_string(),
            first_name: "Ana".to_string(),
            last_name: None,
        };
        assert_eq!(anonymous_last.display_name(), "Ana");
    }
}
