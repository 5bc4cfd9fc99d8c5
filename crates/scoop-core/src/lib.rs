//! # scoop-core: Pure Business Logic for Scoop
//!
//! This crate is the **heart** of the Scoop order-fulfillment core. It holds
//! every pricing rule, the order state machine and the settlement plan as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scoop Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    POST /orders ──► PATCH /orders/{id} ──► POST /transfers      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ capability checked                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    scoop-db (fulfillment)                       │   │
//! │  │    composer, settlement, reconcile, movements                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ scoop-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │   order   │  │   │
//! │  │   │   Order   │  │   Money   │  │  margins  │  │  states   │  │   │
//! │  │   │ LineItem  │  │ Quantity  │  │ subtotals │  │  requests │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, LineItem, stock records, reference data)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`quantity`] - Fixed-point quantities and margins
//! - [`order`] - Order state machine, line requests, settlement plan
//! - [`pricing`] - Pricing engine for catalog and customized lines
//! - [`stock`] - Transfer, adjustment and assignment requests
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use scoop_core::money::Money;
//! use scoop_core::quantity::{Margin, Quantity};
//!
//! // 0.50 kg of a material priced 4.00/kg, sold with a 30% margin
//! let base = Money::from_cents(400);
//! let unit_price = base.apply_margin(Margin::default()).unwrap();
//! assert_eq!(unit_price.cents(), 520);
//!
//! let subtotal = unit_price.times_quantity(Quantity::from_hundredths(50)).unwrap();
//! assert_eq!(subtotal.cents(), 260);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod quantity;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{
    plan_settlement, ComponentRequest, CreateOrderRequest, CustomizationRequest, LineKind,
    LineRequest, NewOrder, OrderPatch, RawLineRequest, StockDemand, Transition,
};
pub use quantity::{Margin, Quantity};
pub use stock::{
    AssignFinishedGood, AssignRawMaterial, FinishedGoodLevel, RawMaterialLevel, TransferRequest,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default margin applied to raw materials in a customized item (0.30).
pub const DEFAULT_MARGIN_BPS: u32 = 3000;

/// Maximum line items allowed in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum components in one customized item.
pub const MAX_COMPONENTS_PER_ITEM: usize = 30;

/// Maximum quantity of a single catalog item on one line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum amount of one raw material in a customized item, in hundredths (10000.00).
pub const MAX_COMPONENT_HUNDREDTHS: i64 = 1_000_000;

/// Maximum whole units moved by one transfer.
pub const MAX_TRANSFER_UNITS: i64 = 1_000_000;

/// Ceiling for a finished-good record, in whole units.
pub const MAX_STOCK_UNITS: i64 = 1_000_000_000;

/// Ceiling for a raw-material record, in hundredths (1000000000.00).
pub const MAX_STOCK_HUNDREDTHS: i64 = 100_000_000_000;
