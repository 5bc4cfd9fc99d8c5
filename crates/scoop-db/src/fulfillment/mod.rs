//! # Fulfillment
//!
//! The transactional workflows. Engines (`composer`, `settlement`,
//! `reconcile`, `movements`) run on a caller-owned connection; the
//! services own the pool and the transaction boundary.
//!
//! ```text
//! OrderService ──┬── composer ──┬── pricing
//!                │              └── reconcile
//!                └── settlement ─── reconcile
//!
//! InventoryService ── movements
//! ```

pub mod composer;
pub mod inventory;
pub mod movements;
pub mod orders;
pub mod pricing;
pub mod reconcile;
pub mod settlement;

pub use inventory::InventoryService;
pub use orders::OrderService;
