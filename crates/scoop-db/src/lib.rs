//! # scoop-db: Storage and Fulfillment for Scoop
//!
//! SQLite persistence plus the transactional workflows that need it:
//! composing orders, settling them against branch stock, and moving stock
//! between branches.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scoop Data Flow                                  │
//! │                                                                         │
//! │  apps/api handler (PATCH /orders/{id})                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     scoop-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  fulfillment  │    │  repository  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │              │  │   │
//! │  │   │               │    │ OrderService  │    │ order.rs     │  │   │
//! │  │   │ SqlitePool    │◄───│ Inventory-    │───►│ stock.rs     │  │   │
//! │  │   │ begin_write   │    │   Service     │    │ reference.rs │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, configuration, write transactions
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - SQL for reference data, orders and stock
//! - [`fulfillment`] - Composer, settlement, reconcile, movements
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scoop_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("scoop.db")).await?;
//!
//! let order = db.orders().create(new_order).await?;
//! let paid = db.orders().confirm(&order.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fulfillment;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use fulfillment::{InventoryService, OrderService};
pub use pool::{begin_write, Database, DbConfig};
pub use repository::reference::ReferenceRepository;
