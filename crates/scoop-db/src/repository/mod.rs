//! # Repository Module
//!
//! SQL for every table lives here; nothing above this layer writes SQL.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fulfillment (composer, settlement, movements, reconcile)              │
//! │       │                                                                 │
//! │       │  &mut SqliteConnection from an open write transaction           │
//! │       ▼                                                                 │
//! │  repository                                                             │
//! │  ├── reference  branches, staff, customers, catalog, raw materials     │
//! │  ├── order      order header, lines, customized items, components      │
//! │  └── stock      finished-good and raw-material records, views, alerts  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single-statement lookups are generic over `sqlx::Executor`, so the same
//! function serves a pool read and a read inside a transaction.

pub mod order;
pub mod reference;
pub mod stock;
