//! # Scoop API
//!
//! HTTP boundary for the order-fulfillment core.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Routes                                      │
//! │                                                                         │
//! │  ┌────────────────────────────┐  ┌────────────────────────────────────┐│
//! │  │  Orders                    │  │  Inventory                         ││
//! │  │                            │  │                                    ││
//! │  │ • POST  /orders            │  │ • POST /inventory/transfers        ││
//! │  │ • GET   /orders/{id}       │  │ • PUT  .../products/{item}         ││
//! │  │ • PATCH /orders/{id}       │  │ • PUT  .../materials/{m}           ││
//! │  │ • POST  /orders/{id}/...   │  │ • POST/GET .../products            ││
//! │  │ • GET   /branches/{id}/... │  │ • POST/GET .../materials, alerts   ││
//! │  └────────────────────────────┘  └────────────────────────────────────┘│
//! │                                                                         │
//! │  Caller (JWT + Policy) ──► scoop-db services ──► ApiError on failure    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (or `scoop.toml`):
//! - `SCOOP_PORT` - HTTP port (default: 8080)
//! - `SCOOP_DATABASE_PATH` - SQLite file (default: ./scoop.db)
//! - `SCOOP_MAX_CONNECTIONS` - Pool size (default: 8)
//! - `SCOOP_BUSY_TIMEOUT_SECS` - Write lock wait (default: 5)
//! - `SCOOP_JWT_SECRET` - Secret for JWT validation
//! - `SCOOP_TOKEN_LIFETIME_SECS` - Lifetime of minted tokens (default: 28800)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use auth::{Caller, Capability, JwtManager, Policy};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

use scoop_db::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub policy: Arc<Policy>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AppState {
            db,
            jwt,
            policy: Arc::new(Policy::default()),
        }
    }
}

/// The full router with tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .merge(routes::orders::router())
        .merge(routes::inventory::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
