//! # StayHub API
//!
//! HTTP server for the front desk and the admin pages.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            API Routes                                   │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /auth         │  │  /bookings     │  │  /room-assignment          ││
//! │  │                │  │                │  │                            ││
//! │  │ • login        │  │ • create, get  │  │ • assign                   ││
//! │  │                │  │ • confirm      │  │ • auto-assign              ││
//! │  │                │  │ • invoice      │  │ • unassign                 ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │ /receptionist  │  │  /admin        │  │  /rooms, /health           ││
//! │  │                │  │                │  │                            ││
//! │  │ • check-in     │  │ • overrides    │  │ • availability search      ││
//! │  │ • check-out    │  │ • history      │  │                            ││
//! │  │ • cancel       │  │ • modifications│  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (see [`config`]):
//! - `STAYHUB_BIND_ADDR` - listen address (default: 0.0.0.0:8080)
//! - `STAYHUB_DATABASE_PATH` - SQLite file (default: ./data/stayhub.db)
//! - `STAYHUB_JWT_SECRET` - Secret for JWT signing
//! - `STAYHUB_JWT_LIFETIME_SECS` - Token lifetime (default: 28800)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use stayhub_db::{
    AssignmentManager, AvailabilityChecker, Database, HistoryQueries, LifecycleManager,
    ModificationManager, OverrideManager, ReservationManager, SqlInvoiceAggregator,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use auth::{CurrentActor, JwtManager};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResponse, ApiResult};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub reservations: ReservationManager,
    pub assignments: AssignmentManager,
    pub availability: AvailabilityChecker,
    pub lifecycle: LifecycleManager<SqlInvoiceAggregator>,
    pub overrides: OverrideManager,
    pub modifications: ModificationManager,
    pub history: HistoryQueries,
}

impl AppState {
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        AppState {
            jwt: Arc::new(JwtManager::new(&config.jwt_secret, config.jwt_lifetime_secs)),
            reservations: ReservationManager::new(db.clone()),
            assignments: AssignmentManager::new(db.clone()),
            availability: AvailabilityChecker::new(db.clone()),
            lifecycle: LifecycleManager::new(db.clone(), SqlInvoiceAggregator),
            overrides: OverrideManager::new(db.clone()),
            modifications: ModificationManager::new(db.clone()),
            history: HistoryQueries::new(db.clone())
                .with_page_limits(config.default_page_size, config.max_page_size),
            db,
        }
    }
}

/// Builds the full router with tracing and CORS layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(routes::bookings::router())
        .merge(routes::rooms::router())
        .merge(routes::assignment::router())
        .merge(routes::receptionist::router())
        .merge(routes::admin::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
