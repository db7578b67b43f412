//! # stayhub-db: Database Layer and Managers for StayHub
//!
//! This crate owns every write to bookings, rooms and room bookings. It uses
//! SQLite through sqlx and runs each manager operation as one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StayHub Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /receptionist/check-in/:id)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    stayhub-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │   Managers    │   │  Repositories │   │  Migrations   │    │   │
//! │  │   │  (service/)   │──►│ (repository/) │   │  (embedded)   │    │   │
//! │  │   │               │   │               │   │               │    │   │
//! │  │   │ Lifecycle     │   │ booking       │   │ tables        │    │   │
//! │  │   │ Assignment    │   │ room_booking  │   │ overlap       │    │   │
//! │  │   │ Override      │   │ audit ...     │   │   triggers    │    │   │
//! │  │   └───────┬───────┘   └───────────────┘   └───────────────┘    │   │
//! │  │           │                                                     │   │
//! │  │           ▼                                                     │   │
//! │  │   ┌───────────────┐   ┌───────────────┐                        │   │
//! │  │   │  UnitOfWork   │   │   Database    │                        │   │
//! │  │   │  one tx/op    │◄──│   (pool.rs)   │                        │   │
//! │  │   └───────────────┘   └───────────────┘                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  │                     ./data/stayhub.db                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`unit_of_work`] - One transaction per manager operation
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - SQL for every table
//! - [`service`] - Managers that enforce the booking rules
//! - [`password`] - Staff password hashing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stayhub_db::{Database, DbConfig, LifecycleManager, SqlInvoiceAggregator};
//!
//! let db = Database::new(DbConfig::new("./data/stayhub.db")).await?;
//! let lifecycle = LifecycleManager::new(db.clone(), SqlInvoiceAggregator);
//!
//! let booking = lifecycle.check_in(&actor, &booking_id, CheckInRequest::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;
pub mod service;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::audit::{AuditFilter, AuditRepository};
pub use repository::booking::{BookingDetails, BookingRepository};
pub use repository::overrides::{OverrideFilter, OverrideRepository};
pub use repository::room::RoomRepository;
pub use repository::staff::{Staff, StaffRepository};
pub use repository::Page;

// Managers
pub use service::assignment::{AssignmentManager, AssignRequest, AutoAssignPreferences, UnassignOutcome};
pub use service::availability::AvailabilityChecker;
pub use service::error::{ServiceError, ServiceResult};
pub use service::history::{HistoryQueries, PageRequest};
pub use service::invoice::{Invoice, InvoiceAggregator, InvoiceItem, SqlInvoiceAggregator};
pub use service::lifecycle::{CheckInRequest, CheckOutRequest, CheckoutOverride, LifecycleManager};
pub use service::modification::{ModificationManager, ModificationRequest};
pub use service::overrides::{OverrideManager, OverrideOutcome, OverrideRequest, ReversalOutcome};
pub use service::reservation::{NewBooking, NewRoomBooking, ReservationManager};
