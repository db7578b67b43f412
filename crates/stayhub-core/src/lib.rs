//! # stayhub-core: Pure Booking Logic for StayHub
//!
//! This crate holds the rules that keep reservations consistent: the money
//! type, the half-open overlap predicate, the booking state machine and the
//! role capabilities. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StayHub Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 React admin pages (outside this repo)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP + JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    auth, role guard, JSON envelope, routes                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    stayhub-db                                   │   │
//! │  │    transactional managers, repositories, SQLite                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stayhub-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌───────────┐ ┌───────┐ │   │
//! │  │   │  types  │ │  money  │ │ overlap  │ │ lifecycle │ │ actor │ │   │
//! │  │   │ Booking │ │  Money  │ │StayRange │ │Transition │ │ Role  │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └───────────┘ └───────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Booking, RoomBooking, Room, AdminOverride, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`rate`] - Per-stay rate breakdown and its reconciled final amount
//! - [`overlap`] - Half-open stay ranges and the conflict predicate
//! - [`lifecycle`] - Booking status transitions and operation guards
//! - [`actor`] - Roles, capabilities, the acting staff member
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use stayhub_core::overlap::StayRange;
//!
//! let june = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();
//! let x = StayRange::new(june(1), june(5)).unwrap();
//! let z = StayRange::new(june(5), june(8)).unwrap();
//!
//! // Check-out day of one stay may be check-in day of the next.
//! assert!(!x.overlaps(&z));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod actor;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod overlap;
pub mod rate;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use actor::{Actor, Capability, Role};
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use overlap::StayRange;
pub use rate::{RateBreakdown, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest stay accepted in a single room booking.
pub const MAX_NIGHTS: i64 = 365;

/// Upper bound for adults or children on one room booking.
pub const MAX_OCCUPANTS: i64 = 20;

/// Upper bound for reasons and notes.
pub const MAX_TEXT_LEN: usize = 1000;

/// Prefix of human readable booking references.
pub const BOOKING_REFERENCE_PREFIX: &str = "BK";

/// Builds a booking reference such as `BK-20240601-3F9A1C`.
///
/// The suffix is the first six hex digits of `seed`, upper-cased. Callers
/// pass a fresh v4 UUID and retry on the (unlikely) unique violation.
pub fn booking_reference(date: chrono::NaiveDate, seed: &uuid::Uuid) -> String {
    let suffix: String = seed.simple().to_string().chars().take(6).collect();
    format!(
        "{}-{}-{}",
        BOOKING_REFERENCE_PREFIX,
        date.format("%Y%m%d"),
        suffix.to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_reference_format() {
        let seed = uuid::Uuid::parse_str("3f9a1c00-e29b-41d4-a716-446655440000").unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(booking_reference(date, &seed), "BK-20240601-3F9A1C");
    }
}
