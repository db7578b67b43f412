//! # Error Types
//!
//! Domain-specific error types for stayhub-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stayhub-core errors (this file)                                       │
//! │  ├── CoreError        - Booking rule violations                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stayhub-db errors (separate crate)                                    │
//! │  ├── DbError          - Storage failures                               │
//! │  └── ServiceError     - CoreError | DbError, returned by managers      │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - {success:false, message, error?}               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError → Client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every [`CoreError`] belongs to exactly one [`ErrorKind`]; the HTTP layer
//! maps kinds to status codes and never inspects variants directly.

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// The externally visible error taxonomy.
///
/// ```text
/// Validation   → 400   missing / malformed input
/// NotFound     → 404   booking, room, override absent
/// InvalidState → 400   status precondition violated
/// Conflict     → 400   double booking, duplicate assignment
/// Forbidden    → 403   role lacks the capability
/// Unexpected   → 500   storage / transaction failure
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidState,
    Conflict,
    Forbidden,
    Unexpected,
}

// =============================================================================
// Core Error
// =============================================================================

/// Booking rule violations.
///
/// These errors are produced by the pure decision functions in this crate and
/// by the managers in `stayhub-db` after they have loaded the rows involved.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An operation was attempted from a status that does not allow it.
    ///
    /// ## When This Occurs
    /// - Check-in on a booking that is still `pending`
    /// - Check-out on a booking that never checked in
    /// - Cancel after the guest is already in the room
    /// - Assigning a room that is under maintenance
    #[error("{entity} {id} is {current}, cannot {operation}")]
    InvalidState {
        entity: &'static str,
        id: String,
        current: String,
        operation: &'static str,
    },

    /// The room is already held by another active booking over the same dates.
    ///
    /// ## User Workflow
    /// ```text
    /// Assign room 101 to BK-Y (Jun 03 → Jun 06)
    ///      │
    ///      ▼
    /// Overlap check: BK-X holds 101 for Jun 01 → Jun 05
    ///      │
    ///      ▼
    /// Conflict { room: "101", conflicting_booking: "BK-X" }
    /// ```
    #[error("Room {room} is already booked for overlapping dates (booking {conflicting_booking})")]
    Conflict {
        room: String,
        conflicting_booking: String,
    },

    /// A live room assignment already exists and must be released first.
    #[error("Booking {booking_id} already has room {room} assigned")]
    AlreadyAssigned { booking_id: String, room: String },

    /// Auto-assignment found no room matching the request.
    #[error("No room available from {check_in} to {check_out}")]
    NoAvailability { check_in: String, check_out: String },

    /// The acting user lacks the required capability.
    #[error("{role} is not allowed to {operation}")]
    Forbidden { role: String, operation: &'static str },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates an InvalidState error.
    pub fn invalid_state(
        entity: &'static str,
        id: impl Into<String>,
        current: impl ToString,
        operation: &'static str,
    ) -> Self {
        CoreError::InvalidState {
            entity,
            id: id.into(),
            current: current.to_string(),
            operation,
        }
    }

    /// Returns the taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InvalidState { .. } => ErrorKind::InvalidState,
            CoreError::Conflict { .. }
            | CoreError::AlreadyAssigned { .. }
            | CoreError::NoAvailability { .. } => ErrorKind::Conflict,
            CoreError::Forbidden { .. } => ErrorKind::Forbidden,
            CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Detected before a transaction is opened wherever possible.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Check-out is not after check-in.
    #[error("check_out_date ({check_out}) must be after check_in_date ({check_in})")]
    InvalidDateRange { check_in: String, check_out: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for a `Required` error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message() {
        let err = CoreError::Conflict {
            room: "101".to_string(),
            conflicting_booking: "BK-X".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Room 101 is already booked for overlapping dates (booking BK-X)"
        );
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_invalid_state_message() {
        let err = CoreError::invalid_state("Booking", "b-1", "pending", "check in");
        assert_eq!(err.to_string(), "Booking b-1 is pending, cannot check in");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("reason").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
        assert_eq!(core_err.to_string(), "Validation error: reason is required");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::not_found("Room", "r").kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::Forbidden {
                role: "receptionist".into(),
                operation: "override rates"
            }
            .kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            CoreError::AlreadyAssigned {
                booking_id: "b".into(),
                room: "101".into()
            }
            .kind(),
            ErrorKind::Conflict
        );
    }
}
