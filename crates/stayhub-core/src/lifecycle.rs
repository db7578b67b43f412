//! # Booking State Machine
//!
//! The single place where booking status transitions are decided.
//!
//! ```text
//!  pending ──confirm──► confirmed ──check_in──► checked_in ──check_out──► checked_out ──complete──► completed
//!     │                     │
//!     └──────cancel─────────┴──► cancelled
//! ```
//!
//! `checked_in` is the only state in which a guest occupies a room. Once a
//! booking reaches it, cancellation is no longer possible.
//!
//! Managers in `stayhub-db` load the booking inside their transaction and
//! ask this module whether the operation may proceed; nothing here touches
//! storage.

use crate::error::{CoreError, CoreResult};
use crate::types::{Booking, BookingStatus, PaymentStatus, Room};

/// A status-changing event on a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Confirm,
    CheckIn,
    CheckOut,
    Cancel,
    Complete,
}

impl Transition {
    pub const fn operation(&self) -> &'static str {
        match self {
            Transition::Confirm => "confirm",
            Transition::CheckIn => "check in",
            Transition::CheckOut => "check out",
            Transition::Cancel => "cancel",
            Transition::Complete => "complete",
        }
    }
}

/// Returns the status reached by applying `transition` to `current`.
///
/// ## Example
/// ```rust
/// use stayhub_core::lifecycle::{next_status, Transition};
/// use stayhub_core::types::BookingStatus;
///
/// assert_eq!(
///     next_status("b-1", BookingStatus::Confirmed, Transition::CheckIn).unwrap(),
///     BookingStatus::CheckedIn
/// );
/// assert!(next_status("b-1", BookingStatus::CheckedIn, Transition::Cancel).is_err());
/// ```
pub fn next_status(
    booking_id: &str,
    current: BookingStatus,
    transition: Transition,
) -> CoreResult<BookingStatus> {
    use BookingStatus::*;
    let next = match (current, transition) {
        (Pending, Transition::Confirm) => Confirmed,
        (Confirmed, Transition::CheckIn) => CheckedIn,
        (CheckedIn, Transition::CheckOut) => CheckedOut,
        (Pending | Confirmed, Transition::Cancel) => Cancelled,
        (CheckedOut, Transition::Complete) => Completed,
        _ => {
            return Err(CoreError::invalid_state(
                "Booking",
                booking_id,
                current,
                transition.operation(),
            ))
        }
    };
    Ok(next)
}

// =============================================================================
// Operation Guards
// =============================================================================

/// Check-in needs a confirmed booking that has been at least partly paid.
pub fn ensure_can_check_in(booking: &Booking) -> CoreResult<BookingStatus> {
    let next = next_status(&booking.id, booking.status, Transition::CheckIn)?;
    if !booking.payment_status.allows_check_in() {
        return Err(CoreError::invalid_state(
            "Booking",
            &booking.id,
            format!("payment {}", booking.payment_status),
            Transition::CheckIn.operation(),
        ));
    }
    Ok(next)
}

/// Completion settles a checked-out stay and requires full payment.
pub fn ensure_can_complete(booking: &Booking) -> CoreResult<BookingStatus> {
    let next = next_status(&booking.id, booking.status, Transition::Complete)?;
    if booking.payment_status != PaymentStatus::Paid {
        return Err(CoreError::invalid_state(
            "Booking",
            &booking.id,
            format!("payment {}", booking.payment_status),
            Transition::Complete.operation(),
        ));
    }
    Ok(next)
}

/// Rate overrides and confirmations are amendments to a finished stay.
pub fn ensure_can_override(booking: &Booking) -> CoreResult<()> {
    if booking.status.is_finalized() {
        Ok(())
    } else {
        Err(CoreError::invalid_state(
            "Booking",
            &booking.id,
            booking.status,
            "override rate",
        ))
    }
}

/// Rooms are assigned before arrival only.
pub fn ensure_booking_assignable(booking: &Booking) -> CoreResult<()> {
    if !matches!(booking.status, BookingStatus::Pending | BookingStatus::Confirmed) {
        return Err(CoreError::invalid_state(
            "Booking",
            &booking.id,
            booking.status,
            "assign room",
        ));
    }
    Ok(())
}

/// Assignment is allowed before arrival, onto a room that can take guests.
pub fn ensure_can_assign(booking: &Booking, room: &Room) -> CoreResult<()> {
    ensure_booking_assignable(booking)?;
    if !room.status.is_assignable() {
        return Err(CoreError::invalid_state(
            "Room",
            &room.unit_number,
            room.status,
            "assign room",
        ));
    }
    Ok(())
}

/// Date and rate changes are accepted until the guest leaves.
pub fn ensure_can_modify(booking: &Booking) -> CoreResult<()> {
    match booking.status {
        BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::CheckedIn => Ok(()),
        other => Err(CoreError::invalid_state(
            "Booking",
            &booking.id,
            other,
            "modify booking",
        )),
    }
}

/// A guest who is in the room keeps it until check-out.
pub fn ensure_can_unassign(booking: &Booking) -> CoreResult<()> {
    if booking.status == BookingStatus::CheckedIn {
        return Err(CoreError::invalid_state(
            "Booking",
            &booking.id,
            booking.status,
            "unassign room",
        ));
    }
    Ok(())
}

pub fn ensure_can_update_payment(booking: &Booking) -> CoreResult<()> {
    if booking.status == BookingStatus::Cancelled {
        return Err(CoreError::invalid_state(
            "Booking",
            &booking.id,
            booking.status,
            "update payment status",
        ));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::money::Money;
    use crate::types::RoomStatus;
    use chrono::Utc;

    fn booking(status: BookingStatus, payment: PaymentStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: "b-1".to_string(),
            booking_reference: "BK-20240601-ABC123".to_string(),
            guest_id: None,
            guest_name: "Ada".to_string(),
            status,
            payment_status: payment,
            total_amount: Money::from_minor(500_000),
            final_amount: None,
            source: "walk_in".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            checked_in_at: None,
            checked_out_at: None,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            rate_confirmed_by: None,
            rate_confirmed_at: None,
            version: 1,
        }
    }

    fn room(status: RoomStatus) -> Room {
        Room {
            id: "r-1".to_string(),
            room_type_id: "rt-1".to_string(),
            unit_number: "101".to_string(),
            floor: 1,
            status,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_happy_path() {
        use BookingStatus::*;
        let steps = [
            (Pending, Transition::Confirm, Confirmed),
            (Confirmed, Transition::CheckIn, CheckedIn),
            (CheckedIn, Transition::CheckOut, CheckedOut),
            (CheckedOut, Transition::Complete, Completed),
        ];
        for (from, t, to) in steps {
            assert_eq!(next_status("b", from, t).unwrap(), to);
        }
    }

    #[test]
    fn test_every_other_transition_is_rejected() {
        let allowed = [
            (BookingStatus::Pending, Transition::Confirm),
            (BookingStatus::Confirmed, Transition::CheckIn),
            (BookingStatus::CheckedIn, Transition::CheckOut),
            (BookingStatus::Pending, Transition::Cancel),
            (BookingStatus::Confirmed, Transition::Cancel),
            (BookingStatus::CheckedOut, Transition::Complete),
        ];
        let transitions = [
            Transition::Confirm,
            Transition::CheckIn,
            Transition::CheckOut,
            Transition::Cancel,
            Transition::Complete,
        ];
        for status in BookingStatus::ALL {
            for t in transitions {
                let result = next_status("b", *status, t);
                if allowed.contains(&(*status, t)) {
                    assert!(result.is_ok(), "{status} {t:?}");
                } else {
                    assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidState);
                }
            }
        }
    }

    #[test]
    fn test_check_in_requires_payment() {
        let unpaid = booking(BookingStatus::Confirmed, PaymentStatus::Pending);
        let err = ensure_can_check_in(&unpaid).unwrap_err();
        assert_eq!(err.to_string(), "Booking b-1 is payment pending, cannot check in");

        let partial = booking(BookingStatus::Confirmed, PaymentStatus::Partial);
        assert_eq!(ensure_can_check_in(&partial).unwrap(), BookingStatus::CheckedIn);
    }

    #[test]
    fn test_check_in_from_pending_fails_on_status_first() {
        let b = booking(BookingStatus::Pending, PaymentStatus::Paid);
        assert_eq!(
            ensure_can_check_in(&b).unwrap_err().to_string(),
            "Booking b-1 is pending, cannot check in"
        );
    }

    #[test]
    fn test_complete_requires_paid() {
        assert!(ensure_can_complete(&booking(BookingStatus::CheckedOut, PaymentStatus::Partial)).is_err());
        assert!(ensure_can_complete(&booking(BookingStatus::CheckedOut, PaymentStatus::Paid)).is_ok());
    }

    #[test]
    fn test_override_only_on_finished_stays() {
        assert!(ensure_can_override(&booking(BookingStatus::CheckedOut, PaymentStatus::Paid)).is_ok());
        assert!(ensure_can_override(&booking(BookingStatus::Completed, PaymentStatus::Paid)).is_ok());
        assert!(ensure_can_override(&booking(BookingStatus::CheckedIn, PaymentStatus::Paid)).is_err());
    }

    #[test]
    fn test_assign_guards() {
        let b = booking(BookingStatus::Confirmed, PaymentStatus::Pending);
        assert!(ensure_can_assign(&b, &room(RoomStatus::Available)).is_ok());
        assert!(ensure_can_assign(&b, &room(RoomStatus::Cleaning)).is_ok());
        assert!(ensure_can_assign(&b, &room(RoomStatus::Maintenance)).is_err());
        assert!(ensure_can_assign(&b, &room(RoomStatus::OutOfOrder)).is_err());

        let inside = booking(BookingStatus::CheckedIn, PaymentStatus::Paid);
        assert!(ensure_can_assign(&inside, &room(RoomStatus::Available)).is_err());
    }

    #[test]
    fn test_modify_and_payment_guards() {
        assert!(ensure_can_modify(&booking(BookingStatus::CheckedIn, PaymentStatus::Paid)).is_ok());
        assert!(ensure_can_modify(&booking(BookingStatus::CheckedOut, PaymentStatus::Paid)).is_err());
        assert!(ensure_can_update_payment(&booking(BookingStatus::Cancelled, PaymentStatus::Pending)).is_err());
        assert!(ensure_can_update_payment(&booking(BookingStatus::CheckedOut, PaymentStatus::Partial)).is_ok());
    }

    #[test]
    fn test_unassign_blocked_while_occupied() {
        assert!(ensure_can_unassign(&booking(BookingStatus::Confirmed, PaymentStatus::Paid)).is_ok());
        assert_eq!(
            ensure_can_unassign(&booking(BookingStatus::CheckedIn, PaymentStatus::Paid))
                .unwrap_err()
                .to_string(),
            "Booking b-1 is checked_in, cannot unassign room"
        );
    }
}
