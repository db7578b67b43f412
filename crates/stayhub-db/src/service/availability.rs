//! # Availability Checker
//!
//! The one place that decides whether a room is free for a date range.
//!
//! ```text
//! held_stays(room, statuses)        SQL: room + booking status only
//!          │
//!          ▼
//! overlap::find_conflict / find_overlap   half-open predicate, own booking ignored
//!          │
//!          ▼
//! CoreError::Conflict { room, conflicting_booking }
//! ```
//!
//! Every check that guards a write runs on the unit of work's connection, after
//! the booking row was touched, so nothing can commit between check and write.

use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::{room, room_booking};
use crate::service::error::ServiceResult;
use stayhub_core::overlap::{find_conflict, find_overlap, HeldStay};
use stayhub_core::{BookingStatus, CoreError, Room, RoomBooking, StayRange};

/// Statuses a room booking can have and still keep auto-assignment away.
const RESERVING: [BookingStatus; 3] = [
    BookingStatus::Pending,
    BookingStatus::Confirmed,
    BookingStatus::CheckedIn,
];

/// The stay on `room_id` that blocks `range`, ignoring `exclude_booking_id`.
pub async fn find_blocking_stay(
    conn: &mut SqliteConnection,
    room_id: &str,
    range: &StayRange,
    exclude_booking_id: &str,
) -> DbResult<Option<HeldStay>> {
    let held = room_booking::held_stays(conn, room_id, &BookingStatus::HOLDS_ROOM).await?;
    Ok(find_conflict(range, exclude_booking_id, &held).cloned())
}

/// Whether `room_id` is held by another confirmed or checked-in booking over
/// any night of `range`.
pub async fn has_conflict(
    conn: &mut SqliteConnection,
    room_id: &str,
    range: &StayRange,
    exclude_booking_id: &str,
) -> DbResult<bool> {
    Ok(find_blocking_stay(conn, room_id, range, exclude_booking_id)
        .await?
        .is_some())
}

/// Fails with `Conflict` naming the blocking booking when `room` is taken.
pub async fn ensure_available(
    conn: &mut SqliteConnection,
    room: &Room,
    range: &StayRange,
    booking_id: &str,
) -> ServiceResult<()> {
    if let Some(stay) = find_blocking_stay(conn, &room.id, range, booking_id).await? {
        warn!(
            room = %room.unit_number,
            booking_id = %booking_id,
            conflicting = %stay.booking_reference,
            "Room already booked for overlapping dates"
        );
        return Err(CoreError::Conflict {
            room: room.unit_number.clone(),
            conflicting_booking: stay.booking_reference,
        }
        .into());
    }
    Ok(())
}

/// Another room booking of the same booking already on `room_id` for
/// overlapping nights. `find_blocking_stay` and the storage triggers skip a
/// booking's own stays, so writes check this as well.
pub fn sibling_on_room<'a>(
    stays: &'a [RoomBooking],
    target_id: &str,
    room_id: &str,
    range: &StayRange,
) -> Option<&'a RoomBooking> {
    stays.iter().find(|rb| {
        rb.id != target_id
            && rb.inventory_id.as_deref() == Some(room_id)
            && StayRange::new(rb.check_in_date, rb.check_out_date)
                .map(|other| other.overlaps(range))
                .unwrap_or(false)
    })
}

/// Fails with `Conflict` when a sibling stay already holds `room` over `range`.
pub fn ensure_no_sibling(
    stays: &[RoomBooking],
    target_id: &str,
    room: &Room,
    range: &StayRange,
    booking_reference: &str,
) -> ServiceResult<()> {
    if sibling_on_room(stays, target_id, &room.id, range).is_some() {
        warn!(
            room = %room.unit_number,
            booking = %booking_reference,
            "Stays of one booking overlap on the same room"
        );
        return Err(CoreError::Conflict {
            room: room.unit_number.clone(),
            conflicting_booking: booking_reference.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Assignable rooms with no pending, confirmed or checked-in stay of another
/// booking overlapping `range`, ordered by unit number.
pub async fn free_rooms(
    conn: &mut SqliteConnection,
    range: &StayRange,
    room_type_id: Option<&str>,
    floor: Option<i64>,
    exclude_booking_id: &str,
) -> DbResult<Vec<Room>> {
    let candidates = room::list_assignable(&mut *conn, room_type_id, floor).await?;

    let mut free = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let held = room_booking::held_stays(&mut *conn, &candidate.id, &RESERVING).await?;
        if find_overlap(range, exclude_booking_id, &held).is_none() {
            free.push(candidate);
        }
    }

    debug!(
        check_in = %range.check_in(),
        check_out = %range.check_out(),
        free = free.len(),
        "Computed free rooms"
    );
    Ok(free)
}

// =============================================================================
// Checker
// =============================================================================

/// Read-only availability queries outside a unit of work.
#[derive(Debug, Clone)]
pub struct AvailabilityChecker {
    db: Database,
}

impl AvailabilityChecker {
    pub fn new(db: Database) -> Self {
        AvailabilityChecker { db }
    }

    pub async fn has_conflict(
        &self,
        room_id: &str,
        range: &StayRange,
        exclude_booking_id: Option<&str>,
    ) -> DbResult<bool> {
        let mut conn = self.db.pool().acquire().await?;
        has_conflict(&mut conn, room_id, range, exclude_booking_id.unwrap_or_default()).await
    }

    /// Rooms that could be given to a new stay over `range`.
    pub async fn available_rooms(
        &self,
        range: &StayRange,
        room_type_id: Option<&str>,
        floor: Option<i64>,
    ) -> DbResult<Vec<Room>> {
        let mut conn = self.db.pool().acquire().await?;
        free_rooms(&mut conn, range, room_type_id, floor, "").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{date, Fixture};

    #[tokio::test]
    async fn test_touching_stays_do_not_conflict() {
        let fx = Fixture::new().await;
        let room = fx.room("101").await;
        fx.held_booking(&room, date(6, 1), date(6, 5), BookingStatus::Confirmed)
            .await;

        let checker = AvailabilityChecker::new(fx.db.clone());
        let y = StayRange::new(date(6, 3), date(6, 6)).unwrap();
        let z = StayRange::new(date(6, 5), date(6, 8)).unwrap();
        assert!(checker.has_conflict(&room.id, &y, None).await.unwrap());
        assert!(!checker.has_conflict(&room.id, &z, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_own_booking_is_excluded() {
        let fx = Fixture::new().await;
        let room = fx.room("101").await;
        let x = fx
            .held_booking(&room, date(6, 1), date(6, 5), BookingStatus::Confirmed)
            .await;

        let checker = AvailabilityChecker::new(fx.db.clone());
        let range = StayRange::new(date(6, 2), date(6, 4)).unwrap();
        assert!(!checker.has_conflict(&room.id, &range, Some(&x)).await.unwrap());
    }

    #[tokio::test]
    async fn test_pending_and_cancelled_do_not_hold() {
        let fx = Fixture::new().await;
        let room = fx.room("101").await;
        fx.held_booking(&room, date(6, 1), date(6, 5), BookingStatus::Pending)
            .await;
        fx.held_booking(&room, date(6, 1), date(6, 5), BookingStatus::Cancelled)
            .await;

        let checker = AvailabilityChecker::new(fx.db.clone());
        let range = StayRange::new(date(6, 2), date(6, 4)).unwrap();
        assert!(!checker.has_conflict(&room.id, &range, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_available_rooms_skips_pending_and_maintenance() {
        let fx = Fixture::new().await;
        let r101 = fx.room("101").await;
        let r102 = fx.room("102").await;
        let r103 = fx.room("103").await;
        fx.set_room_status(&r103, stayhub_core::RoomStatus::Maintenance)
            .await;
        fx.held_booking(&r101, date(6, 1), date(6, 5), BookingStatus::Pending)
            .await;

        let checker = AvailabilityChecker::new(fx.db.clone());
        let range = StayRange::new(date(6, 2), date(6, 3)).unwrap();
        let free = checker.available_rooms(&range, None, None).await.unwrap();
        let units: Vec<_> = free.iter().map(|r| r.unit_number.as_str()).collect();
        assert_eq!(units, vec!["102"]);
        assert_eq!(free[0].id, r102.id);
    }
}
