//! # Booking Repository
//!
//! Database operations for bookings.
//!
//! ## Write Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. touch()   UPDATE bookings SET version = version + 1                │
//! │               first statement of every unit of work on a booking       │
//! │  2. fetch()   load the row the guards will look at                     │
//! │  3. save()    write back the mutable columns after the guards passed   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{assignment, charge, room_booking, Page};
use stayhub_core::{Booking, BookingCharge, BookingStatus, RoomAssignment, RoomBookingWithRoom};

/// Loads one booking.
pub async fn fetch<'e, E>(exec: E, id: &str) -> DbResult<Option<Booking>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?1")
        .bind(id)
        .fetch_optional(exec)
        .await?;
    Ok(booking)
}

/// Bumps the booking's version. Returns `false` when the booking is absent.
///
/// This is the first write of every unit of work that changes a booking,
/// so the SQLite write lock is held before any precondition is read.
pub async fn touch(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE bookings SET version = version + 1 WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn insert(conn: &mut SqliteConnection, booking: &Booking) -> DbResult<()> {
    debug!(id = %booking.id, reference = %booking.booking_reference, "Inserting booking");

    sqlx::query(
        r#"
        INSERT INTO bookings (
            id, booking_reference, guest_id, guest_name,
            status, payment_status, total_amount, final_amount,
            source, notes, created_at, updated_at, version
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8,
            ?9, ?10, ?11, ?12, ?13
        )
        "#,
    )
    .bind(&booking.id)
    .bind(&booking.booking_reference)
    .bind(&booking.guest_id)
    .bind(&booking.guest_name)
    .bind(booking.status)
    .bind(booking.payment_status)
    .bind(booking.total_amount)
    .bind(booking.final_amount)
    .bind(&booking.source)
    .bind(&booking.notes)
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .bind(booking.version)
    .execute(conn)
    .await?;

    Ok(())
}

/// Writes back every mutable column.
pub async fn save(conn: &mut SqliteConnection, booking: &Booking) -> DbResult<()> {
    debug!(id = %booking.id, status = %booking.status, "Saving booking");

    sqlx::query(
        r#"
        UPDATE bookings SET
            status = ?2,
            payment_status = ?3,
            total_amount = ?4,
            final_amount = ?5,
            notes = ?6,
            updated_at = ?7,
            confirmed_at = ?8,
            checked_in_at = ?9,
            checked_out_at = ?10,
            cancelled_at = ?11,
            cancelled_by = ?12,
            cancellation_reason = ?13,
            rate_confirmed_by = ?14,
            rate_confirmed_at = ?15
        WHERE id = ?1
        "#,
    )
    .bind(&booking.id)
    .bind(booking.status)
    .bind(booking.payment_status)
    .bind(booking.total_amount)
    .bind(booking.final_amount)
    .bind(&booking.notes)
    .bind(booking.updated_at)
    .bind(booking.confirmed_at)
    .bind(booking.checked_in_at)
    .bind(booking.checked_out_at)
    .bind(booking.cancelled_at)
    .bind(&booking.cancelled_by)
    .bind(&booking.cancellation_reason)
    .bind(&booking.rate_confirmed_by)
    .bind(booking.rate_confirmed_at)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Read Models
// =============================================================================

/// A booking with everything the front desk page shows.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub room_bookings: Vec<RoomBookingWithRoom>,
    pub assignments: Vec<RoomAssignment>,
    pub charges: Vec<BookingCharge>,
}

/// Repository for booking reads outside a unit of work.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Booking>> {
        fetch(&self.pool, id).await
    }

    pub async fn get_by_reference(&self, reference: &str) -> DbResult<Option<Booking>> {
        let booking =
            sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_reference = ?1")
                .bind(reference)
                .fetch_optional(&self.pool)
                .await?;
        Ok(booking)
    }

    /// Booking with room bookings (and their rooms), assignments and charges.
    pub async fn details(&self, id: &str) -> DbResult<Option<BookingDetails>> {
        let Some(booking) = fetch(&self.pool, id).await? else {
            return Ok(None);
        };
        let room_bookings = room_booking::fetch_with_rooms(&self.pool, id).await?;
        let assignments = assignment::list_for_booking(&self.pool, id).await?;
        let charges = charge::list_for_booking(&self.pool, id).await?;
        Ok(Some(BookingDetails {
            booking,
            room_bookings,
            assignments,
            charges,
        }))
    }

    /// Newest first, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Page<Booking>> {
        let items = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC, id
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE (?1 IS NULL OR status = ?1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        Ok(Page::new(items, total, limit, offset))
    }
}
