//! # Room Booking Repository
//!
//! Date-ranged room requests of a booking and the held-stay query the
//! overlap checker runs against.

use chrono::NaiveDate;
use sqlx::{Executor, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{now, room};
use stayhub_core::overlap::HeldStay;
use stayhub_core::{BookingStatus, RoomBooking, RoomBookingWithRoom, StayRange};

pub async fn fetch<'e, E>(exec: E, id: &str) -> DbResult<Option<RoomBooking>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rb = sqlx::query_as::<_, RoomBooking>("SELECT * FROM room_bookings WHERE id = ?1")
        .bind(id)
        .fetch_optional(exec)
        .await?;
    Ok(rb)
}

/// Room bookings of one booking, earliest stay first.
pub async fn fetch_for_booking<'e, E>(exec: E, booking_id: &str) -> DbResult<Vec<RoomBooking>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rbs = sqlx::query_as::<_, RoomBooking>(
        "SELECT * FROM room_bookings WHERE booking_id = ?1 ORDER BY check_in_date, id",
    )
    .bind(booking_id)
    .fetch_all(exec)
    .await?;
    Ok(rbs)
}

/// Room bookings joined with their assigned room, for read models.
pub async fn fetch_with_rooms(
    pool: &SqlitePool,
    booking_id: &str,
) -> DbResult<Vec<RoomBookingWithRoom>> {
    let mut out = Vec::new();
    for rb in fetch_for_booking(pool, booking_id).await? {
        let room = match rb.inventory_id.as_deref() {
            Some(room_id) => room::fetch(pool, room_id).await?,
            None => None,
        };
        out.push(RoomBookingWithRoom {
            room_booking: rb,
            room,
        });
    }
    Ok(out)
}

pub async fn insert(conn: &mut SqliteConnection, rb: &RoomBooking) -> DbResult<()> {
    debug!(id = %rb.id, booking_id = %rb.booking_id, "Inserting room booking");

    sqlx::query(
        r#"
        INSERT INTO room_bookings (
            id, booking_id, room_type_id, inventory_id, assigned_room_label,
            check_in_date, check_out_date, nights, adults, children,
            price_per_night, extra_fees, tax_amount, service_charge,
            discount_amount, deposit_amount, final_amount,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14,
            ?15, ?16, ?17,
            ?18, ?19
        )
        "#,
    )
    .bind(&rb.id)
    .bind(&rb.booking_id)
    .bind(&rb.room_type_id)
    .bind(&rb.inventory_id)
    .bind(&rb.assigned_room_label)
    .bind(rb.check_in_date)
    .bind(rb.check_out_date)
    .bind(rb.nights)
    .bind(rb.adults)
    .bind(rb.children)
    .bind(rb.rate.price_per_night)
    .bind(rb.rate.extra_fees)
    .bind(rb.rate.tax_amount)
    .bind(rb.rate.service_charge)
    .bind(rb.rate.discount_amount)
    .bind(rb.rate.deposit_amount)
    .bind(rb.final_amount)
    .bind(rb.created_at)
    .bind(rb.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Sets or clears the assigned room.
pub async fn set_room(
    conn: &mut SqliteConnection,
    id: &str,
    room_id: Option<&str>,
    label: Option<&str>,
) -> DbResult<()> {
    debug!(id = %id, room_id = ?room_id, "Setting room booking inventory");

    sqlx::query(
        r#"
        UPDATE room_bookings SET
            inventory_id = ?2,
            assigned_room_label = ?3,
            updated_at = ?4
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(room_id)
    .bind(label)
    .bind(now())
    .execute(conn)
    .await?;
    Ok(())
}

/// Writes back dates, nights and the rate breakdown.
pub async fn save_stay(conn: &mut SqliteConnection, rb: &RoomBooking) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE room_bookings SET
            check_in_date = ?2,
            check_out_date = ?3,
            nights = ?4,
            price_per_night = ?5,
            extra_fees = ?6,
            tax_amount = ?7,
            service_charge = ?8,
            discount_amount = ?9,
            deposit_amount = ?10,
            final_amount = ?11,
            updated_at = ?12
        WHERE id = ?1
        "#,
    )
    .bind(&rb.id)
    .bind(rb.check_in_date)
    .bind(rb.check_out_date)
    .bind(rb.nights)
    .bind(rb.rate.price_per_night)
    .bind(rb.rate.extra_fees)
    .bind(rb.rate.tax_amount)
    .bind(rb.rate.service_charge)
    .bind(rb.rate.discount_amount)
    .bind(rb.rate.deposit_amount)
    .bind(rb.final_amount)
    .bind(rb.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

// =============================================================================
// Held Stays
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct HeldStayRow {
    booking_id: String,
    booking_reference: String,
    status: BookingStatus,
    check_in_date: NaiveDate,
    check_out_date: NaiveDate,
}

impl TryFrom<HeldStayRow> for HeldStay {
    type Error = DbError;

    fn try_from(row: HeldStayRow) -> Result<Self, Self::Error> {
        let range = StayRange::new(row.check_in_date, row.check_out_date)
            .map_err(|e| DbError::Internal(format!("stored stay is invalid: {e}")))?;
        Ok(HeldStay {
            booking_id: row.booking_id,
            booking_reference: row.booking_reference,
            status: row.status,
            range,
        })
    }
}

/// Every stay recorded against `room_id` whose booking is in `statuses`.
///
/// Date filtering is left to [`stayhub_core::overlap::find_conflict`] so the
/// overlap predicate exists once.
pub async fn held_stays(
    conn: &mut SqliteConnection,
    room_id: &str,
    statuses: &[BookingStatus],
) -> DbResult<Vec<HeldStay>> {
    let mut query = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT b.id AS booking_id, b.booking_reference, b.status,
               rb.check_in_date, rb.check_out_date
        FROM room_bookings rb
        JOIN bookings b ON b.id = rb.booking_id
        WHERE rb.inventory_id = "#,
    );
    query.push_bind(room_id);
    query.push(" AND b.status IN (");
    let mut separated = query.separated(", ");
    for status in statuses {
        separated.push_bind(*status);
    }
    separated.push_unseparated(") ORDER BY rb.check_in_date");

    let rows: Vec<HeldStayRow> = query.build_query_as().fetch_all(conn).await?;
    rows.into_iter().map(HeldStay::try_from).collect()
}
