//! # Operational Logs
//!
//! Front desk check-in/check-out records and room status history. Unlike the
//! audit log these are read by staff, not compliance.

use sqlx::{Executor, Sqlite, SqliteConnection};

use crate::error::DbResult;
use crate::repository::{new_id, now};
use stayhub_core::{FrontDeskLog, RoomStatus, RoomStatusLog};

pub async fn insert_front_desk(conn: &mut SqliteConnection, log: &FrontDeskLog) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO front_desk_logs (
            id, booking_id, action, staff_id, guest_name, room_numbers,
            key_card_number, deposit_returned, additional_charges,
            payment_method, notes, override_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&log.id)
    .bind(&log.booking_id)
    .bind(&log.action)
    .bind(&log.staff_id)
    .bind(&log.guest_name)
    .bind(&log.room_numbers)
    .bind(&log.key_card_number)
    .bind(log.deposit_returned)
    .bind(log.additional_charges)
    .bind(&log.payment_method)
    .bind(&log.notes)
    .bind(&log.override_id)
    .bind(log.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Records a room status change made on behalf of `booking_id`.
pub async fn insert_room_status(
    conn: &mut SqliteConnection,
    room_id: &str,
    booking_id: Option<&str>,
    previous: RoomStatus,
    new: RoomStatus,
    changed_by: &str,
    reason: Option<&str>,
) -> DbResult<RoomStatusLog> {
    let log = RoomStatusLog {
        id: new_id(),
        room_id: room_id.to_string(),
        booking_id: booking_id.map(str::to_string),
        previous_status: previous,
        new_status: new,
        changed_by: changed_by.to_string(),
        reason: reason.map(str::to_string),
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO room_status_logs (
            id, room_id, booking_id, previous_status, new_status, changed_by, reason, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&log.id)
    .bind(&log.room_id)
    .bind(&log.booking_id)
    .bind(log.previous_status)
    .bind(log.new_status)
    .bind(&log.changed_by)
    .bind(&log.reason)
    .bind(log.created_at)
    .execute(conn)
    .await?;

    Ok(log)
}

pub async fn front_desk_for_booking<'e, E>(exec: E, booking_id: &str) -> DbResult<Vec<FrontDeskLog>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, FrontDeskLog>(
        "SELECT * FROM front_desk_logs WHERE booking_id = ?1 ORDER BY created_at, id",
    )
    .bind(booking_id)
    .fetch_all(exec)
    .await?;
    Ok(rows)
}

pub async fn room_status_for_room<'e, E>(exec: E, room_id: &str) -> DbResult<Vec<RoomStatusLog>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, RoomStatusLog>(
        "SELECT * FROM room_status_logs WHERE room_id = ?1 ORDER BY created_at, id",
    )
    .bind(room_id)
    .fetch_all(exec)
    .await?;
    Ok(rows)
}
