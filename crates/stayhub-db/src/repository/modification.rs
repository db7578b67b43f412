//! # Booking Modification Repository

use sqlx::{Executor, Sqlite, SqliteConnection};

use crate::error::DbResult;
use stayhub_core::BookingModification;

pub async fn fetch<'e, E>(exec: E, id: &str) -> DbResult<Option<BookingModification>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, BookingModification>(
        "SELECT * FROM booking_modifications WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(exec)
    .await?;
    Ok(row)
}

pub async fn insert(conn: &mut SqliteConnection, m: &BookingModification) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO booking_modifications (
            id, booking_id, room_booking_id, requested_by,
            new_check_in_date, new_check_out_date, new_price_per_night,
            reason, status, reviewed_by, review_note, created_at, reviewed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&m.id)
    .bind(&m.booking_id)
    .bind(&m.room_booking_id)
    .bind(&m.requested_by)
    .bind(m.new_check_in_date)
    .bind(m.new_check_out_date)
    .bind(m.new_price_per_night)
    .bind(&m.reason)
    .bind(m.status)
    .bind(&m.reviewed_by)
    .bind(&m.review_note)
    .bind(m.created_at)
    .bind(m.reviewed_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Records the review outcome.
pub async fn save_review(conn: &mut SqliteConnection, m: &BookingModification) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE booking_modifications SET
            status = ?2,
            reviewed_by = ?3,
            review_note = ?4,
            reviewed_at = ?5
        WHERE id = ?1
        "#,
    )
    .bind(&m.id)
    .bind(m.status)
    .bind(&m.reviewed_by)
    .bind(&m.review_note)
    .bind(m.reviewed_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn list_for_booking<'e, E>(exec: E, booking_id: &str) -> DbResult<Vec<BookingModification>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, BookingModification>(
        "SELECT * FROM booking_modifications WHERE booking_id = ?1 ORDER BY created_at, id",
    )
    .bind(booking_id)
    .fetch_all(exec)
    .await?;
    Ok(rows)
}
