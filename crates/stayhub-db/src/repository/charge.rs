//! # Booking Charge Repository
//!
//! Extra folio lines (minibar, laundry, late check-out, ...).

use sqlx::{Executor, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{new_id, now};
use stayhub_core::{BookingCharge, Money};

pub async fn insert(
    conn: &mut SqliteConnection,
    booking_id: &str,
    description: &str,
    amount: Money,
    created_by: &str,
) -> DbResult<BookingCharge> {
    let charge = BookingCharge {
        id: new_id(),
        booking_id: booking_id.to_string(),
        description: description.to_string(),
        amount,
        created_by: created_by.to_string(),
        created_at: now(),
    };

    debug!(booking_id = %booking_id, amount = %amount, "Posting charge");

    sqlx::query(
        r#"
        INSERT INTO booking_charges (id, booking_id, description, amount, created_by, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&charge.id)
    .bind(&charge.booking_id)
    .bind(&charge.description)
    .bind(charge.amount)
    .bind(&charge.created_by)
    .bind(charge.created_at)
    .execute(conn)
    .await?;

    Ok(charge)
}

pub async fn list_for_booking<'e, E>(exec: E, booking_id: &str) -> DbResult<Vec<BookingCharge>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, BookingCharge>(
        "SELECT * FROM booking_charges WHERE booking_id = ?1 ORDER BY created_at, id",
    )
    .bind(booking_id)
    .fetch_all(exec)
    .await?;
    Ok(rows)
}
