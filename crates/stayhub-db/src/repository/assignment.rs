//! # Room Assignment Repository
//!
//! Append-style records of which room was assigned to which room booking.
//! Rows are never deleted; they move to a terminal status instead.

use sqlx::{Executor, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::now;
use stayhub_core::{AssignmentStatus, RoomAssignment};

pub async fn insert(conn: &mut SqliteConnection, assignment: &RoomAssignment) -> DbResult<()> {
    debug!(
        booking_id = %assignment.booking_id,
        room_id = %assignment.inventory_id,
        "Recording room assignment"
    );

    sqlx::query(
        r#"
        INSERT INTO room_assignments (
            id, booking_id, room_booking_id, inventory_id, assigned_by,
            assignment_type, status, release_reason, assigned_at, released_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&assignment.id)
    .bind(&assignment.booking_id)
    .bind(&assignment.room_booking_id)
    .bind(&assignment.inventory_id)
    .bind(&assignment.assigned_by)
    .bind(assignment.assignment_type)
    .bind(assignment.status)
    .bind(&assignment.release_reason)
    .bind(assignment.assigned_at)
    .bind(assignment.released_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Assignments of a booking still in `assigned` or `checked_in`.
pub async fn live_for_booking<'e, E>(exec: E, booking_id: &str) -> DbResult<Vec<RoomAssignment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, RoomAssignment>(
        r#"
        SELECT * FROM room_assignments
        WHERE booking_id = ?1 AND status IN ('assigned', 'checked_in')
        ORDER BY assigned_at, id
        "#,
    )
    .bind(booking_id)
    .fetch_all(exec)
    .await?;
    Ok(rows)
}

pub async fn list_for_booking<'e, E>(exec: E, booking_id: &str) -> DbResult<Vec<RoomAssignment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, RoomAssignment>(
        "SELECT * FROM room_assignments WHERE booking_id = ?1 ORDER BY assigned_at, id",
    )
    .bind(booking_id)
    .fetch_all(exec)
    .await?;
    Ok(rows)
}

/// Moves a live assignment to `status`.
///
/// Terminal statuses stamp `released_at`; `checked_in` keeps the assignment
/// live.
pub async fn transition(
    conn: &mut SqliteConnection,
    id: &str,
    status: AssignmentStatus,
    reason: Option<&str>,
) -> DbResult<()> {
    let released_at = (!status.is_live()).then(now);

    sqlx::query(
        r#"
        UPDATE room_assignments SET
            status = ?2,
            release_reason = COALESCE(?3, release_reason),
            released_at = COALESCE(?4, released_at)
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(reason)
    .bind(released_at)
    .execute(conn)
    .await?;
    Ok(())
}
