//! # Room Repository
//!
//! Physical rooms and their types.
//!
//! Room status is operational state (cleaning, maintenance, ...). Whether a
//! room is free for given dates is never read from here; that is the overlap
//! checker's job.

use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{new_id, now};
use stayhub_core::{Money, Room, RoomStatus, RoomType};

pub async fn fetch<'e, E>(exec: E, id: &str) -> DbResult<Option<Room>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?1")
        .bind(id)
        .fetch_optional(exec)
        .await?;
    Ok(room)
}

pub async fn fetch_type<'e, E>(exec: E, id: &str) -> DbResult<Option<RoomType>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let room_type = sqlx::query_as::<_, RoomType>("SELECT * FROM room_types WHERE id = ?1")
        .bind(id)
        .fetch_optional(exec)
        .await?;
    Ok(room_type)
}

/// Rooms that can take guests, matching the optional filters, by unit number.
pub async fn list_assignable<'e, E>(
    exec: E,
    room_type_id: Option<&str>,
    floor: Option<i64>,
) -> DbResult<Vec<Room>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rooms = sqlx::query_as::<_, Room>(
        r#"
        SELECT * FROM rooms
        WHERE status NOT IN ('maintenance', 'out_of_order')
          AND (?1 IS NULL OR room_type_id = ?1)
          AND (?2 IS NULL OR floor = ?2)
        ORDER BY unit_number
        "#,
    )
    .bind(room_type_id)
    .bind(floor)
    .fetch_all(exec)
    .await?;
    Ok(rooms)
}

pub async fn set_status(conn: &mut SqliteConnection, id: &str, status: RoomStatus) -> DbResult<()> {
    debug!(room_id = %id, status = %status, "Updating room status");

    sqlx::query("UPDATE rooms SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(status)
        .bind(now())
        .execute(conn)
        .await?;
    Ok(())
}

/// Repository for room reads and property setup.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

impl RoomRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RoomRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Room>> {
        fetch(&self.pool, id).await
    }

    pub async fn get_by_unit_number(&self, unit_number: &str) -> DbResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE unit_number = ?1")
            .bind(unit_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(room)
    }

    pub async fn list(&self) -> DbResult<Vec<Room>> {
        let rooms = sqlx::query_as::<_, Room>("SELECT * FROM rooms ORDER BY unit_number")
            .fetch_all(&self.pool)
            .await?;
        Ok(rooms)
    }

    pub async fn list_types(&self) -> DbResult<Vec<RoomType>> {
        let types = sqlx::query_as::<_, RoomType>("SELECT * FROM room_types ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(types)
    }

    pub async fn create_type(
        &self,
        name: &str,
        base_price: Money,
        max_occupancy: i64,
    ) -> DbResult<RoomType> {
        let room_type = RoomType {
            id: new_id(),
            name: name.to_string(),
            base_price,
            max_occupancy,
        };
        sqlx::query(
            "INSERT INTO room_types (id, name, base_price, max_occupancy) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&room_type.id)
        .bind(&room_type.name)
        .bind(room_type.base_price)
        .bind(room_type.max_occupancy)
        .execute(&self.pool)
        .await?;
        Ok(room_type)
    }

    pub async fn create_room(
        &self,
        room_type_id: &str,
        unit_number: &str,
        floor: i64,
        status: RoomStatus,
    ) -> DbResult<Room> {
        let room = Room {
            id: new_id(),
            room_type_id: room_type_id.to_string(),
            unit_number: unit_number.to_string(),
            floor,
            status,
            updated_at: now(),
        };
        sqlx::query(
            r#"
            INSERT INTO rooms (id, room_type_id, unit_number, floor, status, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&room.id)
        .bind(&room.room_type_id)
        .bind(&room.unit_number)
        .bind(room.floor)
        .bind(room.status)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(room)
    }
}
