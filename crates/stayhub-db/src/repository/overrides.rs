//! # Override Repository
//!
//! Admin rate overrides and checkout rate confirmations.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::Page;
use stayhub_core::{AdminOverride, CheckoutConfirmation, OverrideStatus, OverrideType};

pub async fn fetch<'e, E>(exec: E, id: &str) -> DbResult<Option<AdminOverride>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, AdminOverride>("SELECT * FROM admin_overrides WHERE id = ?1")
        .bind(id)
        .fetch_optional(exec)
        .await?;
    Ok(row)
}

pub async fn insert(conn: &mut SqliteConnection, o: &AdminOverride) -> DbResult<()> {
    debug!(
        booking_id = %o.booking_id,
        original = %o.original_final_amount,
        overridden = %o.overridden_final_amount,
        "Recording override"
    );

    sqlx::query(
        r#"
        INSERT INTO admin_overrides (
            id, booking_id, admin_id, override_type,
            original_final_amount, overridden_final_amount, difference_amount,
            reason, status, reversed_by, reversal_reason, created_at, reversed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&o.id)
    .bind(&o.booking_id)
    .bind(&o.admin_id)
    .bind(o.override_type)
    .bind(o.original_final_amount)
    .bind(o.overridden_final_amount)
    .bind(o.difference_amount)
    .bind(&o.reason)
    .bind(o.status)
    .bind(&o.reversed_by)
    .bind(&o.reversal_reason)
    .bind(o.created_at)
    .bind(o.reversed_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Writes the reversal columns of an override.
pub async fn save_reversal(conn: &mut SqliteConnection, o: &AdminOverride) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE admin_overrides SET
            status = ?2,
            reversed_by = ?3,
            reversal_reason = ?4,
            reversed_at = ?5
        WHERE id = ?1
        "#,
    )
    .bind(&o.id)
    .bind(o.status)
    .bind(&o.reversed_by)
    .bind(&o.reversal_reason)
    .bind(o.reversed_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_confirmation(conn: &mut SqliteConnection, c: &CheckoutConfirmation) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO checkout_confirmations (id, booking_id, admin_id, confirmed_amount, note, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&c.id)
    .bind(&c.booking_id)
    .bind(&c.admin_id)
    .bind(c.confirmed_amount)
    .bind(&c.note)
    .bind(c.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

// =============================================================================
// History
// =============================================================================

/// Filters for the override history page. `to` is exclusive.
#[derive(Debug, Clone, Default)]
pub struct OverrideFilter {
    pub status: Option<OverrideStatus>,
    pub override_type: Option<OverrideType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Repository for override and confirmation history.
#[derive(Debug, Clone)]
pub struct OverrideRepository {
    pool: SqlitePool,
}

impl OverrideRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OverrideRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<AdminOverride>> {
        fetch(&self.pool, id).await
    }

    pub async fn list(
        &self,
        filter: &OverrideFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Page<AdminOverride>> {
        const WHERE: &str = r#"
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR override_type = ?2)
              AND (?3 IS NULL OR created_at >= ?3)
              AND (?4 IS NULL OR created_at < ?4)
        "#;

        let items = sqlx::query_as::<_, AdminOverride>(&format!(
            "SELECT * FROM admin_overrides {WHERE} ORDER BY created_at DESC, id LIMIT ?5 OFFSET ?6"
        ))
        .bind(filter.status)
        .bind(filter.override_type)
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM admin_overrides {WHERE}"))
                .bind(filter.status)
                .bind(filter.override_type)
                .bind(filter.from)
                .bind(filter.to)
                .fetch_one(&self.pool)
                .await?;

        Ok(Page::new(items, total, limit, offset))
    }

    pub async fn for_booking(&self, booking_id: &str) -> DbResult<Vec<AdminOverride>> {
        let rows = sqlx::query_as::<_, AdminOverride>(
            "SELECT * FROM admin_overrides WHERE booking_id = ?1 ORDER BY created_at, id",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_confirmations(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Page<CheckoutConfirmation>> {
        const WHERE: &str = r#"
            WHERE (?1 IS NULL OR created_at >= ?1)
              AND (?2 IS NULL OR created_at < ?2)
        "#;

        let items = sqlx::query_as::<_, CheckoutConfirmation>(&format!(
            "SELECT * FROM checkout_confirmations {WHERE} ORDER BY created_at DESC, id LIMIT ?3 OFFSET ?4"
        ))
        .bind(from)
        .bind(to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM checkout_confirmations {WHERE}"))
                .bind(from)
                .bind(to)
                .fetch_one(&self.pool)
                .await?;

        Ok(Page::new(items, total, limit, offset))
    }
}
