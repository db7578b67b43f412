//! # Staff Repository
//!
//! Staff accounts and credential lookup for login.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::password::{hash_password, verify_password};
use crate::repository::{new_id, now};
use stayhub_core::Role;

/// A staff account. The password hash never leaves this module.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Staff {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct Credentials {
    #[sqlx(flatten)]
    staff: Staff,
    password_hash: String,
}

/// Repository for staff accounts.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Staff>> {
        let row = sqlx::query_as::<_, Staff>(
            "SELECT id, username, full_name, role, is_active, created_at FROM staff WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Returns the account when `username` exists, is active and `password`
    /// matches. Every failure looks the same to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<Staff>> {
        let row = sqlx::query_as::<_, Credentials>(
            r#"
            SELECT id, username, full_name, role, is_active, created_at, password_hash
            FROM staff WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(creds) = row else {
            debug!(username = %username, "Unknown username");
            return Ok(None);
        };

        if !creds.staff.is_active || !verify_password(password, &creds.password_hash) {
            debug!(username = %username, "Login rejected");
            return Ok(None);
        }

        Ok(Some(creds.staff))
    }

    pub async fn create(
        &self,
        username: &str,
        full_name: &str,
        role: Role,
        password: &str,
    ) -> DbResult<Staff> {
        if password.len() < 8 {
            return Err(DbError::Internal(
                "Staff password must be at least 8 characters".to_string(),
            ));
        }

        let staff = Staff {
            id: new_id(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            role,
            is_active: true,
            created_at: now(),
        };
        let hash = hash_password(password)?;

        sqlx::query(
            r#"
            INSERT INTO staff (id, username, full_name, role, password_hash, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&staff.id)
        .bind(&staff.username)
        .bind(&staff.full_name)
        .bind(staff.role)
        .bind(&hash)
        .bind(staff.is_active)
        .bind(staff.created_at)
        .execute(&self.pool)
        .await?;

        info!(username = %staff.username, role = %staff.role, "Staff account created");
        Ok(staff)
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE staff SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }
        Ok(())
    }

    pub async fn list(&self) -> DbResult<Vec<Staff>> {
        let rows = sqlx::query_as::<_, Staff>(
            "SELECT id, username, full_name, role, is_active, created_at FROM staff ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
