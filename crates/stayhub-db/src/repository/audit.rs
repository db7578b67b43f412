//! # Audit Log Repository
//!
//! Append-only trail of every mutating action.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  append()  ──► INSERT INTO audit_logs        (inside the unit of work)  │
//! │                                                                         │
//! │  UPDATE / DELETE on audit_logs ──► trigger ──► AUDIT_LOG_APPEND_ONLY    │
//! │                                                                         │
//! │  A failed append fails the whole unit of work: no audit row, no change │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{new_id, now, Page};
use stayhub_core::{Actor, AuditLogEntry};

/// Serializes a before/after snapshot.
pub fn snapshot<T: Serialize>(value: &T) -> DbResult<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

/// What changed, on which entity.
#[derive(Debug, Clone)]
pub struct AuditEvent<'a> {
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: &'a str,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
}

impl<'a> AuditEvent<'a> {
    pub fn new(action: &'static str, entity_type: &'static str, entity_id: &'a str) -> Self {
        AuditEvent {
            action,
            entity_type,
            entity_id,
            before: None,
            after: None,
        }
    }

    pub fn before(mut self, value: serde_json::Value) -> Self {
        self.before = Some(value);
        self
    }

    pub fn after(mut self, value: serde_json::Value) -> Self {
        self.after = Some(value);
        self
    }
}

/// Appends one audit row for `actor`.
pub async fn append(
    conn: &mut SqliteConnection,
    actor: &Actor,
    event: AuditEvent<'_>,
) -> DbResult<AuditLogEntry> {
    let entry = AuditLogEntry {
        id: new_id(),
        action: event.action.to_string(),
        entity_type: event.entity_type.to_string(),
        entity_id: event.entity_id.to_string(),
        actor_id: actor.id.clone(),
        before_state: event.before.map(|v| v.to_string()),
        after_state: event.after.map(|v| v.to_string()),
        ip_address: actor.ip_address.clone(),
        user_agent: actor.user_agent.clone(),
        created_at: now(),
    };

    debug!(action = %entry.action, entity_id = %entry.entity_id, actor = %entry.actor_id, "Audit");

    sqlx::query(
        r#"
        INSERT INTO audit_logs (
            id, action, entity_type, entity_id, actor_id,
            before_state, after_state, ip_address, user_agent, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.action)
    .bind(&entry.entity_type)
    .bind(&entry.entity_id)
    .bind(&entry.actor_id)
    .bind(&entry.before_state)
    .bind(&entry.after_state)
    .bind(&entry.ip_address)
    .bind(&entry.user_agent)
    .bind(entry.created_at)
    .execute(conn)
    .await?;

    Ok(entry)
}

/// Filters for the audit history page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub entity_id: Option<String>,
}

/// Repository for audit reads.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    pub async fn list(&self, filter: &AuditFilter, limit: i64, offset: i64) -> DbResult<Page<AuditLogEntry>> {
        let items = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            SELECT * FROM audit_logs
            WHERE (?1 IS NULL OR action = ?1)
              AND (?2 IS NULL OR entity_id = ?2)
            ORDER BY created_at DESC, id
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(&filter.action)
        .bind(&filter.entity_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM audit_logs
            WHERE (?1 IS NULL OR action = ?1)
              AND (?2 IS NULL OR entity_id = ?2)
            "#,
        )
        .bind(&filter.action)
        .bind(&filter.entity_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page::new(items, total, limit, offset))
    }

    /// All entries for one entity, oldest first.
    pub async fn for_entity(&self, entity_id: &str) -> DbResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_logs WHERE entity_id = ?1 ORDER BY created_at, rowid",
        )
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}
