//! # Unit of Work
//!
//! One SQLite transaction per manager operation.
//!
//! ```text
//! db.bounded(op, async {
//!     let mut uow = db.begin().await?;          BEGIN
//!     touch booking (version + 1)               ← write lock taken here
//!     read rows, run overlap check              ← sees every committed write
//!     write booking / rooms / assignments
//!     append audit log
//!     uow.commit().await?;                      COMMIT
//! })
//!
//! Any `?` before commit drops `uow` → ROLLBACK.
//! ```
//!
//! Opening every unit of work with a write on the owning booking row means
//! two writers never interleave their read-check-write sequences: the second
//! one waits (busy timeout) until the first has committed, then reads the
//! committed state.

use sqlx::{Sqlite, SqliteConnection, Transaction};

use crate::error::DbResult;
#[cfg(test)]
use crate::error::DbError;

/// An open transaction handed to repository functions.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
    #[cfg(test)]
    fail_point: Option<&'static str>,
}

impl UnitOfWork {
    #[cfg(not(test))]
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        UnitOfWork { tx }
    }

    #[cfg(test)]
    pub(crate) fn new(tx: Transaction<'static, Sqlite>, fail_point: Option<&'static str>) -> Self {
        UnitOfWork { tx, fail_point }
    }

    /// The connection all reads and writes of this unit must go through.
    #[inline]
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Named point between two writes. Tests arm it to prove rollback.
    #[cfg(not(test))]
    #[inline]
    pub fn checkpoint(&self, _name: &'static str) -> DbResult<()> {
        Ok(())
    }

    #[cfg(test)]
    pub fn checkpoint(&self, name: &'static str) -> DbResult<()> {
        match self.fail_point {
            Some(armed) if armed == name => Err(DbError::Injected(name)),
            _ => Ok(()),
        }
    }

    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
