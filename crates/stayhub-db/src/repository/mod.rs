//! # Repository Module
//!
//! SQL for every StayHub table, in one place.
//!
//! ## Two Access Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Reads for pages and history                                           │
//! │       db.bookings().details(id)                                        │
//! │       db.overrides().list(filter, limit, offset)                       │
//! │       └── Repository structs holding the pool                          │
//! │                                                                         │
//! │  Reads and writes inside a manager                                     │
//! │       booking::fetch(uow.conn(), id)                                   │
//! │       booking::save(uow.conn(), &booking)                              │
//! │       └── Free functions taking an executor / connection              │
//! │                                                                         │
//! │  Both paths share the same query functions; only the executor          │
//! │  differs (`&SqlitePool` vs `&mut SqliteConnection`).                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Free functions that write take `&mut SqliteConnection` only: nothing
//! outside a unit of work may mutate bookings, rooms or room bookings.

use serde::Serialize;

pub mod assignment;
pub mod audit;
pub mod booking;
pub mod charge;
pub mod logs;
pub mod modification;
pub mod overrides;
pub mod room;
pub mod room_booking;
pub mod staff;

/// One page of a history query.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        let per_page = limit.max(1);
        Page {
            items,
            total,
            page: offset / per_page + 1,
            per_page,
        }
    }
}

pub(crate) fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

/// Fresh primary key.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
