//! # Managers
//!
//! Every operation that changes more than one row lives here, one manager per
//! concern. Each operation checks the actor's capability, validates input,
//! then runs as a single bounded unit of work.
//!
//! ```text
//! ┌───────────────────────┐   ┌────────────────────────┐
//! │ ReservationManager    │   │ ModificationManager    │
//! │ create, payment       │   │ request/approve/reject │
//! └──────────┬────────────┘   └──────────┬─────────────┘
//!            │                           │
//! ┌──────────▼────────────┐   ┌──────────▼─────────────┐
//! │ AssignmentManager     │──►│ availability           │
//! │ assign, auto, unassign│   │ overlap on same conn   │
//! └──────────┬────────────┘   └────────────────────────┘
//!            │
//! ┌──────────▼────────────┐   ┌────────────────────────┐
//! │ LifecycleManager      │──►│ OverrideManager        │
//! │ confirm … complete    │   │ apply, confirm, reverse│
//! └──────────┬────────────┘   └────────────────────────┘
//!            │
//!      InvoiceAggregator
//! ```

pub mod assignment;
pub mod availability;
pub mod error;
pub mod history;
pub mod invoice;
pub mod lifecycle;
pub mod modification;
pub mod overrides;
pub mod reservation;

#[cfg(test)]
pub(crate) mod testing;
