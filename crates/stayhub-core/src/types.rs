//! # Domain Types
//!
//! Core domain types used throughout StayHub.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐ 1   n ┌─────────────────┐ n   1 ┌──────────────┐  │
//! │  │    Booking      │──────►│   RoomBooking   │──────►│  RoomType    │  │
//! │  │  ─────────────  │       │  ─────────────  │       └──────────────┘  │
//! │  │  status         │       │  check_in_date  │ n   0..1 ┌───────────┐  │
//! │  │  payment_status │       │  check_out_date │─────────►│   Room    │  │
//! │  │  total_amount   │       │  inventory_id   │          │  status   │  │
//! │  │  final_amount   │       │  rate breakdown │          └───────────┘  │
//! │  └───────┬─────────┘       └─────────────────┘                         │
//! │          │                                                              │
//! │          ├──► RoomAssignment   (who assigned which room, when)         │
//! │          ├──► AdminOverride    (amount corrections, reversible)        │
//! │          ├──► CheckoutConfirmation                                      │
//! │          ├──► BookingModification (date / rate change requests)        │
//! │          └──► AuditLogEntry    (append-only, every mutation)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (`booking_reference`, `unit_number`)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::rate::RateBreakdown;

/// Generates `as_str`, `Display` and `FromStr` for a string-backed enum.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ValidationError::NotAllowed {
                        field: stringify!($name).to_string(),
                        allowed: $name::ALL.iter().map(|v| v.as_str().to_string()).collect(),
                    }),
                }
            }
        }
    };
}

// =============================================================================
// Booking Status
// =============================================================================

/// Booking lifecycle status.
///
/// `CheckedIn` is the single canonical "guest is occupying the room" state.
/// `Completed` is a settled state after check-out and is never occupying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
    Completed,
}

string_enum!(BookingStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    CheckedIn => "checked_in",
    CheckedOut => "checked_out",
    Cancelled => "cancelled",
    Completed => "completed",
});

impl BookingStatus {
    /// Statuses whose room bookings hold a physical room against other stays.
    pub const HOLDS_ROOM: [BookingStatus; 2] = [BookingStatus::Confirmed, BookingStatus::CheckedIn];

    /// Whether room bookings under this status block the room.
    pub fn holds_room(&self) -> bool {
        Self::HOLDS_ROOM.contains(self)
    }

    /// Financial amendments are only made to finished stays.
    pub fn is_finalized(&self) -> bool {
        matches!(self, BookingStatus::CheckedOut | BookingStatus::Completed)
    }
}

// =============================================================================
// Payment Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Partial,
    Paid,
    Refunded,
}

string_enum!(PaymentStatus {
    Pending => "pending",
    Partial => "partial",
    Paid => "paid",
    Refunded => "refunded",
});

impl PaymentStatus {
    /// Whether enough has been paid to hand over a key.
    pub fn allows_check_in(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Partial)
    }
}

// =============================================================================
// Room Status
// =============================================================================

/// Operational status of a physical room.
///
/// This is NOT booking occupancy. A room can be assigned to several future
/// stays with non-overlapping dates while remaining `Available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
    Maintenance,
    Cleaning,
    OutOfOrder,
}

string_enum!(RoomStatus {
    Available => "available",
    Occupied => "occupied",
    Reserved => "reserved",
    Maintenance => "maintenance",
    Cleaning => "cleaning",
    OutOfOrder => "out_of_order",
});

impl RoomStatus {
    /// Rooms in these states cannot be handed to a guest at all.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, RoomStatus::Maintenance | RoomStatus::OutOfOrder)
    }
}

// =============================================================================
// Room Assignment Status / Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    CheckedIn,
    CheckedOut,
    Cancelled,
    Reassigned,
}

string_enum!(AssignmentStatus {
    Assigned => "assigned",
    CheckedIn => "checked_in",
    CheckedOut => "checked_out",
    Cancelled => "cancelled",
    Reassigned => "reassigned",
});

impl AssignmentStatus {
    /// Live assignments still bind the room to the booking.
    pub fn is_live(&self) -> bool {
        matches!(self, AssignmentStatus::Assigned | AssignmentStatus::CheckedIn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    #[default]
    Manual,
    Auto,
}

string_enum!(AssignmentType {
    Manual => "manual",
    Auto => "auto",
});

// =============================================================================
// Override / Modification Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OverrideStatus {
    Applied,
    Reversed,
}

string_enum!(OverrideStatus {
    Applied => "applied",
    Reversed => "reversed",
});

/// Why an admin changed the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OverrideType {
    #[default]
    RateAdjustment,
    Discount,
    Surcharge,
    Correction,
    Complimentary,
}

string_enum!(OverrideType {
    RateAdjustment => "rate_adjustment",
    Discount => "discount",
    Surcharge => "surcharge",
    Correction => "correction",
    Complimentary => "complimentary",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ModificationStatus {
    Pending,
    Approved,
    Rejected,
}

string_enum!(ModificationStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

// =============================================================================
// Booking
// =============================================================================

/// A stay request: the top-level reservation record.
///
/// Never physically deleted; cancellation is a status.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Booking {
    pub id: String,
    pub booking_reference: String,
    pub guest_id: Option<String>,
    pub guest_name: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    /// Sum of the room booking amounts plus extra charges.
    pub total_amount: Money,
    /// Authoritative billable amount once set by check-out or an override.
    pub final_amount: Option<Money>,
    pub source: String,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub checked_in_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub checked_out_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    pub rate_confirmed_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub rate_confirmed_at: Option<DateTime<Utc>>,
    /// Bumped by every unit of work that touches the booking.
    pub version: i64,
}

impl Booking {
    /// The amount an override starts from.
    pub fn billable_amount(&self) -> Money {
        self.final_amount.unwrap_or(self.total_amount)
    }
}

// =============================================================================
// Room Type / Room
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RoomType {
    pub id: String,
    pub name: String,
    pub base_price: Money,
    pub max_occupancy: i64,
}

/// A physical, uniquely numbered unit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Room {
    pub id: String,
    pub room_type_id: String,
    pub unit_number: String,
    pub floor: i64,
    pub status: RoomStatus,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Room Booking
// =============================================================================

/// The date-ranged occupancy request of a booking.
///
/// `inventory_id = None` means "unassigned".
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RoomBooking {
    pub id: String,
    pub booking_id: String,
    pub room_type_id: String,
    pub inventory_id: Option<String>,
    /// Denormalized unit number shown on guest-facing documents.
    pub assigned_room_label: Option<String>,
    #[ts(as = "String")]
    pub check_in_date: NaiveDate,
    #[ts(as = "String")]
    pub check_out_date: NaiveDate,
    pub nights: i64,
    pub adults: i64,
    pub children: i64,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub rate: RateBreakdown,
    pub final_amount: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A room booking joined with its assigned room.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomBookingWithRoom {
    #[serde(flatten)]
    pub room_booking: RoomBooking,
    pub room: Option<Room>,
}

// =============================================================================
// Room Assignment
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RoomAssignment {
    pub id: String,
    pub booking_id: String,
    pub room_booking_id: String,
    pub inventory_id: String,
    pub assigned_by: String,
    pub assignment_type: AssignmentType,
    pub status: AssignmentStatus,
    pub release_reason: Option<String>,
    #[ts(as = "String")]
    pub assigned_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub released_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Admin Override / Checkout Confirmation
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AdminOverride {
    pub id: String,
    pub booking_id: String,
    pub admin_id: String,
    pub override_type: OverrideType,
    pub original_final_amount: Money,
    pub overridden_final_amount: Money,
    pub difference_amount: Money,
    pub reason: String,
    pub status: OverrideStatus,
    pub reversed_by: Option<String>,
    pub reversal_reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub reversed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CheckoutConfirmation {
    pub id: String,
    pub booking_id: String,
    pub admin_id: String,
    pub confirmed_amount: Money,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Booking Modification
// =============================================================================

/// A requested change to the dates or nightly rate of one room booking.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BookingModification {
    pub id: String,
    pub booking_id: String,
    pub room_booking_id: String,
    pub requested_by: String,
    #[ts(as = "Option<String>")]
    pub new_check_in_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub new_check_out_date: Option<NaiveDate>,
    pub new_price_per_night: Option<Money>,
    pub reason: String,
    pub status: ModificationStatus,
    pub reviewed_by: Option<String>,
    pub review_note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Charges / Logs
// =============================================================================

/// An extra charge posted to a booking's folio (minibar, laundry, ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BookingCharge {
    pub id: String,
    pub booking_id: String,
    pub description: String,
    pub amount: Money,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a mutating action.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AuditLogEntry {
    pub id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub actor_id: String,
    /// JSON snapshot before the change.
    pub before_state: Option<String>,
    /// JSON snapshot after the change.
    pub after_state: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Front desk record of one check-in or check-out.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FrontDeskLog {
    pub id: String,
    pub booking_id: String,
    pub action: String,
    pub staff_id: String,
    pub guest_name: String,
    pub room_numbers: String,
    pub key_card_number: Option<String>,
    pub deposit_returned: Option<Money>,
    pub additional_charges: Option<Money>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub override_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RoomStatusLog {
    pub id: String,
    pub room_id: String,
    pub booking_id: Option<String>,
    pub previous_status: RoomStatus,
    pub new_status: RoomStatus,
    pub changed_by: String,
    pub reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
