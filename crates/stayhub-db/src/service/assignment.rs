//! # Room Assignment Manager
//!
//! Binds a physical room to a room booking, by hand or automatically, and
//! releases it again.
//!
//! ## Assign
//! ```text
//! BEGIN
//!   touch booking                       (write lock)
//!   booking, room, room bookings        NotFound?
//!   booking pending|confirmed,          InvalidState?
//!   room not maintenance/out_of_order
//!   live assignment on target?          AlreadyAssigned?
//!   overlap check (same connection)     Conflict?
//!   INSERT room_assignments (assigned)
//!   UPDATE room_bookings.inventory_id
//!   INSERT audit_logs
//! COMMIT
//! ```
//!
//! Room operational status is never changed by assignment: one room can be
//! pre-assigned to back-to-back future stays while staying `available`.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::pool::Database;
use crate::repository::audit::{self, snapshot, AuditEvent};
use crate::repository::{assignment, booking, logs, new_id, now, room, room_booking};
use crate::service::availability;
use crate::service::error::ServiceResult;
use crate::unit_of_work::UnitOfWork;
use stayhub_core::lifecycle::{ensure_booking_assignable, ensure_can_assign, ensure_can_unassign};
use stayhub_core::validation::{validate_optional_text, validate_uuid};
use stayhub_core::{
    Actor, AssignmentStatus, AssignmentType, Booking, Capability, CoreError, RoomAssignment,
    RoomBooking, RoomBookingWithRoom, RoomStatus, StayRange,
};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AssignRequest {
    pub booking_id: String,
    pub inventory_id: String,
    /// Which room booking of a multi-room booking; the first unassigned one
    /// when absent.
    #[serde(default)]
    pub room_booking_id: Option<String>,
    #[serde(default)]
    pub assignment_type: AssignmentType,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutoAssignPreferences {
    /// Defaults to the room type the guest booked.
    pub room_type_id: Option<String>,
    #[serde(alias = "floor_preference")]
    pub floor: Option<i64>,
    pub room_booking_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnassignOutcome {
    pub booking_id: String,
    pub previous_room_id: String,
    /// Every room released, for multi-room bookings.
    pub released_room_ids: Vec<String>,
}

/// What an assignment changed, for audit and response.
pub(crate) struct Assigned {
    pub before: RoomBooking,
    pub after: RoomBookingWithRoom,
    pub assignment: RoomAssignment,
}

// =============================================================================
// Manager
// =============================================================================

#[derive(Debug, Clone)]
pub struct AssignmentManager {
    db: Database,
}

impl AssignmentManager {
    pub fn new(db: Database) -> Self {
        AssignmentManager { db }
    }

    /// Assigns a specific room.
    pub async fn assign(&self, actor: &Actor, req: AssignRequest) -> ServiceResult<RoomBookingWithRoom> {
        actor.require(Capability::FrontDesk)?;
        validate_uuid("booking_id", &req.booking_id)?;
        validate_uuid("inventory_id", &req.inventory_id)?;

        self.db
            .bounded("assign_room", async {
                let mut uow = self.db.begin().await?;
                let booking = open_booking(&mut uow, &req.booking_id).await?;

                let assigned = assign_in(
                    &mut uow,
                    actor,
                    &booking,
                    req.room_booking_id.as_deref(),
                    &req.inventory_id,
                    req.assignment_type,
                )
                .await?;
                audit_assignment(&mut uow, actor, &booking, &assigned).await?;

                uow.commit().await?;
                Ok(assigned.after)
            })
            .await
    }

    /// Picks the first free room by unit number and assigns it.
    pub async fn auto_assign(
        &self,
        actor: &Actor,
        booking_id: &str,
        prefs: AutoAssignPreferences,
    ) -> ServiceResult<RoomBookingWithRoom> {
        actor.require(Capability::FrontDesk)?;
        validate_uuid("booking_id", booking_id)?;

        self.db
            .bounded("auto_assign_room", async {
                let mut uow = self.db.begin().await?;
                let booking = open_booking(&mut uow, booking_id).await?;
                ensure_booking_assignable(&booking)?;

                let stays = room_booking::fetch_for_booking(uow.conn(), booking_id).await?;
                let live = assignment::live_for_booking(uow.conn(), booking_id).await?;
                let target = pick_target(&booking, &stays, &live, prefs.room_booking_id.as_deref())?;
                let range = StayRange::new(target.check_in_date, target.check_out_date)?;

                let room_type_id = prefs
                    .room_type_id
                    .clone()
                    .unwrap_or_else(|| target.room_type_id.clone());
                let free = availability::free_rooms(
                    uow.conn(),
                    &range,
                    Some(&room_type_id),
                    prefs.floor,
                    booking_id,
                )
                .await?;

                let chosen = free
                    .into_iter()
                    .find(|r| availability::sibling_on_room(&stays, &target.id, &r.id, &range).is_none())
                    .ok_or_else(|| CoreError::NoAvailability {
                        check_in: range.check_in().to_string(),
                        check_out: range.check_out().to_string(),
                    })?;

                let target_id = target.id.clone();
                let assigned = assign_in(
                    &mut uow,
                    actor,
                    &booking,
                    Some(&target_id),
                    &chosen.id,
                    AssignmentType::Auto,
                )
                .await?;
                audit_assignment(&mut uow, actor, &booking, &assigned).await?;

                uow.commit().await?;
                Ok(assigned.after)
            })
            .await
    }

    /// Releases every live assignment of the booking.
    ///
    /// Calling it on a booking without a live assignment is `NotFound`.
    pub async fn unassign(
        &self,
        actor: &Actor,
        booking_id: &str,
        reason: Option<&str>,
    ) -> ServiceResult<UnassignOutcome> {
        actor.require(Capability::FrontDesk)?;
        validate_uuid("booking_id", booking_id)?;
        let reason = validate_optional_text("reason", reason)?;

        self.db
            .bounded("unassign_room", async {
                let mut uow = self.db.begin().await?;
                let booking = open_booking(&mut uow, booking_id).await?;
                ensure_can_unassign(&booking)?;

                let before = assignment::live_for_booking(uow.conn(), booking_id).await?;
                if before.is_empty() {
                    return Err(CoreError::not_found("RoomAssignment", booking_id).into());
                }

                let released = release_in(
                    &mut uow,
                    actor,
                    booking_id,
                    AssignmentStatus::Cancelled,
                    reason.as_deref(),
                )
                .await?;

                let after = assignment::list_for_booking(uow.conn(), booking_id).await?;
                audit::append(
                    uow.conn(),
                    actor,
                    AuditEvent::new("booking.unassign_room", "booking", booking_id)
                        .before(snapshot(&before)?)
                        .after(snapshot(&after)?),
                )
                .await?;

                uow.commit().await?;
                info!(booking_id = %booking_id, rooms = released.len(), "Rooms unassigned");

                Ok(UnassignOutcome {
                    booking_id: booking_id.to_string(),
                    previous_room_id: released.first().cloned().unwrap_or_default(),
                    released_room_ids: released,
                })
            })
            .await
    }
}

// =============================================================================
// Shared Steps
// =============================================================================

/// Touches the booking and loads it. Every unit of work starts here.
pub(crate) async fn open_booking(uow: &mut UnitOfWork, booking_id: &str) -> ServiceResult<Booking> {
    if !booking::touch(uow.conn(), booking_id).await? {
        return Err(CoreError::not_found("Booking", booking_id).into());
    }
    booking::fetch(uow.conn(), booking_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Booking", booking_id).into())
}

/// The room booking an assignment goes to.
fn pick_target(
    booking: &Booking,
    stays: &[RoomBooking],
    live: &[RoomAssignment],
    room_booking_id: Option<&str>,
) -> ServiceResult<RoomBooking> {
    let live_on = |rb: &RoomBooking| live.iter().find(|a| a.room_booking_id == rb.id);

    let target = match room_booking_id {
        Some(id) => stays
            .iter()
            .find(|rb| rb.id == id)
            .ok_or_else(|| CoreError::not_found("RoomBooking", id))?,
        None => match stays.iter().find(|rb| live_on(rb).is_none()) {
            Some(rb) => rb,
            None => stays
                .first()
                .ok_or_else(|| CoreError::not_found("RoomBooking", &booking.id))?,
        },
    };

    if let Some(existing) = live_on(target) {
        return Err(CoreError::AlreadyAssigned {
            booking_id: booking.id.clone(),
            room: target
                .assigned_room_label
                .clone()
                .unwrap_or_else(|| existing.inventory_id.clone()),
        }
        .into());
    }
    Ok(target.clone())
}

/// Assigns `room_id` inside an open unit of work. Writes no audit row.
pub(crate) async fn assign_in(
    uow: &mut UnitOfWork,
    actor: &Actor,
    booking: &Booking,
    room_booking_id: Option<&str>,
    room_id: &str,
    assignment_type: AssignmentType,
) -> ServiceResult<Assigned> {
    let room = room::fetch(uow.conn(), room_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Room", room_id))?;
    ensure_can_assign(booking, &room)?;

    let stays = room_booking::fetch_for_booking(uow.conn(), &booking.id).await?;
    let live = assignment::live_for_booking(uow.conn(), &booking.id).await?;
    let target = pick_target(booking, &stays, &live, room_booking_id)?;
    let range = StayRange::new(target.check_in_date, target.check_out_date)?;

    availability::ensure_no_sibling(&stays, &target.id, &room, &range, &booking.booking_reference)?;
    availability::ensure_available(uow.conn(), &room, &range, &booking.id).await?;

    let record = RoomAssignment {
        id: new_id(),
        booking_id: booking.id.clone(),
        room_booking_id: target.id.clone(),
        inventory_id: room.id.clone(),
        assigned_by: actor.id.clone(),
        assignment_type,
        status: AssignmentStatus::Assigned,
        release_reason: None,
        assigned_at: now(),
        released_at: None,
    };
    assignment::insert(uow.conn(), &record).await?;
    uow.checkpoint("assign.recorded")?;

    room_booking::set_room(uow.conn(), &target.id, Some(&room.id), Some(&room.unit_number)).await?;

    let updated = room_booking::fetch(uow.conn(), &target.id)
        .await?
        .ok_or_else(|| CoreError::not_found("RoomBooking", &target.id))?;

    info!(
        booking_id = %booking.id,
        room = %room.unit_number,
        assignment_type = %assignment_type,
        "Room assigned"
    );

    Ok(Assigned {
        before: target,
        after: RoomBookingWithRoom {
            room_booking: updated,
            room: Some(room),
        },
        assignment: record,
    })
}

async fn audit_assignment(
    uow: &mut UnitOfWork,
    actor: &Actor,
    booking: &Booking,
    assigned: &Assigned,
) -> ServiceResult<()> {
    let after = serde_json::json!({
        "room_booking": snapshot(&assigned.after.room_booking)?,
        "assignment": snapshot(&assigned.assignment)?,
    });
    audit::append(
        uow.conn(),
        actor,
        AuditEvent::new("booking.assign_room", "booking", &booking.id)
            .before(snapshot(&assigned.before)?)
            .after(after),
    )
    .await?;
    Ok(())
}

/// Ends every live assignment of the booking with `status` and clears the
/// room bookings. A room left `reserved` goes back to `available`.
///
/// Returns the released room ids. Writes no audit row.
pub(crate) async fn release_in(
    uow: &mut UnitOfWork,
    actor: &Actor,
    booking_id: &str,
    status: AssignmentStatus,
    reason: Option<&str>,
) -> ServiceResult<Vec<String>> {
    let live = assignment::live_for_booking(uow.conn(), booking_id).await?;
    let mut released = Vec::with_capacity(live.len());

    for a in live {
        assignment::transition(uow.conn(), &a.id, status, reason).await?;
        room_booking::set_room(uow.conn(), &a.room_booking_id, None, None).await?;

        if let Some(r) = room::fetch(uow.conn(), &a.inventory_id).await? {
            if r.status == RoomStatus::Reserved {
                room::set_status(uow.conn(), &r.id, RoomStatus::Available).await?;
                logs::insert_room_status(
                    uow.conn(),
                    &r.id,
                    Some(booking_id),
                    RoomStatus::Reserved,
                    RoomStatus::Available,
                    &actor.id,
                    reason,
                )
                .await?;
            }
        }
        released.push(a.inventory_id);
    }
    Ok(released)
}

// =============================================================================
// Unit Tests
// =============================================================================
