//! # Booking Lifecycle Manager
//!
//! Moves bookings through the state machine in
//! [`stayhub_core::lifecycle`], keeping rooms, assignments and logs in step.
//!
//! ## Check-out
//! ```text
//! BEGIN
//!   touch + load booking                    NotFound?
//!   checked_in?                             InvalidState?
//!   INSERT booking_charges (additional)
//!   InvoiceAggregator → subtotal
//!   UPDATE bookings  status, totals
//!   UPDATE rooms     → cleaning  + room_status_logs
//!   UPDATE room_assignments → checked_out
//!   INSERT audit_logs booking.check_out
//!   admin_override?  confirm rate | apply override (own audit row)
//!   INSERT front_desk_logs (override_id)
//! COMMIT
//! ```
//!
//! Any error between BEGIN and COMMIT drops the unit of work, which rolls the
//! whole sequence back.

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::audit::{self, snapshot, AuditEvent};
use crate::repository::{assignment, booking, charge, logs, new_id, now, room, room_booking};
use crate::service::assignment::{open_booking, release_in};
use crate::service::availability;
use crate::service::error::ServiceResult;
use crate::service::invoice::{Invoice, InvoiceAggregator, SqlInvoiceAggregator};
use crate::service::overrides::{apply_override_in, confirm_rate_in};
use crate::unit_of_work::UnitOfWork;
use stayhub_core::lifecycle::{ensure_can_check_in, ensure_can_complete, next_status, Transition};
use stayhub_core::validation::{validate_amount, validate_optional_text, validate_reason, validate_uuid};
use stayhub_core::{
    Actor, AssignmentStatus, Booking, Capability, CoreError, FrontDeskLog, Money, OverrideType,
    RoomStatus, StayRange, ValidationError,
};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckInRequest {
    pub key_card_number: Option<String>,
    pub notes: Option<String>,
}

/// Admin decision taken at the desk while checking a guest out.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutOverride {
    pub final_amount: Option<Money>,
    #[serde(default)]
    pub confirm_rate: bool,
    /// Override reason, or the confirmation note when `confirm_rate` is set.
    pub reason: Option<String>,
    #[serde(default)]
    pub override_type: OverrideType,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckOutRequest {
    pub deposit_returned: Option<Money>,
    pub additional_charges: Option<Money>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub admin_override: Option<CheckoutOverride>,
}

/// A checked `CheckoutOverride`.
enum OverrideDecision {
    Confirm { note: Option<String> },
    Apply { final_amount: Money, reason: String, override_type: OverrideType },
}

impl CheckoutOverride {
    fn decide(&self) -> Result<OverrideDecision, ValidationError> {
        if self.confirm_rate {
            return Ok(OverrideDecision::Confirm {
                note: validate_optional_text("admin_override.reason", self.reason.as_deref())?,
            });
        }
        let final_amount = self
            .final_amount
            .ok_or_else(|| ValidationError::required("admin_override.final_amount"))?;
        if final_amount.is_negative() || final_amount.is_zero() {
            return Err(ValidationError::MustBePositive {
                field: "admin_override.final_amount".to_string(),
            });
        }
        let reason = validate_reason("admin_override.reason", self.reason.as_deref().unwrap_or_default())?;
        Ok(OverrideDecision::Apply {
            final_amount,
            reason,
            override_type: self.override_type,
        })
    }
}

// =============================================================================
// Manager
// =============================================================================

#[derive(Debug, Clone)]
pub struct LifecycleManager<A = SqlInvoiceAggregator> {
    db: Database,
    aggregator: A,
}

impl<A: InvoiceAggregator> LifecycleManager<A> {
    pub fn new(db: Database, aggregator: A) -> Self {
        LifecycleManager { db, aggregator }
    }

    /// pending → confirmed. A confirmed booking starts to hold its rooms, so
    /// every assigned room is checked again.
    pub async fn confirm(&self, actor: &Actor, booking_id: &str) -> ServiceResult<Booking> {
        actor.require(Capability::FrontDesk)?;
        validate_uuid("booking_id", booking_id)?;

        self.db
            .bounded("confirm_booking", async {
                let mut uow = self.db.begin().await?;
                let mut booking = open_booking(&mut uow, booking_id).await?;
                let next = next_status(&booking.id, booking.status, Transition::Confirm)?;

                for rb in room_booking::fetch_for_booking(uow.conn(), booking_id).await? {
                    let Some(room_id) = rb.inventory_id.as_deref() else {
                        continue;
                    };
                    let assigned = room::fetch(uow.conn(), room_id)
                        .await?
                        .ok_or_else(|| CoreError::not_found("Room", room_id))?;
                    let range = StayRange::new(rb.check_in_date, rb.check_out_date)?;
                    availability::ensure_available(uow.conn(), &assigned, &range, booking_id).await?;
                }

                let before = snapshot(&booking)?;
                let ts = now();
                booking.status = next;
                booking.confirmed_at = Some(ts);
                booking.updated_at = ts;
                booking::save(uow.conn(), &booking).await?;

                audit_transition(&mut uow, actor, "booking.confirm", before, &booking).await?;
                uow.commit().await?;

                info!(booking_id = %booking_id, reference = %booking.booking_reference, "Booking confirmed");
                Ok(booking)
            })
            .await
    }

    /// confirmed → checked_in. Assigned rooms become occupied.
    pub async fn check_in(&self, actor: &Actor, booking_id: &str, req: CheckInRequest) -> ServiceResult<Booking> {
        actor.require(Capability::FrontDesk)?;
        validate_uuid("booking_id", booking_id)?;
        let key_card_number = validate_optional_text("key_card_number", req.key_card_number.as_deref())?;
        let notes = validate_optional_text("notes", req.notes.as_deref())?;

        self.db
            .bounded("check_in", async {
                let mut uow = self.db.begin().await?;
                let mut booking = open_booking(&mut uow, booking_id).await?;
                let next = ensure_can_check_in(&booking).map_err(|e| {
                    warn!(booking_id = %booking_id, error = %e, "Check-in rejected");
                    e
                })?;

                let before = snapshot(&booking)?;
                let ts = now();
                booking.status = next;
                booking.checked_in_at = Some(ts);
                booking.updated_at = ts;
                booking::save(uow.conn(), &booking).await?;
                uow.checkpoint("check_in.booking_updated")?;

                let rooms = set_rooms(&mut uow, actor, booking_id, RoomStatus::Occupied, "check-in").await?;
                set_assignments(&mut uow, booking_id, AssignmentStatus::CheckedIn).await?;

                let mut log = desk_log(&booking, "check_in", actor, &rooms);
                log.key_card_number = key_card_number;
                log.notes = notes;
                logs::insert_front_desk(uow.conn(), &log).await?;

                audit_transition(&mut uow, actor, "booking.check_in", before, &booking).await?;
                uow.commit().await?;

                info!(
                    booking_id = %booking_id,
                    rooms = %log.room_numbers,
                    "Guest checked in"
                );
                Ok(booking)
            })
            .await
    }

    /// checked_in → checked_out. Rooms go to cleaning and the folio total
    /// becomes the billed amount, optionally amended by an admin.
    pub async fn check_out(&self, actor: &Actor, booking_id: &str, req: CheckOutRequest) -> ServiceResult<Booking> {
        actor.require(Capability::FrontDesk)?;
        validate_uuid("booking_id", booking_id)?;
        let decision = match &req.admin_override {
            Some(o) => {
                actor.require(Capability::RateOverride)?;
                Some(o.decide()?)
            }
            None => None,
        };
        if let Some(amount) = req.deposit_returned {
            validate_amount("deposit_returned", amount)?;
        }
        if let Some(amount) = req.additional_charges {
            validate_amount("additional_charges", amount)?;
        }
        let payment_method = validate_optional_text("payment_method", req.payment_method.as_deref())?;
        let notes = validate_optional_text("notes", req.notes.as_deref())?;

        self.db
            .bounded("check_out", async {
                let mut uow = self.db.begin().await?;
                let mut booking = open_booking(&mut uow, booking_id).await?;
                let next = next_status(&booking.id, booking.status, Transition::CheckOut)?;
                let before = snapshot(&booking)?;

                if let Some(extra) = req.additional_charges.filter(|m| !m.is_zero()) {
                    charge::insert(uow.conn(), booking_id, "Additional charges at check-out", extra, &actor.id)
                        .await?;
                }
                let invoice = self
                    .aggregator
                    .aggregate_charges_for_booking(uow.conn(), booking_id)
                    .await?;

                let ts = now();
                booking.status = next;
                booking.total_amount = invoice.subtotal;
                booking.final_amount = Some(invoice.subtotal);
                booking.checked_out_at = Some(ts);
                booking.updated_at = ts;
                booking::save(uow.conn(), &booking).await?;
                uow.checkpoint("check_out.booking_updated")?;

                let rooms = set_rooms(&mut uow, actor, booking_id, RoomStatus::Cleaning, "check-out").await?;
                set_assignments(&mut uow, booking_id, AssignmentStatus::CheckedOut).await?;
                audit_transition(&mut uow, actor, "booking.check_out", before, &booking).await?;

                let override_id = match decision {
                    Some(OverrideDecision::Confirm { note }) => {
                        let amount = booking.billable_amount();
                        confirm_rate_in(&mut uow, actor, booking.clone(), amount, note).await?;
                        None
                    }
                    Some(OverrideDecision::Apply { final_amount, reason, override_type }) => {
                        let applied =
                            apply_override_in(&mut uow, actor, booking.clone(), final_amount, &reason, override_type)
                                .await?;
                        Some(applied.id)
                    }
                    None => None,
                };

                let mut log = desk_log(&booking, "check_out", actor, &rooms);
                log.deposit_returned = req.deposit_returned;
                log.additional_charges = req.additional_charges;
                log.payment_method = payment_method;
                log.notes = notes;
                log.override_id = override_id;
                logs::insert_front_desk(uow.conn(), &log).await?;

                let booking = booking::fetch(uow.conn(), booking_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("Booking", booking_id))?;
                uow.commit().await?;

                info!(
                    booking_id = %booking_id,
                    billed = %booking.billable_amount(),
                    overridden = log.override_id.is_some(),
                    "Guest checked out"
                );
                Ok(booking)
            })
            .await
    }

    /// pending|confirmed → cancelled, releasing any assigned room.
    pub async fn cancel(&self, actor: &Actor, booking_id: &str, reason: &str) -> ServiceResult<Booking> {
        actor.require(Capability::FrontDesk)?;
        validate_uuid("booking_id", booking_id)?;
        let reason = validate_reason("reason", reason)?;

        self.db
            .bounded("cancel_booking", async {
                let mut uow = self.db.begin().await?;
                let mut booking = open_booking(&mut uow, booking_id).await?;
                let next = next_status(&booking.id, booking.status, Transition::Cancel)?;
                let before = snapshot(&booking)?;

                let released =
                    release_in(&mut uow, actor, booking_id, AssignmentStatus::Cancelled, Some(&reason)).await?;

                let ts = now();
                booking.status = next;
                booking.cancelled_at = Some(ts);
                booking.cancelled_by = Some(actor.id.clone());
                booking.cancellation_reason = Some(reason.clone());
                booking.updated_at = ts;
                booking::save(uow.conn(), &booking).await?;

                audit_transition(&mut uow, actor, "booking.cancel", before, &booking).await?;
                uow.commit().await?;

                info!(booking_id = %booking_id, released = released.len(), "Booking cancelled");
                Ok(booking)
            })
            .await
    }

    /// checked_out → completed once the folio is paid.
    pub async fn complete(&self, actor: &Actor, booking_id: &str) -> ServiceResult<Booking> {
        actor.require(Capability::FrontDesk)?;
        validate_uuid("booking_id", booking_id)?;

        self.db
            .bounded("complete_booking", async {
                let mut uow = self.db.begin().await?;
                let mut booking = open_booking(&mut uow, booking_id).await?;
                let next = ensure_can_complete(&booking)?;
                let before = snapshot(&booking)?;

                booking.status = next;
                booking.updated_at = now();
                booking::save(uow.conn(), &booking).await?;

                audit_transition(&mut uow, actor, "booking.complete", before, &booking).await?;
                uow.commit().await?;
                Ok(booking)
            })
            .await
    }

    /// The current folio, as check-out would bill it.
    pub async fn invoice(&self, actor: &Actor, booking_id: &str) -> ServiceResult<Invoice> {
        actor.require(Capability::PaymentStatus)?;
        validate_uuid("booking_id", booking_id)?;

        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        Ok(self
            .aggregator
            .aggregate_charges_for_booking(&mut conn, booking_id)
            .await?)
    }
}

// =============================================================================
// Steps
// =============================================================================

/// Sets every assigned room of the booking to `status`, logging each change.
/// Returns the unit numbers.
async fn set_rooms(
    uow: &mut UnitOfWork,
    actor: &Actor,
    booking_id: &str,
    status: RoomStatus,
    reason: &str,
) -> ServiceResult<Vec<String>> {
    let mut units = Vec::new();
    for rb in room_booking::fetch_for_booking(uow.conn(), booking_id).await? {
        let Some(room_id) = rb.inventory_id.as_deref() else {
            continue;
        };
        let current = room::fetch(uow.conn(), room_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Room", room_id))?;

        room::set_status(uow.conn(), room_id, status).await?;
        logs::insert_room_status(
            uow.conn(),
            room_id,
            Some(booking_id),
            current.status,
            status,
            &actor.id,
            Some(reason),
        )
        .await?;
        units.push(current.unit_number);
    }
    Ok(units)
}

async fn set_assignments(uow: &mut UnitOfWork, booking_id: &str, status: AssignmentStatus) -> ServiceResult<()> {
    for a in assignment::live_for_booking(uow.conn(), booking_id).await? {
        assignment::transition(uow.conn(), &a.id, status, None).await?;
    }
    Ok(())
}

fn desk_log(booking: &Booking, action: &str, actor: &Actor, rooms: &[String]) -> FrontDeskLog {
    FrontDeskLog {
        id: new_id(),
        booking_id: booking.id.clone(),
        action: action.to_string(),
        staff_id: actor.id.clone(),
        guest_name: booking.guest_name.clone(),
        room_numbers: rooms.join(", "),
        key_card_number: None,
        deposit_returned: None,
        additional_charges: None,
        payment_method: None,
        notes: None,
        override_id: None,
        created_at: now(),
    }
}

async fn audit_transition(
    uow: &mut UnitOfWork,
    actor: &Actor,
    action: &'static str,
    before: serde_json::Value,
    booking: &Booking,
) -> ServiceResult<()> {
    audit::append(
        uow.conn(),
        actor,
        AuditEvent::new(action, "booking", &booking.id)
            .before(before)
            .after(snapshot(booking)?),
    )
    .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use crate::service::assignment::{AssignRequest, AssignmentManager};
    use crate::service::error::ServiceError;
    use crate::service::testing::{date, Fixture, NIGHTLY};
    use stayhub_core::{BookingStatus, ErrorKind, OverrideStatus, PaymentStatus};

    fn manager(fx: &Fixture) -> LifecycleManager {
        LifecycleManager::new(fx.db.clone(), SqlInvoiceAggregator)
    }

    #[tokio::test]
    async fn test_check_in_occupies_rooms() {
        let fx = Fixture::new().await;
        let room = fx.room("101").await;
        let id = fx
            .booking_with(Some(&room), date(6, 1), date(6, 4), BookingStatus::Confirmed, PaymentStatus::Partial)
            .await;

        let req = CheckInRequest {
            key_card_number: Some("KC-77".to_string()),
            notes: None,
        };
        let booking = manager(&fx).check_in(&fx.desk, &id, req).await.unwrap();
        assert_eq!(booking.status, BookingStatus::CheckedIn);
        assert!(booking.checked_in_at.is_some());
        assert_eq!(fx.room_status(&room).await, RoomStatus::Occupied);

        let history = logs::room_status_for_room(fx.db.pool(), &room.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].previous_status, RoomStatus::Available);
        assert_eq!(history[0].new_status, RoomStatus::Occupied);

        let desk = logs::front_desk_for_booking(fx.db.pool(), &id).await.unwrap();
        assert_eq!(desk.len(), 1);
        assert_eq!(desk[0].room_numbers, "101");
        assert_eq!(desk[0].key_card_number.as_deref(), Some("KC-77"));

        assert_eq!(fx.audit_actions(&id).await, vec!["booking.check_in"]);
    }

    #[tokio::test]
    async fn test_status_is_monotonic() {
        let fx = Fixture::new().await;
        let mgr = manager(&fx);

        let pending = fx
            .open_booking(date(6, 1), date(6, 3), BookingStatus::Pending, PaymentStatus::Paid)
            .await;
        let err = mgr.check_in(&fx.desk, &pending, Default::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let unpaid = fx
            .open_booking(date(6, 1), date(6, 3), BookingStatus::Confirmed, PaymentStatus::Pending)
            .await;
        let err = mgr.check_in(&fx.desk, &unpaid, Default::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err = mgr.check_out(&fx.desk, &unpaid, Default::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let staying = fx
            .open_booking(date(6, 1), date(6, 3), BookingStatus::CheckedIn, PaymentStatus::Paid)
            .await;
        let err = mgr.cancel(&fx.desk, &staying, "changed plans").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(fx.booking(&staying).await.status, BookingStatus::CheckedIn);

        let missing = uuid::Uuid::new_v4().to_string();
        let err = mgr.confirm(&fx.desk, &missing).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        for id in [&pending, &unpaid, &staying] {
            assert!(fx.audit_actions(id).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_failed_check_in_rolls_back() {
        let fx = Fixture::new().await;
        let room = fx.room("101").await;
        let id = fx
            .booking_with(Some(&room), date(6, 1), date(6, 4), BookingStatus::Confirmed, PaymentStatus::Paid)
            .await;
        fx.db.fail_at("check_in.booking_updated");

        let err = manager(&fx).check_in(&fx.desk, &id, Default::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Db(DbError::Injected("check_in.booking_updated"))));

        let booking = fx.booking(&id).await;
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.version, 1);
        assert_eq!(fx.room_status(&room).await, RoomStatus::Available);
        assert!(fx.audit_actions(&id).await.is_empty());
    }

    #[tokio::test]
    async fn test_check_out_bills_folio() {
        let fx = Fixture::new().await;
        let room = fx.room("101").await;
        let id = fx
            .booking_with(Some(&room), date(6, 1), date(6, 4), BookingStatus::CheckedIn, PaymentStatus::Paid)
            .await;
        fx.set_room_status(&room, RoomStatus::Occupied).await;

        let req = CheckOutRequest {
            additional_charges: Some(Money::from_minor(2_500)),
            deposit_returned: Some(Money::from_minor(10_000)),
            payment_method: Some("card".to_string()),
            ..Default::default()
        };
        let booking = manager(&fx).check_out(&fx.desk, &id, req).await.unwrap();

        let expected = Money::from_minor(3 * NIGHTLY + 2_500);
        assert_eq!(booking.status, BookingStatus::CheckedOut);
        assert_eq!(booking.total_amount, expected);
        assert_eq!(booking.final_amount, Some(expected));
        assert_eq!(fx.room_status(&room).await, RoomStatus::Cleaning);

        let desk = logs::front_desk_for_booking(fx.db.pool(), &id).await.unwrap();
        assert_eq!(desk[0].action, "check_out");
        assert_eq!(desk[0].payment_method.as_deref(), Some("card"));
        assert!(desk[0].override_id.is_none());

        assert_eq!(fx.audit_actions(&id).await, vec!["booking.check_out"]);
    }

    #[tokio::test]
    async fn test_check_out_with_admin_override() {
        let fx = Fixture::new().await;
        let id = fx
            .open_booking(date(6, 1), date(6, 4), BookingStatus::CheckedIn, PaymentStatus::Paid)
            .await;

        let req = CheckOutRequest {
            admin_override: Some(CheckoutOverride {
                final_amount: Some(Money::from_minor(250_000)),
                reason: Some("loyal guest".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let booking = manager(&fx).check_out(&fx.admin, &id, req).await.unwrap();
        assert_eq!(booking.final_amount, Some(Money::from_minor(250_000)));
        assert_eq!(booking.total_amount, Money::from_minor(250_000));

        let overrides = fx.db.overrides().for_booking(&id).await.unwrap();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].original_final_amount, Money::from_minor(3 * NIGHTLY));
        assert_eq!(overrides[0].status, OverrideStatus::Applied);

        let desk = logs::front_desk_for_booking(fx.db.pool(), &id).await.unwrap();
        assert_eq!(desk[0].override_id.as_deref(), Some(overrides[0].id.as_str()));

        assert_eq!(fx.audit_actions(&id).await, vec!["booking.check_out", "override.apply"]);
    }

    #[tokio::test]
    async fn test_check_out_override_needs_admin() {
        let fx = Fixture::new().await;
        let id = fx
            .open_booking(date(6, 1), date(6, 4), BookingStatus::CheckedIn, PaymentStatus::Paid)
            .await;
        let mgr = manager(&fx);

        let with_override = |amount: Option<i64>, reason: Option<&str>| CheckOutRequest {
            admin_override: Some(CheckoutOverride {
                final_amount: amount.map(Money::from_minor),
                reason: reason.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        };

        let err = mgr
            .check_out(&fx.desk, &id, with_override(Some(1_000), Some("friend")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = mgr
            .check_out(&fx.admin, &id, with_override(Some(0), Some("free")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = mgr
            .check_out(&fx.admin, &id, with_override(Some(1_000), None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(fx.booking(&id).await.status, BookingStatus::CheckedIn);
    }

    #[tokio::test]
    async fn test_check_out_confirming_rate() {
        let fx = Fixture::new().await;
        let id = fx
            .open_booking(date(6, 1), date(6, 3), BookingStatus::CheckedIn, PaymentStatus::Paid)
            .await;

        let req = CheckOutRequest {
            admin_override: Some(CheckoutOverride {
                confirm_rate: true,
                reason: Some("rate checked".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let booking = manager(&fx).check_out(&fx.admin, &id, req).await.unwrap();
        assert_eq!(booking.final_amount, Some(Money::from_minor(2 * NIGHTLY)));
        assert_eq!(booking.rate_confirmed_by.as_deref(), Some("admin-1"));
        assert_eq!(
            fx.audit_actions(&id).await,
            vec!["booking.check_out", "override.confirm_rate"]
        );
    }

    #[tokio::test]
    async fn test_cancel_frees_the_room() {
        let fx = Fixture::new().await;
        let room = fx.room("101").await;
        let first = fx
            .open_booking(date(6, 1), date(6, 5), BookingStatus::Confirmed, PaymentStatus::Pending)
            .await;
        let second = fx
            .open_booking(date(6, 2), date(6, 4), BookingStatus::Confirmed, PaymentStatus::Pending)
            .await;
        let assigner = AssignmentManager::new(fx.db.clone());
        let assign = |booking_id: &str| AssignRequest {
            booking_id: booking_id.to_string(),
            inventory_id: room.id.clone(),
            room_booking_id: None,
            assignment_type: Default::default(),
        };

        assigner.assign(&fx.desk, assign(&first)).await.unwrap();
        let err = assigner.assign(&fx.desk, assign(&second)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let cancelled = manager(&fx).cancel(&fx.desk, &first, "guest called").await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by.as_deref(), Some("desk-1"));
        assert!(assignment::live_for_booking(fx.db.pool(), &first).await.unwrap().is_empty());

        assigner.assign(&fx.desk, assign(&second)).await.unwrap();
        assert_eq!(
            fx.audit_actions(&first).await,
            vec!["booking.assign_room", "booking.cancel"]
        );
    }

    #[tokio::test]
    async fn test_confirm_rechecks_assigned_rooms() {
        let fx = Fixture::new().await;
        let room = fx.room("101").await;
        fx.held_booking(&room, date(6, 1), date(6, 5), BookingStatus::Confirmed)
            .await;
        let late = fx
            .held_booking(&room, date(6, 3), date(6, 6), BookingStatus::Pending)
            .await;
        let next = fx
            .held_booking(&room, date(6, 5), date(6, 8), BookingStatus::Pending)
            .await;

        let mgr = manager(&fx);
        let err = mgr.confirm(&fx.desk, &late).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(fx.booking(&late).await.status, BookingStatus::Pending);

        let confirmed = mgr.confirm(&fx.desk, &next).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert!(confirmed.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn test_complete_requires_payment() {
        let fx = Fixture::new().await;
        let mgr = manager(&fx);
        let unpaid = fx
            .open_booking(date(6, 1), date(6, 3), BookingStatus::CheckedOut, PaymentStatus::Partial)
            .await;
        let err = mgr.complete(&fx.desk, &unpaid).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let paid = fx
            .open_booking(date(6, 1), date(6, 3), BookingStatus::CheckedOut, PaymentStatus::Paid)
            .await;
        let done = mgr.complete(&fx.desk, &paid).await.unwrap();
        assert_eq!(done.status, BookingStatus::Completed);
        assert_eq!(fx.audit_actions(&paid).await, vec!["booking.complete"]);
    }

    #[tokio::test]
    async fn test_invoice_permissions() {
        let fx = Fixture::new().await;
        let id = fx
            .open_booking(date(6, 1), date(6, 3), BookingStatus::Confirmed, PaymentStatus::Pending)
            .await;
        let mgr = manager(&fx);

        let invoice = mgr.invoice(&fx.accountant, &id).await.unwrap();
        assert_eq!(invoice.subtotal.minor(), 2 * NIGHTLY);

        let housekeeping = Actor::new("maint-1", stayhub_core::Role::Maintenance);
        let err = mgr.invoice(&housekeeping, &id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_concurrent_confirms_cannot_double_book() {
        let path = std::env::temp_dir().join(format!("stayhub-race-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4)).await.unwrap();
        let fx = Fixture::with_db(db).await;
        let room = fx.room("101").await;
        let a = fx
            .held_booking(&room, date(6, 1), date(6, 5), BookingStatus::Pending)
            .await;
        let b = fx
            .held_booking(&room, date(6, 3), date(6, 6), BookingStatus::Pending)
            .await;

        let mgr = manager(&fx);
        let (ra, rb) = tokio::join!(mgr.confirm(&fx.desk, &a), mgr.confirm(&fx.desk, &b));

        let outcomes = [ra, rb];
        let ok = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1);
        let err = outcomes.into_iter().find_map(Result::err).unwrap();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        fx.db.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
