//! # Reservation Manager
//!
//! Booking intake and payment status.
//!
//! ## Create
//! ```text
//! validate every stay            (before BEGIN)
//! BEGIN
//!   INSERT bookings (pending)    retry on reference collision
//!   per stay:
//!     room type                  NotFound?
//!     requested room?            assignable, no overlap (incl. this request)
//!     INSERT room_bookings
//!     INSERT room_assignments    (manual, when a room was requested)
//!   INSERT audit_logs booking.create
//! COMMIT
//! ```

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::audit::{self, snapshot, AuditEvent};
use crate::repository::booking::BookingDetails;
use crate::repository::{assignment, booking, new_id, now, room, room_booking};
use crate::service::assignment::open_booking;
use crate::service::availability;
use crate::service::error::{ServiceError, ServiceResult};
use crate::unit_of_work::UnitOfWork;
use stayhub_core::lifecycle::{ensure_can_assign, ensure_can_update_payment};
use stayhub_core::validation::{validate_occupants, validate_optional_text, validate_reason, validate_uuid};
use stayhub_core::{
    booking_reference, Actor, AssignmentStatus, AssignmentType, Booking, BookingStatus, Capability,
    CoreError, Money, PaymentStatus, RateBreakdown, RoomAssignment, RoomBooking, StayRange,
    ValidationError,
};

/// Attempts at drawing an unused booking reference.
const REFERENCE_ATTEMPTS: usize = 3;

fn default_source() -> String {
    "walk_in".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoomBooking {
    pub room_type_id: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub adults: i64,
    #[serde(default)]
    pub children: i64,
    /// Defaults to the room type's base price per night.
    pub rate: Option<RateBreakdown>,
    /// A specific room, checked for overlap and assigned on creation.
    pub inventory_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub guest_name: String,
    pub guest_id: Option<String>,
    #[serde(default = "default_source")]
    pub source: String,
    pub rooms: Vec<NewRoomBooking>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReservationManager {
    db: Database,
}

impl ReservationManager {
    pub fn new(db: Database) -> Self {
        ReservationManager { db }
    }

    pub async fn create_booking(&self, actor: &Actor, req: NewBooking) -> ServiceResult<BookingDetails> {
        actor.require(Capability::FrontDesk)?;
        let guest_name = validate_reason("guest_name", &req.guest_name)?;
        let source = validate_reason("source", &req.source)?;
        let notes = validate_optional_text("notes", req.notes.as_deref())?;
        if req.rooms.is_empty() {
            return Err(ValidationError::required("rooms").into());
        }
        let mut ranges = Vec::with_capacity(req.rooms.len());
        for stay in &req.rooms {
            validate_uuid("room_type_id", &stay.room_type_id)?;
            if let Some(room_id) = &stay.inventory_id {
                validate_uuid("inventory_id", room_id)?;
            }
            validate_occupants(stay.adults, stay.children)?;
            let range = StayRange::new(stay.check_in_date, stay.check_out_date)?;
            if let Some(rate) = &stay.rate {
                rate.validate(range.nights())?;
            }
            ranges.push(range);
        }

        let booking_id = self
            .db
            .bounded("create_booking", async {
                let mut uow = self.db.begin().await?;
                let ts = now();
                let mut draft = Booking {
                    id: new_id(),
                    booking_reference: String::new(),
                    guest_id: req.guest_id.clone(),
                    guest_name,
                    status: BookingStatus::Pending,
                    payment_status: PaymentStatus::Pending,
                    total_amount: Money::zero(),
                    final_amount: None,
                    source,
                    notes,
                    created_at: ts,
                    updated_at: ts,
                    confirmed_at: None,
                    checked_in_at: None,
                    checked_out_at: None,
                    cancelled_at: None,
                    cancelled_by: None,
                    cancellation_reason: None,
                    rate_confirmed_by: None,
                    rate_confirmed_at: None,
                    version: 1,
                };
                insert_with_reference(&mut uow, &mut draft).await?;

                let mut stays: Vec<RoomBooking> = Vec::with_capacity(req.rooms.len());
                for (stay, range) in req.rooms.iter().zip(&ranges) {
                    let rb = add_stay(&mut uow, actor, &draft, stay, range, &stays).await?;
                    stays.push(rb);
                }

                draft.total_amount = stays.iter().map(|rb| rb.final_amount).sum();
                booking::save(uow.conn(), &draft).await?;

                audit::append(
                    uow.conn(),
                    actor,
                    AuditEvent::new("booking.create", "booking", &draft.id).after(serde_json::json!({
                        "booking": snapshot(&draft)?,
                        "room_bookings": snapshot(&stays)?,
                    })),
                )
                .await?;
                uow.commit().await?;

                info!(
                    booking_id = %draft.id,
                    reference = %draft.booking_reference,
                    rooms = stays.len(),
                    total = %draft.total_amount,
                    "Booking created"
                );
                Ok::<_, ServiceError>(draft.id)
            })
            .await?;

        self.db
            .bookings()
            .details(&booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking", booking_id).into())
    }

    pub async fn update_payment_status(
        &self,
        actor: &Actor,
        booking_id: &str,
        payment_status: PaymentStatus,
    ) -> ServiceResult<Booking> {
        actor.require(Capability::PaymentStatus)?;
        validate_uuid("booking_id", booking_id)?;

        self.db
            .bounded("update_payment_status", async {
                let mut uow = self.db.begin().await?;
                let mut booking = open_booking(&mut uow, booking_id).await?;
                ensure_can_update_payment(&booking)?;
                let before = snapshot(&booking)?;

                booking.payment_status = payment_status;
                booking.updated_at = now();
                booking::save(uow.conn(), &booking).await?;

                audit::append(
                    uow.conn(),
                    actor,
                    AuditEvent::new("booking.payment_status", "booking", booking_id)
                        .before(before)
                        .after(snapshot(&booking)?),
                )
                .await?;
                uow.commit().await?;

                info!(booking_id = %booking_id, payment_status = %payment_status, "Payment status updated");
                Ok(booking)
            })
            .await
    }
}

/// Inserts the booking under a fresh reference, drawing a new one on
/// collision.
async fn insert_with_reference(uow: &mut UnitOfWork, draft: &mut Booking) -> ServiceResult<()> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        draft.booking_reference = booking_reference(draft.created_at.date_naive(), &uuid::Uuid::new_v4());
        match booking::insert(uow.conn(), draft).await {
            Ok(()) => return Ok(()),
            Err(DbError::UniqueViolation { field })
                if field.contains("booking_reference") && attempt < REFERENCE_ATTEMPTS =>
            {
                warn!(reference = %draft.booking_reference, "Booking reference taken, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn add_stay(
    uow: &mut UnitOfWork,
    actor: &Actor,
    booking: &Booking,
    stay: &NewRoomBooking,
    range: &StayRange,
    earlier: &[RoomBooking],
) -> ServiceResult<RoomBooking> {
    let room_type = room::fetch_type(uow.conn(), &stay.room_type_id)
        .await?
        .ok_or_else(|| CoreError::not_found("RoomType", &stay.room_type_id))?;
    if stay.adults + stay.children > room_type.max_occupancy {
        return Err(ValidationError::OutOfRange {
            field: "occupants".to_string(),
            min: 1,
            max: room_type.max_occupancy,
        }
        .into());
    }

    let requested = match stay.inventory_id.as_deref() {
        Some(room_id) => {
            let unit = room::fetch(uow.conn(), room_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Room", room_id))?;
            ensure_can_assign(booking, &unit)?;
            availability::ensure_no_sibling(earlier, "", &unit, range, &booking.booking_reference)?;
            availability::ensure_available(uow.conn(), &unit, range, &booking.id).await?;
            Some(unit)
        }
        None => None,
    };

    let rate = stay.rate.unwrap_or_else(|| RateBreakdown::nightly(room_type.base_price));
    let ts = now();
    let rb = RoomBooking {
        id: new_id(),
        booking_id: booking.id.clone(),
        room_type_id: room_type.id.clone(),
        inventory_id: requested.as_ref().map(|r| r.id.clone()),
        assigned_room_label: requested.as_ref().map(|r| r.unit_number.clone()),
        check_in_date: range.check_in(),
        check_out_date: range.check_out(),
        nights: range.nights(),
        adults: stay.adults,
        children: stay.children,
        rate,
        final_amount: rate.final_amount(range.nights()),
        created_at: ts,
        updated_at: ts,
    };
    room_booking::insert(uow.conn(), &rb).await?;

    if let Some(unit) = requested {
        assignment::insert(
            uow.conn(),
            &RoomAssignment {
                id: new_id(),
                booking_id: booking.id.clone(),
                room_booking_id: rb.id.clone(),
                inventory_id: unit.id,
                assigned_by: actor.id.clone(),
                assignment_type: AssignmentType::Manual,
                status: AssignmentStatus::Assigned,
                release_reason: None,
                assigned_at: ts,
                released_at: None,
            },
        )
        .await?;
    }
    Ok(rb)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::assignment::AssignmentManager;
    use crate::service::testing::{date, Fixture, NIGHTLY};
    use stayhub_core::{ErrorKind, Role, TaxRate};

    fn stay(fx: &Fixture, check_in: NaiveDate, check_out: NaiveDate) -> NewRoomBooking {
        NewRoomBooking {
            room_type_id: fx.room_type.id.clone(),
            check_in_date: check_in,
            check_out_date: check_out,
            adults: 2,
            children: 0,
            rate: None,
            inventory_id: None,
        }
    }

    fn request(rooms: Vec<NewRoomBooking>) -> NewBooking {
        NewBooking {
            guest_name: "Amina Yusuf".to_string(),
            guest_id: None,
            source: default_source(),
            rooms,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_multi_room_booking_totals() {
        let fx = Fixture::new().await;
        let mut second = stay(&fx, date(6, 1), date(6, 3));
        second.rate = Some(
            RateBreakdown::nightly(Money::from_minor(80_000)).with_rates(
                2,
                TaxRate::from_bps(1_000),
                TaxRate::zero(),
            ),
        );
        let req = request(vec![stay(&fx, date(6, 1), date(6, 4)), second]);

        let details = ReservationManager::new(fx.db.clone())
            .create_booking(&fx.desk, req)
            .await
            .unwrap();

        let b = &details.booking;
        assert_eq!(b.status, BookingStatus::Pending);
        assert_eq!(b.payment_status, PaymentStatus::Pending);
        assert!(b.booking_reference.starts_with("BK-"));
        assert_eq!(details.room_bookings.len(), 2);
        assert!(details.assignments.is_empty());

        // 3 × 100000 + (2 × 80000 + 10% tax)
        assert_eq!(b.total_amount.minor(), 3 * NIGHTLY + 176_000);
        assert_eq!(fx.audit_actions(&b.id).await, vec!["booking.create"]);
    }

    #[tokio::test]
    async fn test_requested_room_is_checked_and_assigned() {
        let fx = Fixture::new().await;
        let room = fx.room("101").await;
        fx.held_booking(&room, date(6, 1), date(6, 5), BookingStatus::Confirmed)
            .await;
        let mgr = ReservationManager::new(fx.db.clone());

        let mut clashing = stay(&fx, date(6, 3), date(6, 6));
        clashing.inventory_id = Some(room.id.clone());
        let err = mgr.create_booking(&fx.desk, request(vec![clashing])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(fx.db.bookings().list(None, 10, 0).await.unwrap().total, 1);

        let mut after = stay(&fx, date(6, 5), date(6, 8));
        after.inventory_id = Some(room.id.clone());
        let details = mgr.create_booking(&fx.desk, request(vec![after])).await.unwrap();
        assert_eq!(details.assignments.len(), 1);
        assert_eq!(details.assignments[0].assignment_type, AssignmentType::Manual);
        assert_eq!(
            details.room_bookings[0].room_booking.assigned_room_label.as_deref(),
            Some("101")
        );

        let outcome = AssignmentManager::new(fx.db.clone())
            .unassign(&fx.desk, &details.booking.id, None)
            .await
            .unwrap();
        assert_eq!(outcome.previous_room_id, room.id);
    }

    #[tokio::test]
    async fn test_same_room_twice_in_one_request() {
        let fx = Fixture::new().await;
        let room = fx.room("101").await;
        let mut a = stay(&fx, date(6, 1), date(6, 4));
        a.inventory_id = Some(room.id.clone());
        let mut b = stay(&fx, date(6, 3), date(6, 5));
        b.inventory_id = Some(room.id.clone());

        let err = ReservationManager::new(fx.db.clone())
            .create_booking(&fx.desk, request(vec![a, b]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(fx.db.bookings().list(None, 10, 0).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let fx = Fixture::new().await;
        let mgr = ReservationManager::new(fx.db.clone());

        let err = mgr.create_booking(&fx.desk, request(vec![])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let backwards = stay(&fx, date(6, 4), date(6, 4));
        let err = mgr.create_booking(&fx.desk, request(vec![backwards])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut crowded = stay(&fx, date(6, 1), date(6, 2));
        crowded.children = 3;
        let err = mgr.create_booking(&fx.desk, request(vec![crowded])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut unknown = stay(&fx, date(6, 1), date(6, 2));
        unknown.room_type_id = uuid::Uuid::new_v4().to_string();
        let err = mgr.create_booking(&fx.desk, request(vec![unknown])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = mgr
            .create_booking(&fx.accountant, request(vec![stay(&fx, date(6, 1), date(6, 2))]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_payment_status_updates() {
        let fx = Fixture::new().await;
        let mgr = ReservationManager::new(fx.db.clone());
        let id = fx
            .open_booking(date(6, 1), date(6, 3), BookingStatus::Confirmed, PaymentStatus::Pending)
            .await;

        let b = mgr
            .update_payment_status(&fx.accountant, &id, PaymentStatus::Partial)
            .await
            .unwrap();
        assert_eq!(b.payment_status, PaymentStatus::Partial);
        assert_eq!(fx.audit_actions(&id).await, vec!["booking.payment_status"]);

        let cook = Actor::new("chef-1", Role::Restaurant);
        let err = mgr
            .update_payment_status(&cook, &id, PaymentStatus::Paid)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let cancelled = fx
            .open_booking(date(6, 1), date(6, 3), BookingStatus::Cancelled, PaymentStatus::Pending)
            .await;
        let err = mgr
            .update_payment_status(&fx.desk, &cancelled, PaymentStatus::Refunded)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}
