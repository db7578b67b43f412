//! # Modification Manager
//!
//! Date and rate changes go through a request/review workflow: the desk
//! files a request, an admin approves or rejects it. Approval re-runs the
//! overlap check for the assigned room inside its own transaction, because
//! the room may have been booked around the stay since the request was made.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::audit::{self, snapshot, AuditEvent};
use crate::repository::{booking, modification, new_id, now, room, room_booking};
use crate::service::assignment::open_booking;
use crate::service::availability;
use crate::service::error::ServiceResult;
use crate::unit_of_work::UnitOfWork;
use stayhub_core::lifecycle::ensure_can_modify;
use stayhub_core::validation::{validate_amount, validate_optional_text, validate_reason, validate_uuid};
use stayhub_core::{
    Actor, Booking, BookingModification, Capability, CoreError, ModificationStatus, Money,
    RoomBooking, StayRange, ValidationError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ModificationRequest {
    /// The stay to change; the booking's first stay when absent.
    #[serde(default)]
    pub room_booking_id: Option<String>,
    pub new_check_in_date: Option<NaiveDate>,
    pub new_check_out_date: Option<NaiveDate>,
    pub new_price_per_night: Option<Money>,
    pub reason: String,
}

impl ModificationRequest {
    fn is_empty(&self) -> bool {
        self.new_check_in_date.is_none()
            && self.new_check_out_date.is_none()
            && self.new_price_per_night.is_none()
    }
}

/// The range a stay would have after `m`.
fn proposed_range(rb: &RoomBooking, m: &BookingModification) -> Result<StayRange, ValidationError> {
    StayRange::new(
        m.new_check_in_date.unwrap_or(rb.check_in_date),
        m.new_check_out_date.unwrap_or(rb.check_out_date),
    )
}

#[derive(Debug, Clone)]
pub struct ModificationManager {
    db: Database,
}

impl ModificationManager {
    pub fn new(db: Database) -> Self {
        ModificationManager { db }
    }

    pub async fn request(
        &self,
        actor: &Actor,
        booking_id: &str,
        req: ModificationRequest,
    ) -> ServiceResult<BookingModification> {
        actor.require(Capability::FrontDesk)?;
        validate_uuid("booking_id", booking_id)?;
        if let Some(id) = &req.room_booking_id {
            validate_uuid("room_booking_id", id)?;
        }
        if req.is_empty() {
            return Err(ValidationError::required("new_check_in_date, new_check_out_date or new_price_per_night").into());
        }
        if let Some(price) = req.new_price_per_night {
            validate_amount("new_price_per_night", price)?;
        }
        let reason = validate_reason("reason", &req.reason)?;

        self.db
            .bounded("request_modification", async {
                let mut uow = self.db.begin().await?;
                let booking = open_booking(&mut uow, booking_id).await?;
                ensure_can_modify(&booking)?;

                let stays = room_booking::fetch_for_booking(uow.conn(), booking_id).await?;
                let target = match req.room_booking_id.as_deref() {
                    Some(id) => stays.iter().find(|rb| rb.id == id),
                    None => stays.first(),
                }
                .ok_or_else(|| {
                    CoreError::not_found("RoomBooking", req.room_booking_id.as_deref().unwrap_or(booking_id))
                })?;

                let record = BookingModification {
                    id: new_id(),
                    booking_id: booking.id.clone(),
                    room_booking_id: target.id.clone(),
                    requested_by: actor.id.clone(),
                    new_check_in_date: req.new_check_in_date,
                    new_check_out_date: req.new_check_out_date,
                    new_price_per_night: req.new_price_per_night,
                    reason,
                    status: ModificationStatus::Pending,
                    reviewed_by: None,
                    review_note: None,
                    created_at: now(),
                    reviewed_at: None,
                };
                proposed_range(target, &record)?;
                modification::insert(uow.conn(), &record).await?;

                audit::append(
                    uow.conn(),
                    actor,
                    AuditEvent::new("modification.request", "booking", booking_id).after(snapshot(&record)?),
                )
                .await?;
                uow.commit().await?;

                info!(booking_id = %booking_id, modification_id = %record.id, "Modification requested");
                Ok(record)
            })
            .await
    }

    /// Applies the requested dates and rate and re-reconciles the booking
    /// total.
    pub async fn approve(
        &self,
        actor: &Actor,
        modification_id: &str,
        note: Option<&str>,
    ) -> ServiceResult<BookingModification> {
        actor.require(Capability::ReviewModification)?;
        validate_uuid("modification_id", modification_id)?;
        let note = validate_optional_text("review_note", note)?;
        let booking_id = self.owning_booking(modification_id).await?;

        self.db
            .bounded("approve_modification", async {
                let mut uow = self.db.begin().await?;
                let (mut booking, mut record) =
                    open_pending(&mut uow, &booking_id, modification_id, "approve modification").await?;
                ensure_can_modify(&booking)?;

                let mut rb = room_booking::fetch(uow.conn(), &record.room_booking_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("RoomBooking", &record.room_booking_id))?;
                let range = proposed_range(&rb, &record)?;
                if let Some(room_id) = rb.inventory_id.as_deref() {
                    let assigned = room::fetch(uow.conn(), room_id)
                        .await?
                        .ok_or_else(|| CoreError::not_found("Room", room_id))?;
                    let stays = room_booking::fetch_for_booking(uow.conn(), &booking.id).await?;
                    availability::ensure_no_sibling(&stays, &rb.id, &assigned, &range, &booking.booking_reference)?;
                    availability::ensure_available(uow.conn(), &assigned, &range, &booking.id).await?;
                }

                let before = serde_json::json!({
                    "booking": snapshot(&booking)?,
                    "room_booking": snapshot(&rb)?,
                });

                rb.check_in_date = range.check_in();
                rb.check_out_date = range.check_out();
                rb.nights = range.nights();
                if let Some(price) = record.new_price_per_night {
                    rb.rate.price_per_night = price;
                }
                rb.rate.validate(rb.nights)?;
                rb.final_amount = rb.rate.final_amount(rb.nights);
                rb.updated_at = now();
                room_booking::save_stay(uow.conn(), &rb).await?;
                uow.checkpoint("modification.stay_updated")?;

                let stays = room_booking::fetch_for_booking(uow.conn(), &booking.id).await?;
                booking.total_amount = stays.iter().map(|s| s.final_amount).sum();
                booking.updated_at = now();
                booking::save(uow.conn(), &booking).await?;

                record.status = ModificationStatus::Approved;
                record.reviewed_by = Some(actor.id.clone());
                record.review_note = note;
                record.reviewed_at = Some(now());
                modification::save_review(uow.conn(), &record).await?;

                audit::append(
                    uow.conn(),
                    actor,
                    AuditEvent::new("modification.approve", "booking", &booking.id)
                        .before(before)
                        .after(serde_json::json!({
                            "booking": snapshot(&booking)?,
                            "room_booking": snapshot(&rb)?,
                            "modification": snapshot(&record)?,
                        })),
                )
                .await?;
                uow.commit().await?;

                info!(
                    booking_id = %booking.id,
                    modification_id = %modification_id,
                    total = %booking.total_amount,
                    "Modification approved"
                );
                Ok(record)
            })
            .await
    }

    pub async fn reject(
        &self,
        actor: &Actor,
        modification_id: &str,
        reason: &str,
    ) -> ServiceResult<BookingModification> {
        actor.require(Capability::ReviewModification)?;
        validate_uuid("modification_id", modification_id)?;
        let reason = validate_reason("reason", reason)?;
        let booking_id = self.owning_booking(modification_id).await?;

        self.db
            .bounded("reject_modification", async {
                let mut uow = self.db.begin().await?;
                let (_, mut record) =
                    open_pending(&mut uow, &booking_id, modification_id, "reject modification").await?;
                let before = snapshot(&record)?;

                record.status = ModificationStatus::Rejected;
                record.reviewed_by = Some(actor.id.clone());
                record.review_note = Some(reason);
                record.reviewed_at = Some(now());
                modification::save_review(uow.conn(), &record).await?;

                audit::append(
                    uow.conn(),
                    actor,
                    AuditEvent::new("modification.reject", "booking", &booking_id)
                        .before(before)
                        .after(snapshot(&record)?),
                )
                .await?;
                uow.commit().await?;
                Ok(record)
            })
            .await
    }

    pub async fn for_booking(&self, booking_id: &str) -> DbResult<Vec<BookingModification>> {
        modification::list_for_booking(self.db.pool(), booking_id).await
    }

    async fn owning_booking(&self, modification_id: &str) -> ServiceResult<String> {
        modification::fetch(self.db.pool(), modification_id)
            .await?
            .map(|m| m.booking_id)
            .ok_or_else(|| CoreError::not_found("BookingModification", modification_id).into())
    }
}

/// Locks the booking, then re-reads the modification, which must still be
/// pending.
async fn open_pending(
    uow: &mut UnitOfWork,
    booking_id: &str,
    modification_id: &str,
    operation: &'static str,
) -> ServiceResult<(Booking, BookingModification)> {
    let booking = open_booking(uow, booking_id).await?;
    let record = modification::fetch(uow.conn(), modification_id)
        .await?
        .ok_or_else(|| CoreError::not_found("BookingModification", modification_id))?;
    if record.status != ModificationStatus::Pending {
        return Err(CoreError::invalid_state("BookingModification", modification_id, record.status, operation).into());
    }
    Ok((booking, record))
}

// =============================================================================
// Unit Tests
// =============================================================================
