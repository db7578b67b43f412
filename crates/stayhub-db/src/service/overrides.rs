//! # Override Manager
//!
//! Admin-only amendments to the billable amount of a finished stay.
//!
//! ## Round Trip
//! ```text
//! Booking #42 checked_out, final_amount = 500000
//!
//! apply_override(450000, "goodwill discount")
//!     admin_overrides: original 500000, overridden 450000, difference -50000, applied
//!     bookings:        final_amount = total_amount = 450000
//!
//! reverse_override("mistake")
//!     admin_overrides: status reversed
//!     bookings:        final_amount = total_amount = 500000   (status unchanged)
//!
//! reverse_override again → InvalidState
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::pool::Database;
use crate::repository::audit::{self, snapshot, AuditEvent};
use crate::repository::{booking, new_id, now, overrides};
use crate::service::assignment::open_booking;
use crate::service::error::ServiceResult;
use crate::unit_of_work::UnitOfWork;
use stayhub_core::lifecycle::ensure_can_override;
use stayhub_core::validation::{validate_amount, validate_optional_text, validate_reason, validate_uuid};
use stayhub_core::{
    Actor, AdminOverride, Booking, Capability, CheckoutConfirmation, CoreError, Money,
    OverrideStatus, OverrideType,
};

#[derive(Debug, Clone, Deserialize)]
pub struct OverrideRequest {
    pub booking_id: String,
    pub final_amount: Money,
    pub reason: String,
    #[serde(default)]
    pub override_type: OverrideType,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverrideOutcome {
    pub override_id: String,
    pub booking_id: String,
    pub original_amount: Money,
    pub new_amount: Money,
    pub difference: Money,
}

impl From<&AdminOverride> for OverrideOutcome {
    fn from(o: &AdminOverride) -> Self {
        OverrideOutcome {
            override_id: o.id.clone(),
            booking_id: o.booking_id.clone(),
            original_amount: o.original_final_amount,
            new_amount: o.overridden_final_amount,
            difference: o.difference_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReversalOutcome {
    pub override_id: String,
    pub booking_id: String,
    /// The amount the booking is billed at again.
    pub original_amount: Money,
}

#[derive(Debug, Clone)]
pub struct OverrideManager {
    db: Database,
}

impl OverrideManager {
    pub fn new(db: Database) -> Self {
        OverrideManager { db }
    }

    pub async fn apply_override(&self, actor: &Actor, req: OverrideRequest) -> ServiceResult<OverrideOutcome> {
        actor.require(Capability::RateOverride)?;
        validate_uuid("booking_id", &req.booking_id)?;
        validate_amount("final_amount", req.final_amount)?;
        let reason = validate_reason("reason", &req.reason)?;

        self.db
            .bounded("apply_override", async {
                let mut uow = self.db.begin().await?;
                let booking = open_booking(&mut uow, &req.booking_id).await?;

                let applied =
                    apply_override_in(&mut uow, actor, booking, req.final_amount, &reason, req.override_type)
                        .await?;

                uow.commit().await?;
                Ok(OverrideOutcome::from(&applied))
            })
            .await
    }

    /// Records that an admin approved the computed amount. Nothing is billed
    /// differently.
    pub async fn confirm_rate(
        &self,
        actor: &Actor,
        booking_id: &str,
        final_amount: Money,
        note: Option<&str>,
    ) -> ServiceResult<CheckoutConfirmation> {
        actor.require(Capability::RateOverride)?;
        validate_uuid("booking_id", booking_id)?;
        validate_amount("final_amount", final_amount)?;
        let note = validate_optional_text("confirmation_note", note)?;

        self.db
            .bounded("confirm_rate", async {
                let mut uow = self.db.begin().await?;
                let booking = open_booking(&mut uow, booking_id).await?;

                let confirmation =
                    confirm_rate_in(&mut uow, actor, booking, final_amount, note).await?;

                uow.commit().await?;
                Ok(confirmation)
            })
            .await
    }

    /// Restores the amount an override replaced. Booking status is left as is.
    pub async fn reverse_override(
        &self,
        actor: &Actor,
        override_id: &str,
        reversal_reason: &str,
    ) -> ServiceResult<ReversalOutcome> {
        actor.require(Capability::RateOverride)?;
        validate_uuid("override_id", override_id)?;
        let reason = validate_reason("reversal_reason", reversal_reason)?;

        // the booking id is only known once the override is loaded
        let found = overrides::fetch(self.db.pool(), override_id)
            .await?
            .ok_or_else(|| CoreError::not_found("AdminOverride", override_id))?;

        self.db
            .bounded("reverse_override", async {
                let mut uow = self.db.begin().await?;
                let mut booking = open_booking(&mut uow, &found.booking_id).await?;

                // re-read under the write lock
                let mut record = overrides::fetch(uow.conn(), override_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("AdminOverride", override_id))?;
                if record.status == OverrideStatus::Reversed {
                    return Err(CoreError::invalid_state(
                        "AdminOverride",
                        override_id,
                        record.status,
                        "reverse override",
                    )
                    .into());
                }

                let before = snapshot(&booking)?;
                let ts = now();
                record.status = OverrideStatus::Reversed;
                record.reversed_by = Some(actor.id.clone());
                record.reversal_reason = Some(reason.clone());
                record.reversed_at = Some(ts);
                overrides::save_reversal(uow.conn(), &record).await?;
                uow.checkpoint("reverse.recorded")?;

                booking.final_amount = Some(record.original_final_amount);
                booking.total_amount = record.original_final_amount;
                booking.updated_at = ts;
                booking::save(uow.conn(), &booking).await?;

                audit::append(
                    uow.conn(),
                    actor,
                    AuditEvent::new("override.reverse", "booking", &booking.id)
                        .before(before)
                        .after(serde_json::json!({
                            "booking": snapshot(&booking)?,
                            "override": snapshot(&record)?,
                        })),
                )
                .await?;

                uow.commit().await?;
                info!(
                    override_id = %override_id,
                    booking_id = %booking.id,
                    restored = %record.original_final_amount,
                    "Override reversed"
                );

                Ok(ReversalOutcome {
                    override_id: record.id,
                    booking_id: booking.id,
                    original_amount: record.original_final_amount,
                })
            })
            .await
    }
}

/// Applies an override inside an open unit of work, audit row included.
pub(crate) async fn apply_override_in(
    uow: &mut UnitOfWork,
    actor: &Actor,
    mut booking: Booking,
    final_amount: Money,
    reason: &str,
    override_type: OverrideType,
) -> ServiceResult<AdminOverride> {
    ensure_can_override(&booking)?;

    let before = snapshot(&booking)?;
    let original = booking.billable_amount();
    let ts = now();
    let record = AdminOverride {
        id: new_id(),
        booking_id: booking.id.clone(),
        admin_id: actor.id.clone(),
        override_type,
        original_final_amount: original,
        overridden_final_amount: final_amount,
        difference_amount: final_amount - original,
        reason: reason.to_string(),
        status: OverrideStatus::Applied,
        reversed_by: None,
        reversal_reason: None,
        created_at: ts,
        reversed_at: None,
    };
    overrides::insert(uow.conn(), &record).await?;
    uow.checkpoint("override.recorded")?;

    booking.final_amount = Some(final_amount);
    booking.total_amount = final_amount;
    booking.updated_at = ts;
    booking::save(uow.conn(), &booking).await?;

    audit::append(
        uow.conn(),
        actor,
        AuditEvent::new("override.apply", "booking", &booking.id)
            .before(before)
            .after(serde_json::json!({
                "booking": snapshot(&booking)?,
                "override": snapshot(&record)?,
            })),
    )
    .await?;

    info!(
        booking_id = %booking.id,
        original = %original,
        overridden = %final_amount,
        "Override applied"
    );
    Ok(record)
}

/// Records a rate confirmation inside an open unit of work, audit row included.
pub(crate) async fn confirm_rate_in(
    uow: &mut UnitOfWork,
    actor: &Actor,
    mut booking: Booking,
    confirmed_amount: Money,
    note: Option<String>,
) -> ServiceResult<CheckoutConfirmation> {
    ensure_can_override(&booking)?;

    let before = snapshot(&booking)?;
    let ts = now();
    let confirmation = CheckoutConfirmation {
        id: new_id(),
        booking_id: booking.id.clone(),
        admin_id: actor.id.clone(),
        confirmed_amount,
        note,
        created_at: ts,
    };
    overrides::insert_confirmation(uow.conn(), &confirmation).await?;

    booking.rate_confirmed_by = Some(actor.id.clone());
    booking.rate_confirmed_at = Some(ts);
    booking.updated_at = ts;
    booking::save(uow.conn(), &booking).await?;

    audit::append(
        uow.conn(),
        actor,
        AuditEvent::new("override.confirm_rate", "booking", &booking.id)
            .before(before)
            .after(snapshot(&confirmation)?),
    )
    .await?;

    info!(booking_id = %booking.id, amount = %confirmed_amount, "Rate confirmed");
    Ok(confirmation)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::service::error::ServiceError;
    use crate::service::testing::{date, Fixture};
    use stayhub_core::{BookingStatus, ErrorKind, PaymentStatus};

    /// Booking #42: checked out, billed at 500000.
    async fn booking_42(fx: &Fixture) -> String {
        let id = fx
            .open_booking(date(6, 1), date(6, 6), BookingStatus::CheckedOut, PaymentStatus::Paid)
            .await;
        let mut uow = fx.db.begin().await.unwrap();
        let mut b = booking::fetch(uow.conn(), &id).await.unwrap().unwrap();
        b.final_amount = Some(Money::from_minor(500_000));
        b.total_amount = Money::from_minor(500_000);
        booking::save(uow.conn(), &b).await.unwrap();
        uow.commit().await.unwrap();
        id
    }

    fn goodwill(booking_id: &str) -> OverrideRequest {
        OverrideRequest {
            booking_id: booking_id.to_string(),
            final_amount: Money::from_minor(450_000),
            reason: "goodwill discount".to_string(),
            override_type: OverrideType::Discount,
        }
    }

    #[tokio::test]
    async fn test_apply_then_reverse_restores_amount() {
        let fx = Fixture::new().await;
        let id = booking_42(&fx).await;
        let mgr = OverrideManager::new(fx.db.clone());

        let applied = mgr.apply_override(&fx.admin, goodwill(&id)).await.unwrap();
        assert_eq!(applied.original_amount.minor(), 500_000);
        assert_eq!(applied.new_amount.minor(), 450_000);
        assert_eq!(applied.difference.minor(), -50_000);

        let b = fx.booking(&id).await;
        assert_eq!(b.final_amount, Some(Money::from_minor(450_000)));
        assert_eq!(b.total_amount, Money::from_minor(450_000));

        let reversed = mgr
            .reverse_override(&fx.admin, &applied.override_id, "mistake")
            .await
            .unwrap();
        assert_eq!(reversed.original_amount.minor(), 500_000);

        let b = fx.booking(&id).await;
        assert_eq!(b.final_amount, Some(Money::from_minor(500_000)));
        assert_eq!(b.total_amount, Money::from_minor(500_000));
        assert_eq!(b.status, BookingStatus::CheckedOut);

        let stored = fx.db.overrides().get_by_id(&applied.override_id).await.unwrap().unwrap();
        assert_eq!(stored.status, OverrideStatus::Reversed);
        assert_eq!(stored.reversal_reason.as_deref(), Some("mistake"));
        assert_eq!(
            stored.difference_amount,
            stored.overridden_final_amount - stored.original_final_amount
        );

        assert_eq!(fx.audit_actions(&id).await, vec!["override.apply", "override.reverse"]);
    }

    #[tokio::test]
    async fn test_double_reversal_is_rejected() {
        let fx = Fixture::new().await;
        let id = booking_42(&fx).await;
        let mgr = OverrideManager::new(fx.db.clone());
        let applied = mgr.apply_override(&fx.admin, goodwill(&id)).await.unwrap();
        mgr.reverse_override(&fx.admin, &applied.override_id, "mistake")
            .await
            .unwrap();

        let err = mgr
            .reverse_override(&fx.admin, &applied.override_id, "again")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(fx.booking(&id).await.final_amount, Some(Money::from_minor(500_000)));
    }

    #[tokio::test]
    async fn test_override_preconditions() {
        let fx = Fixture::new().await;
        let id = booking_42(&fx).await;
        let mgr = OverrideManager::new(fx.db.clone());

        let err = mgr.apply_override(&fx.desk, goodwill(&id)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let mut blank = goodwill(&id);
        blank.reason = "   ".to_string();
        let err = mgr.apply_override(&fx.admin, blank).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut negative = goodwill(&id);
        negative.final_amount = Money::from_minor(-1);
        let err = mgr.apply_override(&fx.admin, negative).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let staying = fx
            .open_booking(date(6, 1), date(6, 3), BookingStatus::CheckedIn, PaymentStatus::Paid)
            .await;
        let err = mgr.apply_override(&fx.admin, goodwill(&staying)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let missing = uuid::Uuid::new_v4().to_string();
        let err = mgr
            .reverse_override(&fx.admin, &missing, "mistake")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert!(fx.audit_actions(&id).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_override_leaves_no_trace() {
        let fx = Fixture::new().await;
        let id = booking_42(&fx).await;
        fx.db.fail_at("override.recorded");

        let err = OverrideManager::new(fx.db.clone())
            .apply_override(&fx.admin, goodwill(&id))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Db(DbError::Injected(_))));

        let page = fx
            .db
            .overrides()
            .list(&Default::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(fx.booking(&id).await.final_amount, Some(Money::from_minor(500_000)));
    }

    #[tokio::test]
    async fn test_confirm_rate_keeps_amount() {
        let fx = Fixture::new().await;
        let id = booking_42(&fx).await;

        let confirmation = OverrideManager::new(fx.db.clone())
            .confirm_rate(&fx.admin, &id, Money::from_minor(500_000), Some("checked folio"))
            .await
            .unwrap();
        assert_eq!(confirmation.confirmed_amount.minor(), 500_000);

        let b = fx.booking(&id).await;
        assert_eq!(b.final_amount, Some(Money::from_minor(500_000)));
        assert_eq!(b.rate_confirmed_by.as_deref(), Some("admin-1"));
        assert!(b.rate_confirmed_at.is_some());
        assert_eq!(fx.audit_actions(&id).await, vec!["override.confirm_rate"]);
    }
}
