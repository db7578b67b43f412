//! # Invoice Aggregation
//!
//! Check-out does not add up the folio itself; it asks an
//! [`InvoiceAggregator`] for the totals and stores what comes back.
//!
//! ```text
//! room_bookings (one line each: nights × rate + fees + tax − discount)
//!      +
//! booking_charges (one line each)
//!      =
//! subtotal  ──► bookings.total_amount = bookings.final_amount
//! ```

use std::future::Future;

use serde::Serialize;
use sqlx::SqliteConnection;

use crate::error::{DbError, DbResult};
use crate::repository::{booking, charge, room_booking};
use stayhub_core::{Booking, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceItemKind {
    Room,
    Charge,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceItem {
    pub kind: InvoiceItemKind,
    /// Room booking or charge id.
    pub reference_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub booking: Booking,
    pub nights: i64,
    pub invoice_items: Vec<InvoiceItem>,
    pub subtotal: Money,
}

/// Computes the folio of a booking.
///
/// Runs on the caller's connection so that check-out sees the charge it has
/// just inserted in the same transaction.
pub trait InvoiceAggregator: Send + Sync {
    fn aggregate_charges_for_booking(
        &self,
        conn: &mut SqliteConnection,
        booking_id: &str,
    ) -> impl Future<Output = DbResult<Invoice>> + Send;
}

/// Sums room booking amounts and extra charges straight from the tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlInvoiceAggregator;

impl InvoiceAggregator for SqlInvoiceAggregator {
    async fn aggregate_charges_for_booking(
        &self,
        conn: &mut SqliteConnection,
        booking_id: &str,
    ) -> DbResult<Invoice> {
        let booking = booking::fetch(&mut *conn, booking_id)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", booking_id))?;
        let stays = room_booking::fetch_for_booking(&mut *conn, booking_id).await?;
        let charges = charge::list_for_booking(&mut *conn, booking_id).await?;

        let mut items = Vec::with_capacity(stays.len() + charges.len());
        for rb in &stays {
            let label = rb.assigned_room_label.as_deref().unwrap_or("unassigned");
            items.push(InvoiceItem {
                kind: InvoiceItemKind::Room,
                reference_id: rb.id.clone(),
                description: format!(
                    "Room {} ({} to {})",
                    label, rb.check_in_date, rb.check_out_date
                ),
                quantity: rb.nights,
                unit_price: rb.rate.price_per_night,
                amount: rb.final_amount,
            });
        }
        for c in charges {
            items.push(InvoiceItem {
                kind: InvoiceItemKind::Charge,
                reference_id: c.id,
                description: c.description,
                quantity: 1,
                unit_price: c.amount,
                amount: c.amount,
            });
        }

        Ok(Invoice {
            booking,
            nights: stays.iter().map(|rb| rb.nights).sum(),
            subtotal: items.iter().map(|i| i.amount).sum(),
            invoice_items: items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{date, Fixture, NIGHTLY};
    use stayhub_core::{BookingStatus, PaymentStatus};

    #[tokio::test]
    async fn test_rooms_and_charges_are_summed() {
        let fx = Fixture::new().await;
        let b = fx
            .open_booking(date(6, 1), date(6, 4), BookingStatus::CheckedIn, PaymentStatus::Paid)
            .await;

        let mut uow = fx.db.begin().await.unwrap();
        charge::insert(uow.conn(), &b, "Minibar", Money::from_minor(2_500), "desk-1")
            .await
            .unwrap();
        let invoice = SqlInvoiceAggregator
            .aggregate_charges_for_booking(uow.conn(), &b)
            .await
            .unwrap();

        assert_eq!(invoice.nights, 3);
        assert_eq!(invoice.invoice_items.len(), 2);
        assert_eq!(invoice.invoice_items[0].kind, InvoiceItemKind::Room);
        assert_eq!(invoice.invoice_items[0].quantity, 3);
        assert_eq!(invoice.subtotal.minor(), 3 * NIGHTLY + 2_500);
    }

    #[tokio::test]
    async fn test_missing_booking() {
        let fx = Fixture::new().await;
        let mut conn = fx.db.pool().acquire().await.unwrap();
        let err = SqlInvoiceAggregator
            .aggregate_charges_for_booking(&mut conn, "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
