//! Shared fixtures for manager tests.

use chrono::{NaiveDate, Utc};

use crate::pool::{Database, DbConfig};
use crate::repository::{booking, new_id, room, room_booking};
use stayhub_core::{
    Actor, Booking, BookingStatus, Money, PaymentStatus, RateBreakdown, Role, Room, RoomBooking,
    RoomStatus, RoomType,
};

/// A date in June 2024.
pub(crate) fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

pub(crate) const NIGHTLY: i64 = 100_000;

pub(crate) struct Fixture {
    pub db: Database,
    pub room_type: RoomType,
    pub admin: Actor,
    pub desk: Actor,
    pub accountant: Actor,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_db(Database::new(DbConfig::in_memory()).await.unwrap()).await
    }

    pub async fn with_db(db: Database) -> Self {
        let room_type = db
            .rooms()
            .create_type("Deluxe", Money::from_minor(NIGHTLY), 2)
            .await
            .unwrap();
        Fixture {
            db,
            room_type,
            admin: Actor::new("admin-1", Role::Admin),
            desk: Actor::new("desk-1", Role::Receptionist),
            accountant: Actor::new("acct-1", Role::Accountant),
        }
    }

    pub async fn room(&self, unit_number: &str) -> Room {
        let floor = unit_number[..1].parse().unwrap_or(1);
        self.db
            .rooms()
            .create_room(&self.room_type.id, unit_number, floor, RoomStatus::Available)
            .await
            .unwrap()
    }

    pub async fn set_room_status(&self, room: &Room, status: RoomStatus) {
        let mut uow = self.db.begin().await.unwrap();
        room::set_status(uow.conn(), &room.id, status).await.unwrap();
        uow.commit().await.unwrap();
    }

    pub async fn room_status(&self, room: &Room) -> RoomStatus {
        self.db.rooms().get_by_id(&room.id).await.unwrap().unwrap().status
    }

    /// Inserts a booking in `status` with one room booking, optionally on `room`.
    pub async fn booking_with(
        &self,
        room: Option<&Room>,
        check_in: NaiveDate,
        check_out: NaiveDate,
        status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> String {
        let now = Utc::now();
        let id = new_id();
        let nights = (check_out - check_in).num_days();
        let rate = RateBreakdown::nightly(Money::from_minor(NIGHTLY));
        let final_amount = rate.final_amount(nights);

        let b = Booking {
            id: id.clone(),
            booking_reference: format!("BK-TEST-{}", &id[..6]),
            guest_id: None,
            guest_name: "Test Guest".to_string(),
            status,
            payment_status,
            total_amount: final_amount,
            final_amount: None,
            source: "walk_in".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
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
        let rb = RoomBooking {
            id: new_id(),
            booking_id: id.clone(),
            room_type_id: self.room_type.id.clone(),
            inventory_id: room.map(|r| r.id.clone()),
            assigned_room_label: room.map(|r| r.unit_number.clone()),
            check_in_date: check_in,
            check_out_date: check_out,
            nights,
            adults: 2,
            children: 0,
            rate,
            final_amount,
            created_at: now,
            updated_at: now,
        };

        let mut uow = self.db.begin().await.unwrap();
        booking::insert(uow.conn(), &b).await.unwrap();
        room_booking::insert(uow.conn(), &rb).await.unwrap();
        uow.commit().await.unwrap();
        id
    }

    /// A booking holding `room` over the range, with no assignment row.
    pub async fn held_booking(
        &self,
        room: &Room,
        check_in: NaiveDate,
        check_out: NaiveDate,
        status: BookingStatus,
    ) -> String {
        self.booking_with(Some(room), check_in, check_out, status, PaymentStatus::Pending)
            .await
    }

    /// An unassigned booking.
    pub async fn open_booking(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
        status: BookingStatus,
        payment_status: PaymentStatus,
    ) -> String {
        self.booking_with(None, check_in, check_out, status, payment_status)
            .await
    }

    pub async fn booking(&self, id: &str) -> Booking {
        self.db.bookings().get_by_id(id).await.unwrap().unwrap()
    }

    /// Audit actions recorded for `entity_id`, oldest first.
    pub async fn audit_actions(&self, entity_id: &str) -> Vec<String> {
        self.db
            .audit_logs()
            .for_entity(entity_id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect()
    }
}
