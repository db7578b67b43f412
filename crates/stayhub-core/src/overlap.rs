//! # Date Overlap
//!
//! Stay ranges and the double-booking predicate.
//!
//! ## Half-Open Ranges
//! ```text
//! A stay occupies [check_in, check_out): the guest sleeps the nights of
//! check_in .. check_out - 1 and leaves on the morning of check_out.
//!
//!   BK-X   [Jun 01 ─────────────── Jun 05)
//!   BK-Y              [Jun 03 ────────── Jun 06)     overlaps
//!   BK-Z                           [Jun 05 ── Jun 07) touches, no overlap
//!
//! Overlap:  a.check_in < b.check_out  AND  a.check_out > b.check_in
//! ```
//!
//! The same predicate is used by the SQL overlap query in `stayhub-db` and by
//! the `room_bookings_no_overlap` trigger, so the in-memory checks here and
//! the storage backstop always agree.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::BookingStatus;
use crate::MAX_NIGHTS;

// =============================================================================
// Stay Range
// =============================================================================

/// A validated `[check_in, check_out)` date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayRange {
    /// Creates a range, rejecting empty, inverted or absurdly long stays.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, ValidationError> {
        if check_out <= check_in {
            return Err(ValidationError::InvalidDateRange {
                check_in: check_in.to_string(),
                check_out: check_out.to_string(),
            });
        }
        let nights = (check_out - check_in).num_days();
        if nights > MAX_NIGHTS {
            return Err(ValidationError::OutOfRange {
                field: "nights".to_string(),
                min: 1,
                max: MAX_NIGHTS,
            });
        }
        Ok(StayRange {
            check_in,
            check_out,
        })
    }

    #[inline]
    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    #[inline]
    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights, always at least 1.
    #[inline]
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Half-open overlap. Touching ranges do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }

    /// Whether `date` is one of the nights of this stay.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }
}

// =============================================================================
// Held Stays
// =============================================================================

/// A stay already recorded against a room, as loaded for an overlap check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldStay {
    pub booking_id: String,
    pub booking_reference: String,
    pub status: BookingStatus,
    pub range: StayRange,
}

/// Returns the first held stay that blocks `candidate` for `booking_id`.
///
/// Stays of the same booking are ignored so that re-assigning or modifying a
/// booking never conflicts with itself. Only stays whose booking status holds
/// a room count.
pub fn find_conflict<'a>(
    candidate: &StayRange,
    booking_id: &str,
    held: &'a [HeldStay],
) -> Option<&'a HeldStay> {
    held.iter()
        .find(|stay| stay.status.holds_room() && overlaps_other(stay, candidate, booking_id))
}

/// Returns the first stay of another booking overlapping `candidate`,
/// whatever its status. Auto-assignment uses this to also keep clear of
/// pending bookings.
pub fn find_overlap<'a>(
    candidate: &StayRange,
    booking_id: &str,
    held: &'a [HeldStay],
) -> Option<&'a HeldStay> {
    held.iter().find(|stay| overlaps_other(stay, candidate, booking_id))
}

fn overlaps_other(stay: &HeldStay, candidate: &StayRange, booking_id: &str) -> bool {
    stay.booking_id != booking_id && stay.range.overlaps(candidate)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    fn range(a: NaiveDate, b: NaiveDate) -> StayRange {
        StayRange::new(a, b).unwrap()
    }

    fn held(id: &str, status: BookingStatus, r: StayRange) -> HeldStay {
        HeldStay {
            booking_id: id.to_string(),
            booking_reference: format!("BK-{id}"),
            status,
            range: r,
        }
    }

    #[test]
    fn test_rejects_empty_and_inverted() {
        assert!(StayRange::new(d(6, 5), d(6, 5)).is_err());
        assert!(matches!(
            StayRange::new(d(6, 5), d(6, 1)),
            Err(ValidationError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_nights() {
        assert_eq!(range(d(6, 1), d(6, 5)).nights(), 4);
        assert_eq!(range(d(5, 31), d(6, 1)).nights(), 1);
    }

    #[test]
    fn test_overlap_and_touching_boundary() {
        let x = range(d(6, 1), d(6, 5));
        let y = range(d(6, 3), d(6, 6));
        let z = range(d(6, 5), d(6, 7));
        assert!(x.overlaps(&y));
        assert!(y.overlaps(&x));
        assert!(!x.overlaps(&z));
        assert!(!z.overlaps(&x));
    }

    #[test]
    fn test_contained_range_overlaps() {
        let outer = range(d(6, 1), d(6, 10));
        let inner = range(d(6, 3), d(6, 4));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_contains() {
        let r = range(d(6, 1), d(6, 3));
        assert!(r.contains(d(6, 1)));
        assert!(r.contains(d(6, 2)));
        assert!(!r.contains(d(6, 3)));
    }

    #[test]
    fn test_find_conflict_reports_blocking_booking() {
        let stays = vec![held("x", BookingStatus::Confirmed, range(d(6, 1), d(6, 5)))];
        let hit = find_conflict(&range(d(6, 3), d(6, 6)), "y", &stays).unwrap();
        assert_eq!(hit.booking_reference, "BK-x");
        assert!(find_conflict(&range(d(6, 5), d(6, 7)), "z", &stays).is_none());
    }

    #[test]
    fn test_find_conflict_ignores_own_and_inactive() {
        let stays = vec![
            held("self", BookingStatus::CheckedIn, range(d(6, 1), d(6, 5))),
            held("gone", BookingStatus::Cancelled, range(d(6, 1), d(6, 5))),
            held("old", BookingStatus::CheckedOut, range(d(6, 1), d(6, 5))),
            held("maybe", BookingStatus::Pending, range(d(6, 1), d(6, 5))),
        ];
        assert!(find_conflict(&range(d(6, 2), d(6, 4)), "self", &stays).is_none());
    }

    #[test]
    fn test_find_overlap_counts_pending() {
        let stays = vec![
            held("self", BookingStatus::Confirmed, range(d(6, 1), d(6, 5))),
            held("maybe", BookingStatus::Pending, range(d(6, 4), d(6, 8))),
        ];
        let hit = find_overlap(&range(d(6, 2), d(6, 5)), "self", &stays).unwrap();
        assert_eq!(hit.booking_id, "maybe");
        assert!(find_overlap(&range(d(6, 8), d(6, 9)), "self", &stays).is_none());
    }

    mod properties {
        use super::*;
        use chrono::Duration;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        fn stay() -> impl Strategy<Value = StayRange> {
            (0i64..60, 1i64..15).prop_map(|(offset, nights)| {
                let check_in = d(1, 1) + Duration::days(offset);
                range(check_in, check_in + Duration::days(nights))
            })
        }

        fn status() -> impl Strategy<Value = BookingStatus> {
            prop_oneof![
                Just(BookingStatus::Pending),
                Just(BookingStatus::Confirmed),
                Just(BookingStatus::CheckedIn),
                Just(BookingStatus::CheckedOut),
                Just(BookingStatus::Cancelled),
                Just(BookingStatus::Completed),
            ]
        }

        /// The nights a guest sleeps in the room.
        fn nights_of(r: &StayRange) -> BTreeSet<NaiveDate> {
            r.check_in()
                .iter_days()
                .take_while(|night| *night < r.check_out())
                .collect()
        }

        fn shares_a_night(a: &StayRange, b: &StayRange) -> bool {
            !nights_of(a).is_disjoint(&nights_of(b))
        }

        proptest! {
            #[test]
            fn test_overlap_iff_a_night_is_shared(a in stay(), b in stay()) {
                let expected = shares_a_night(&a, &b);
                prop_assert_eq!(a.overlaps(&b), expected);
                prop_assert_eq!(b.overlaps(&a), expected);
            }

            #[test]
            fn test_arriving_on_check_out_day_never_overlaps(a in stay(), nights in 1i64..15) {
                let next = range(a.check_out(), a.check_out() + Duration::days(nights));
                prop_assert!(!a.overlaps(&next));
                prop_assert!(!next.overlaps(&a));
            }

            #[test]
            fn test_find_conflict_agrees_with_night_by_night_check(
                candidate in stay(),
                existing in prop::collection::vec((stay(), status(), any::<bool>()), 0..8),
            ) {
                let stays: Vec<HeldStay> = existing
                    .iter()
                    .enumerate()
                    .map(|(i, (r, status, own))| {
                        let id = if *own { "me".to_string() } else { format!("b{i}") };
                        held(&id, *status, *r)
                    })
                    .collect();

                let expected = stays.iter().any(|s| {
                    s.booking_id != "me"
                        && matches!(s.status, BookingStatus::Confirmed | BookingStatus::CheckedIn)
                        && shares_a_night(&s.range, &candidate)
                });
                let found = find_conflict(&candidate, "me", &stays);
                prop_assert_eq!(found.is_some(), expected);

                if let Some(hit) = found {
                    prop_assert_ne!(hit.booking_id.as_str(), "me");
                    prop_assert!(hit.status.holds_room());
                    prop_assert!(shares_a_night(&hit.range, &candidate));
                }
            }
        }
    }
}
