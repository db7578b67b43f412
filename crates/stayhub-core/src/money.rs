//! # Money Module
//!
//! Provides the `Money` type for every amount on a folio: nightly rates,
//! fees, taxes, discounts, booking totals and admin overrides.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OVERRIDE ROUND TRIP                                                    │
//! │                                                                         │
//! │  final_amount = 500000                                                  │
//! │  apply override  → 450000   difference = -50000                         │
//! │  reverse         → 500000   must match the original EXACTLY             │
//! │                                                                         │
//! │  With floats, 500000.1 - 0.1 may not come back bit-for-bit.            │
//! │  With integer minor units it always does.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stayhub_core::money::Money;
//!
//! let nightly = Money::from_minor(125_000);
//! let room_charge = nightly.multiply_nights(4);
//! assert_eq!(room_charge.minor(), 500_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::rate::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit of the property.
///
/// ## Design Decisions
/// - **i64 (signed)**: override differences and discounts can be negative
/// - **Single field tuple struct**: serializes as a bare integer in JSON
/// - **No float constructor**: amounts enter the system as integers only
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Largest amount accepted from a client (10^15 minor units).
    ///
    /// Any folio built from components at or below this bound stays far
    /// inside `i64`.
    pub const MAX: Money = Money(1_000_000_000_000_000);

    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax on this amount.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, i.e. half-up rounding.
    ///
    /// ## Example
    /// ```rust
    /// use stayhub_core::money::Money;
    /// use stayhub_core::rate::TaxRate;
    ///
    /// let room_charge = Money::from_minor(1000);
    /// let tax = room_charge.calculate_tax(TaxRate::from_bps(825));
    /// assert_eq!(tax.minor(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 so that large folios cannot overflow the intermediate product
        let tax = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_minor(tax as i64)
    }

    /// Multiplies a nightly rate by a number of nights.
    #[inline]
    pub const fn multiply_nights(&self, nights: i64) -> Self {
        Money(self.0 * nights)
    }

    /// `multiply_nights`, or `None` on overflow.
    #[inline]
    pub const fn checked_multiply_nights(&self, nights: i64) -> Option<Self> {
        match self.0.checked_mul(nights) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented rendering (`5000.00`). Currency symbols and grouping are a
/// presentation concern and belong to the admin pages.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl From<i64> for Money {
    fn from(minor: i64) -> Self {
        Money(minor)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1099).to_string(), "10.99");
        assert_eq!(Money::from_minor(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(500_000);
        let b = Money::from_minor(450_000);
        assert_eq!((b - a).minor(), -50_000);
        assert_eq!((a + b).minor(), 950_000);
        assert_eq!((-a).minor(), -500_000);
        let total: Money = vec![a, b].into_iter().sum();
        assert_eq!(total.minor(), 950_000);
    }

    #[test]
    fn test_difference_round_trip_is_exact() {
        let original = Money::from_minor(500_000);
        let overridden = Money::from_minor(450_000);
        let difference = overridden - original;
        assert_eq!(overridden - difference, original);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        let amount = Money::from_minor(1000);
        assert_eq!(amount.calculate_tax(TaxRate::from_bps(1000)).minor(), 100);
        assert_eq!(amount.calculate_tax(TaxRate::from_bps(825)).minor(), 83);
        assert_eq!(amount.calculate_tax(TaxRate::zero()).minor(), 0);
    }

    #[test]
    fn test_multiply_nights() {
        assert_eq!(Money::from_minor(125_000).multiply_nights(4).minor(), 500_000);
        assert_eq!(
            Money::from_minor(125_000).checked_multiply_nights(4),
            Some(Money::from_minor(500_000))
        );
        assert_eq!(Money::from_minor(i64::MAX / 100).checked_multiply_nights(365), None);
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Money::from_minor(42)).unwrap();
        assert_eq!(json, "42");
    }
}
