//! # Rate Breakdown
//!
//! The per-stay charge breakdown carried by every room booking and the
//! arithmetic that keeps `final_amount` reconciled with it.
//!
//! ```text
//! final_amount = price_per_night × nights
//!              + extra_fees
//!              + tax_amount
//!              + service_charge
//!              − discount_amount
//! ```
//!
//! `deposit_amount` is carried alongside but is a payment, not a charge, so it
//! never enters the sum.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax or service rate in basis points (825 = 8.25%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

// =============================================================================
// Rate Breakdown
// =============================================================================

/// Charge components of one room booking, all in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RateBreakdown {
    pub price_per_night: Money,
    pub extra_fees: Money,
    pub tax_amount: Money,
    pub service_charge: Money,
    pub discount_amount: Money,
    pub deposit_amount: Money,
}

impl RateBreakdown {
    /// A breakdown with only a nightly rate.
    pub fn nightly(price_per_night: Money) -> Self {
        RateBreakdown {
            price_per_night,
            ..Default::default()
        }
    }

    /// Fills `tax_amount` and `service_charge` from rates applied to the room
    /// charge plus extra fees.
    ///
    /// ## Example
    /// ```rust
    /// use stayhub_core::money::Money;
    /// use stayhub_core::rate::{RateBreakdown, TaxRate};
    ///
    /// let rate = RateBreakdown::nightly(Money::from_minor(100_000))
    ///     .with_rates(2, TaxRate::from_bps(1000), TaxRate::from_bps(500));
    /// assert_eq!(rate.tax_amount.minor(), 20_000);
    /// assert_eq!(rate.service_charge.minor(), 10_000);
    /// assert_eq!(rate.final_amount(2).minor(), 230_000);
    /// ```
    pub fn with_rates(mut self, nights: i64, tax: TaxRate, service: TaxRate) -> Self {
        let taxable = self.room_charge(nights) + self.extra_fees;
        self.tax_amount = taxable.calculate_tax(tax);
        self.service_charge = taxable.calculate_tax(service);
        self
    }

    /// Nightly rate times nights.
    #[inline]
    pub fn room_charge(&self, nights: i64) -> Money {
        self.price_per_night.multiply_nights(nights)
    }

    /// The reconciled amount for `nights` nights.
    pub fn final_amount(&self, nights: i64) -> Money {
        self.room_charge(nights) + self.extra_fees + self.tax_amount + self.service_charge
            - self.discount_amount
    }

    /// `final_amount`, or `None` if any step overflows.
    pub fn checked_final_amount(&self, nights: i64) -> Option<Money> {
        self.price_per_night
            .checked_multiply_nights(nights)?
            .checked_add(self.extra_fees)?
            .checked_add(self.tax_amount)?
            .checked_add(self.service_charge)?
            .checked_sub(self.discount_amount)
    }

    /// Rejects negative or oversized components and a total above
    /// [`Money::MAX`].
    ///
    /// A discount larger than the rest of the folio is allowed to drive the
    /// final amount to zero but not below.
    pub fn validate(&self, nights: i64) -> Result<(), ValidationError> {
        let fields = [
            ("price_per_night", self.price_per_night),
            ("extra_fees", self.extra_fees),
            ("tax_amount", self.tax_amount),
            ("service_charge", self.service_charge),
            ("discount_amount", self.discount_amount),
            ("deposit_amount", self.deposit_amount),
        ];
        for (field, value) in fields {
            if value.is_negative() {
                return Err(ValidationError::MustNotBeNegative {
                    field: field.to_string(),
                });
            }
            if value > Money::MAX {
                return Err(too_large(field));
            }
        }

        let total = self
            .checked_final_amount(nights)
            .filter(|total| *total <= Money::MAX)
            .ok_or_else(|| too_large("final_amount"))?;
        if total.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "discount_amount".to_string(),
                min: 0,
                max: (total + self.discount_amount).minor(),
            });
        }
        Ok(())
    }
}

fn too_large(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: Money::MAX.minor(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn m(v: i64) -> Money {
        Money::from_minor(v)
    }

    #[test]
    fn test_final_amount_formula() {
        let rate = RateBreakdown {
            price_per_night: m(100_000),
            extra_fees: m(20_000),
            tax_amount: m(32_000),
            service_charge: m(16_000),
            discount_amount: m(8_000),
            deposit_amount: m(50_000),
        };
        // 3 × 100000 + 20000 + 32000 + 16000 − 8000; deposit excluded
        assert_eq!(rate.final_amount(3), m(360_000));
    }

    #[test]
    fn test_validate_rejects_negative_component() {
        let rate = RateBreakdown {
            extra_fees: m(-1),
            ..RateBreakdown::nightly(m(100))
        };
        assert!(matches!(
            rate.validate(1),
            Err(ValidationError::MustNotBeNegative { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_discount_beyond_total() {
        let rate = RateBreakdown {
            discount_amount: m(300),
            ..RateBreakdown::nightly(m(100))
        };
        assert!(rate.validate(2).is_err());
        assert!(rate.validate(3).is_ok());
    }

    #[test]
    fn test_validate_rejects_overflowing_folio() {
        let huge = RateBreakdown::nightly(m(i64::MAX / 100));
        assert!(matches!(
            huge.validate(365),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "price_per_night"
        ));

        // each part in bounds, the stay total is not
        let long_stay = RateBreakdown::nightly(Money::MAX);
        assert!(matches!(
            long_stay.validate(365),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "final_amount"
        ));
        assert_eq!(long_stay.checked_final_amount(i64::MAX), None);
        assert!(long_stay.validate(1).is_ok());
    }

    #[test]
    fn test_with_rates_taxes_fees_too() {
        let rate = RateBreakdown {
            extra_fees: m(1_000),
            ..RateBreakdown::nightly(m(9_000))
        }
        .with_rates(1, TaxRate::from_bps(1000), TaxRate::zero());
        assert_eq!(rate.tax_amount, m(1_000));
        assert_eq!(rate.service_charge, m(0));
    }
}
