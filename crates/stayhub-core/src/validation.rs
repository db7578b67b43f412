//! # Validation Module
//!
//! Input validation run before a unit of work is opened.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (apps/api)                                   │
//! │  └── Type validation (deserialization, path ids)                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Mandatory reasons, date ranges, occupants                         │
//! │  └── Amounts, pagination                                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Managers inside the transaction                              │
//! │  └── Status preconditions, overlap check                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: SQLite                                                       │
//! │  └── CHECK / UNIQUE / FK constraints, overlap trigger                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_OCCUPANTS, MAX_TEXT_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a mandatory free-text justification and returns it trimmed.
///
/// Overrides, reversals, cancellations and modification requests all carry
/// one; whitespace-only input counts as missing.
///
/// ## Example
/// ```rust
/// use stayhub_core::validation::validate_reason;
///
/// assert_eq!(validate_reason("reason", "  goodwill discount ").unwrap(), "goodwill discount");
/// assert!(validate_reason("reason", "   ").is_err());
/// ```
pub fn validate_reason(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }
    Ok(value.to_string())
}

/// Validates optional free text (notes), normalizing blank input to `None`.
pub fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => validate_reason(field, v).map(Some),
    }
}

/// Validates a UUID primary key.
///
/// ## Example
/// ```rust
/// use stayhub_core::validation::validate_uuid;
///
/// assert!(validate_uuid("booking_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("booking_id", "42").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates occupancy of one room booking.
pub fn validate_occupants(adults: i64, children: i64) -> ValidationResult<()> {
    if !(1..=MAX_OCCUPANTS).contains(&adults) {
        return Err(ValidationError::OutOfRange {
            field: "adults".to_string(),
            min: 1,
            max: MAX_OCCUPANTS,
        });
    }
    if !(0..=MAX_OCCUPANTS).contains(&children) {
        return Err(ValidationError::OutOfRange {
            field: "children".to_string(),
            min: 0,
            max: MAX_OCCUPANTS,
        });
    }
    Ok(())
}

/// Validates an amount that may be zero but never negative or above
/// [`Money::MAX`].
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    if amount > Money::MAX {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: Money::MAX.minor(),
        });
    }
    Ok(())
}

/// Normalizes pagination parameters.
///
/// `page` is 1-based. Returns `(limit, offset)`.
pub fn validate_page(
    page: Option<i64>,
    per_page: Option<i64>,
    default_per_page: i64,
    max_per_page: i64,
) -> ValidationResult<(i64, i64)> {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }
    let per_page = per_page.unwrap_or(default_per_page);
    if !(1..=max_per_page).contains(&per_page) {
        return Err(ValidationError::OutOfRange {
            field: "per_page".to_string(),
            min: 1,
            max: max_per_page,
        });
    }
    Ok((per_page, (page - 1) * per_page))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reason() {
        assert_eq!(validate_reason("reason", "mistake").unwrap(), "mistake");
        assert!(validate_reason("reason", "").is_err());
        assert!(validate_reason("reason", "\t\n").is_err());
        assert!(matches!(
            validate_reason("reason", &"x".repeat(MAX_TEXT_LEN + 1)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_optional_text() {
        assert_eq!(validate_optional_text("notes", None).unwrap(), None);
        assert_eq!(validate_optional_text("notes", Some("  ")).unwrap(), None);
        assert_eq!(
            validate_optional_text("notes", Some(" late arrival ")).unwrap(),
            Some("late arrival".to_string())
        );
    }

    #[test]
    fn test_validate_occupants() {
        assert!(validate_occupants(2, 1).is_ok());
        assert!(validate_occupants(0, 2).is_err());
        assert!(validate_occupants(1, -1).is_err());
        assert!(validate_occupants(MAX_OCCUPANTS + 1, 0).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("final_amount", Money::zero()).is_ok());
        assert!(validate_amount("final_amount", Money::from_minor(-1)).is_err());
        assert!(validate_amount("final_amount", Money::MAX).is_ok());
        assert!(matches!(
            validate_amount("final_amount", Money::from_minor(i64::MAX)),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_page() {
        assert_eq!(validate_page(None, None, 20, 100).unwrap(), (20, 0));
        assert_eq!(validate_page(Some(3), Some(10), 20, 100).unwrap(), (10, 20));
        assert!(validate_page(Some(0), None, 20, 100).is_err());
        assert!(validate_page(None, Some(101), 20, 100).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }
}
