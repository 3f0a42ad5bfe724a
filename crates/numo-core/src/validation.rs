//! # Validation Module
//!
//! Input validation utilities for Numo.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Keypad / form input                                          │
//! │  └── Amount::parse → None keeps the previous UI state                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Settings and records (THIS MODULE)                           │
//! │  ├── VAT rate, tip percentage ranges                                   │
//! │  └── History entry IDs, amounts, mint URLs                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Pure calculators (vat, money)                                │
//! │  └── No validation: inputs are caller responsibility                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use numo_core::validation::{validate_vat_rate, validate_mint_url};
//!
//! validate_vat_rate(20).unwrap();
//! validate_mint_url("https://mint.example.com").unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_TIP_PERCENTAGE, MAX_VAT_RATE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a VAT rate in whole percent.
///
/// ## Rules
/// - Must be between 0 and 100
///
/// ## Example
/// ```rust
/// use numo_core::validation::validate_vat_rate;
///
/// assert!(validate_vat_rate(19).is_ok());
/// assert!(validate_vat_rate(-100).is_err());
/// ```
pub fn validate_vat_rate(rate: i32) -> ValidationResult<()> {
    if !(0..=MAX_VAT_RATE).contains(&rate) {
        return Err(ValidationError::OutOfRange {
            field: "vat_rate".to_string(),
            min: 0,
            max: i64::from(MAX_VAT_RATE),
        });
    }

    Ok(())
}

/// Validates a tip percentage.
///
/// ## Rules
/// - Must be between 0 and 100 (0 means "custom amount")
pub fn validate_tip_percentage(percentage: i32) -> ValidationResult<()> {
    if !(0..=MAX_TIP_PERCENTAGE).contains(&percentage) {
        return Err(ValidationError::OutOfRange {
            field: "tip_percentage".to_string(),
            min: 0,
            max: i64::from(MAX_TIP_PERCENTAGE),
        });
    }

    Ok(())
}

/// Validates an amount in minor units (cents or sats).
///
/// ## Rules
/// - Must be non-negative; zero is allowed (pending entries, free items)
pub fn validate_entered_amount(field: &str, minor_units: i64) -> ValidationResult<()> {
    if minor_units < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a mint URL.
///
/// ## Rules
/// - Must not be empty
/// - Must parse as an absolute `http` or `https` URL with a host
pub fn validate_mint_url(mint_url: &str) -> ValidationResult<()> {
    let mint_url = mint_url.trim();

    if mint_url.is_empty() {
        return Err(ValidationError::Required {
            field: "mint_url".to_string(),
        });
    }

    let parsed = url::Url::parse(mint_url).map_err(|e| ValidationError::InvalidFormat {
        field: "mint_url".to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ValidationError::InvalidFormat {
            field: "mint_url".to_string(),
            reason: "must be an http(s) URL".to_string(),
        });
    }

    Ok(())
}

/// Validates a history entry ID.
///
/// ## Rules
/// - Must be a valid UUID
/// - 36 characters with hyphens: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
pub fn validate_entry_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_vat_rate() {
        assert!(validate_vat_rate(0).is_ok());
        assert!(validate_vat_rate(20).is_ok());
        assert!(validate_vat_rate(100).is_ok());

        assert!(validate_vat_rate(-1).is_err());
        assert!(validate_vat_rate(101).is_err());
    }

    #[test]
    fn test_validate_tip_percentage() {
        assert!(validate_tip_percentage(0).is_ok());
        assert!(validate_tip_percentage(15).is_ok());
        assert!(validate_tip_percentage(150).is_err());
    }

    #[test]
    fn test_validate_entered_amount() {
        assert!(validate_entered_amount("amount", 0).is_ok());
        assert!(validate_entered_amount("amount", 1099).is_ok());
        assert!(validate_entered_amount("amount", -1).is_err());
    }

    #[test]
    fn test_validate_mint_url() {
        assert!(validate_mint_url("https://mint.example.com").is_ok());
        assert!(validate_mint_url("http://localhost:3338").is_ok());

        assert!(validate_mint_url("").is_err());
        assert!(validate_mint_url("mint.example.com").is_err());
        assert!(validate_mint_url("ftp://mint.example.com").is_err());
    }

    #[test]
    fn test_validate_entry_id() {
        assert!(validate_entry_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_entry_id("").is_err());
        assert!(validate_entry_id("not-a-uuid").is_err());
    }
}
