//! # Error Types
//!
//! Domain-specific error types for numo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  numo-core errors (this file)                                          │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── TokenError       - Cashu token decoding failures                  │
//! │                                                                         │
//! │  numo-runtime errors (separate crate)                                  │
//! │  └── RuntimeError     - Config load/save failures                      │
//! │                                                                         │
//! │  Flow: ValidationError/TokenError → CoreError → RuntimeError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! `Amount::parse` and mint extraction fail softly (`None`). They back
//! user-input fields and convenience attributes, so a typed error would only
//! be discarded by every caller.

use thiserror::Error;

use crate::money::Currency;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Currency code is not in the supported table.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Arithmetic between amounts of different currencies.
    ///
    /// ## When This Occurs
    /// - Adding a tip entered in USD to a total kept in sats
    /// - Any `checked_add`/`checked_sub` across currencies
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    /// Minor-unit arithmetic left the i64 range.
    #[error("Amount overflow")]
    Overflow,

    /// Token could not be decoded.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid URL).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Token Error
// =============================================================================

/// Cashu token decoding errors.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Input was empty after trimming.
    #[error("Token is empty")]
    Empty,

    /// Input does not start with the `cashu` prefix.
    #[error("Missing cashu prefix")]
    MissingPrefix,

    /// Token version is recognised but not decodable here.
    #[error("Unsupported token version: {0}")]
    UnsupportedVersion(char),

    /// Payload is not valid base64.
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Payload is not the expected JSON shape.
    #[error("Invalid token payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// V4 payload is not the expected CBOR shape.
    #[error("Invalid CBOR token payload: {0}")]
    Cbor(String),

    /// Token decoded but carries no mint entries.
    #[error("Token contains no mint entries")]
    NoEntries,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::CurrencyMismatch {
            left: Currency::Usd,
            right: Currency::Btc,
        };
        assert_eq!(err.to_string(), "Currency mismatch: USD vs BTC");

        let err = CoreError::UnknownCurrency("XYZ".to_string());
        assert_eq!(err.to_string(), "Unknown currency code: XYZ");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::OutOfRange {
            field: "vat_rate".to_string(),
            min: 0,
            max: 100,
        };
        assert_eq!(err.to_string(), "vat_rate must be between 0 and 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_token_error_converts_to_core_error() {
        let core_err: CoreError = TokenError::UnsupportedVersion('C').into();
        assert_eq!(
            core_err.to_string(),
            "Token error: Unsupported token version: C"
        );
    }
}
