//! # numo-core: Pure Money Logic for Numo
//!
//! This crate is the **heart** of the Numo point-of-sale terminal. It holds
//! the monetary and record logic as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Numo Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    App UI (keypad, history, items)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          numo-runtime (UI dispatch, config, logging)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ numo-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │    vat    │  │  history  │  │   token   │  │   │
//! │  │   │  Amount   │  │ Breakdown │  │  Entry    │  │  Cashu    │  │   │
//! │  │   │ Currency  │  │ net/gross │  │  Status   │  │  mint     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • NO NETWORK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Amount` in integer minor units, `Currency` lookup table
//! - [`vat`] - Net/VAT/gross breakdowns
//! - [`history`] - Payment history records
//! - [`token`] - Best-effort Cashu token decoding
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use numo_core::money::{Amount, Currency};
//! use numo_core::vat::calculate_fiat_breakdown;
//!
//! let price = Amount::from_minor_units(1099, Currency::Usd);
//! assert_eq!(price.to_string(), "$10.99");
//!
//! let breakdown = calculate_fiat_breakdown(120.0, 20, true, "GBP");
//! assert_eq!(breakdown.net_price, "£100.00");
//! assert_eq!(breakdown.vat_amount, "£20.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod history;
pub mod money;
pub mod token;
pub mod validation;
pub mod vat;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, TokenError, ValidationError};
pub use history::{PaymentHistoryEntry, PaymentStatus, PaymentType, PendingPayment};
pub use money::{Amount, Currency};
pub use vat::{VatAmounts, VatBreakdown};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Unit assumed for tokens and entries that do not name one.
pub const DEFAULT_UNIT: &str = "sat";

/// Highest VAT rate accepted from settings, in whole percent.
pub const MAX_VAT_RATE: i32 = 100;

/// Highest tip percentage accepted from settings.
pub const MAX_TIP_PERCENTAGE: i32 = 100;
