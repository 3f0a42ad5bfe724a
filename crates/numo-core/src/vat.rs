//! # VAT Module
//!
//! Net/VAT/gross breakdowns from a single entered price.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         VAT Breakdown                                   │
//! │                                                                         │
//! │  Price INCLUDES VAT (EU/UK model)     Price EXCLUDES VAT (USA model)    │
//! │  ─────────────────────────────────    ───────────────────────────────   │
//! │  gross = entered                      net   = entered                   │
//! │  net   = gross / (1 + rate/100)       vat   = net × rate/100            │
//! │  vat   = gross − net                  gross = net + vat                 │
//! │                                                                         │
//! │  Each value is rounded ONCE into minor units via Amount, then          │
//! │  formatted for display.                                                 │
//! │                                                                         │
//! │  Example: £120.00 incl. 20% → net £100.00, VAT £20.00, gross £120.00   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rates of zero or below apply no VAT at all, which also keeps a rate of
//! -100% from dividing by zero. Nothing else is validated here; the settings
//! layer uses `validation::validate_vat_rate` before a rate gets this far.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Amount, Currency};

// =============================================================================
// Breakdown Types
// =============================================================================

/// Display-ready breakdown, each field formatted via `Amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VatBreakdown {
    pub net_price: String,
    /// e.g. "VAT (20%)"
    pub vat_label: String,
    pub vat_amount: String,
    pub gross_price: String,
}

/// Numeric breakdown the display strings are rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VatAmounts {
    pub net: Amount,
    pub vat: Amount,
    pub gross: Amount,
}

impl VatAmounts {
    /// Formats the amounts for display.
    pub fn to_breakdown(&self, vat_rate: i32) -> VatBreakdown {
        VatBreakdown {
            net_price: self.net.to_string(),
            vat_label: vat_label(vat_rate),
            vat_amount: self.vat.to_string(),
            gross_price: self.gross.to_string(),
        }
    }
}

fn vat_label(vat_rate: i32) -> String {
    format!("VAT ({}%)", vat_rate)
}

// =============================================================================
// Price Helpers
// =============================================================================

/// Net price from a VAT-inclusive price: `gross / (1 + rate/100)`.
pub fn net_from_gross(gross: f64, vat_rate: f64) -> f64 {
    if vat_rate <= 0.0 {
        return gross;
    }
    gross / (1.0 + vat_rate / 100.0)
}

/// Gross price from a net price: `net × (1 + rate/100)`.
pub fn gross_from_net(net: f64, vat_rate: f64) -> f64 {
    if vat_rate <= 0.0 {
        return net;
    }
    net * (1.0 + vat_rate / 100.0)
}

// =============================================================================
// Fiat Breakdown
// =============================================================================

/// Computes the numeric breakdown for a fiat price in major units.
///
/// ## Example
/// ```rust
/// use numo_core::money::Currency;
/// use numo_core::vat::fiat_amounts;
///
/// let amounts = fiat_amounts(120.0, 20, true, Currency::Gbp);
/// assert_eq!(amounts.net.minor_units(), 10_000);
/// assert_eq!(amounts.vat.minor_units(), 2_000);
/// assert_eq!(amounts.gross.minor_units(), 12_000);
/// ```
pub fn fiat_amounts(
    entered_price: f64,
    vat_rate: i32,
    price_includes_vat: bool,
    currency: Currency,
) -> VatAmounts {
    let rate = f64::from(vat_rate);
    let (net, gross) = if price_includes_vat {
        (net_from_gross(entered_price, rate), entered_price)
    } else {
        (entered_price, gross_from_net(entered_price, rate))
    };
    let vat = gross - net;

    VatAmounts {
        net: Amount::from_major_units(net, currency),
        vat: Amount::from_major_units(vat, currency),
        gross: Amount::from_major_units(gross, currency),
    }
}

/// Calculates the display breakdown for a fiat price.
///
/// `currency` is a currency code ("GBP", "eur", ...). Unknown codes fall
/// back to USD, like every other display path.
///
/// ## User Workflow
/// ```text
/// Item editor: price 120.00, VAT 20%, "price includes VAT" ✓
///      │
///      ▼
/// calculate_fiat_breakdown(120.0, 20, true, "GBP") ← THIS FUNCTION
///      │
///      ▼
/// Net £100.00 │ VAT (20%) £20.00 │ Gross £120.00
/// ```
pub fn calculate_fiat_breakdown(
    entered_price: f64,
    vat_rate: i32,
    price_includes_vat: bool,
    currency: &str,
) -> VatBreakdown {
    let currency = Currency::from_code(currency);
    fiat_amounts(entered_price, vat_rate, price_includes_vat, currency).to_breakdown(vat_rate)
}

// =============================================================================
// Sats Breakdown
// =============================================================================

/// Computes the numeric breakdown for a price entered in satoshis.
///
/// The derived side is truncated toward zero and VAT is always
/// `gross - net`, so the three values add up exactly.
pub fn sats_amounts(entered_sats: i64, vat_rate: i32, price_includes_vat: bool) -> VatAmounts {
    let rate = f64::from(vat_rate);
    let (net, gross) = if price_includes_vat {
        (net_from_gross(entered_sats as f64, rate) as i64, entered_sats)
    } else {
        (entered_sats, gross_from_net(entered_sats as f64, rate) as i64)
    };

    VatAmounts {
        net: Amount::from_minor_units(net, Currency::Btc),
        vat: Amount::from_minor_units(gross.saturating_sub(net), Currency::Btc),
        gross: Amount::from_minor_units(gross, Currency::Btc),
    }
}

/// Calculates the display breakdown for a price entered in satoshis.
pub fn calculate_sats_breakdown(
    entered_sats: i64,
    vat_rate: i32,
    price_includes_vat: bool,
) -> VatBreakdown {
    sats_amounts(entered_sats, vat_rate, price_includes_vat).to_breakdown(vat_rate)
}

// =============================================================================
// Storage
// =============================================================================

/// Net price to store for a catalog item.
///
/// Items are stored net of VAT; only a VAT-inclusive entry with VAT enabled
/// needs converting.
pub fn net_price_for_storage(
    entered_price: f64,
    vat_enabled: bool,
    price_includes_vat: bool,
    vat_rate: i32,
) -> f64 {
    if vat_enabled && price_includes_vat {
        net_from_gross(entered_price, f64::from(vat_rate))
    } else {
        entered_price
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiat_breakdown_uses_provided_currency_code() {
        let breakdown = calculate_fiat_breakdown(120.0, 20, true, "GBP");

        let net = Amount::parse(&breakdown.net_price, Currency::Gbp).unwrap();
        let vat = Amount::parse(&breakdown.vat_amount, Currency::Gbp).unwrap();
        let gross = Amount::parse(&breakdown.gross_price, Currency::Gbp).unwrap();

        assert_eq!(net.minor_units(), 10_000); // £100.00
        assert_eq!(vat.minor_units(), 2_000); // £20.00
        assert_eq!(gross.minor_units(), 12_000); // £120.00
        assert_eq!(breakdown.net_price, "£100.00");
        assert_eq!(breakdown.vat_label, "VAT (20%)");
    }

    #[test]
    fn test_fiat_breakdown_excluding_vat() {
        let amounts = fiat_amounts(100.0, 19, false, Currency::Eur);
        assert_eq!(amounts.net.minor_units(), 10_000);
        assert_eq!(amounts.vat.minor_units(), 1_900);
        assert_eq!(amounts.gross.minor_units(), 11_900);

        let breakdown = amounts.to_breakdown(19);
        assert_eq!(breakdown.gross_price, "€119,00");
    }

    #[test]
    fn test_unknown_currency_code_falls_back_to_usd() {
        let breakdown = calculate_fiat_breakdown(10.0, 10, false, "XYZ");
        assert_eq!(breakdown.gross_price, "$11.00");
    }

    #[test]
    fn test_non_positive_rate_applies_no_vat() {
        let zero = fiat_amounts(50.0, 0, true, Currency::Usd);
        assert_eq!(zero.net, zero.gross);
        assert!(zero.vat.is_zero());

        let pathological = fiat_amounts(50.0, -100, true, Currency::Usd);
        assert_eq!(pathological.net.minor_units(), 5_000);
        assert!(pathological.vat.is_zero());
    }

    #[test]
    fn test_breakdown_round_trip_within_one_minor_unit() {
        for (net, rate) in [(9.99, 19), (100.0, 20), (0.01, 7), (1234.56, 21), (3.33, 5)] {
            let forward = fiat_amounts(net, rate, false, Currency::Eur);
            let back = fiat_amounts(forward.gross.major_units(), rate, true, Currency::Eur);
            let diff = (back.net.minor_units() - forward.net.minor_units()).abs();
            assert!(diff <= 1, "net {} at {}% drifted by {}", net, rate, diff);
        }
    }

    #[test]
    fn test_sats_breakdown() {
        let incl = sats_amounts(1_200, 20, true);
        assert_eq!(incl.net.minor_units(), 1_000);
        assert_eq!(incl.vat.minor_units(), 200);
        assert_eq!(incl.gross.minor_units(), 1_200);

        let excl = calculate_sats_breakdown(1_000, 19, false);
        assert_eq!(excl.net_price, "₿1,000");
        assert_eq!(excl.vat_amount, "₿190");
        assert_eq!(excl.gross_price, "₿1,190");
    }

    #[test]
    fn test_sats_breakdown_truncates_derived_side() {
        // 1000 / 1.19 = 840.33... → 840
        let amounts = sats_amounts(1_000, 19, true);
        assert_eq!(amounts.net.minor_units(), 840);
        assert_eq!(amounts.vat.minor_units(), 160);
    }

    #[test]
    fn test_net_price_for_storage() {
        assert!((net_price_for_storage(119.0, true, true, 19) - 100.0).abs() < 1e-9);
        assert_eq!(net_price_for_storage(119.0, false, true, 19), 119.0);
        assert_eq!(net_price_for_storage(100.0, true, false, 19), 100.0);
    }
}
