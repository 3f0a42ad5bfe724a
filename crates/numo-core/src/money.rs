//! # Money Module
//!
//! Provides the `Amount` type for handling monetary values safely, and the
//! `Currency` table that drives its formatting.
//!
//! ## Why Integer Minor Units?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    Fiat: cents        $12.34 → 1234                                     │
//! │    BTC:  satoshis     ₿1,234 → 1234                                     │
//! │                                                                         │
//! │  Floats only appear at the edges (keypad entry, VAT ratios) and are    │
//! │  rounded ONCE into minor units by `Amount::from_major_units`.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Currency Table
//! ```text
//! ┌──────────┬────────┬──────────┬───────────┬──────────┐
//! │ Currency │ Symbol │ Decimals │ Decimal   │ Grouping │
//! ├──────────┼────────┼──────────┼───────────┼──────────┤
//! │ BTC      │ ₿      │ 0        │ -         │ ,        │
//! │ USD      │ $      │ 2        │ .         │ ,        │
//! │ EUR      │ €      │ 2        │ ,         │ .        │
//! │ GBP      │ £      │ 2        │ .         │ ,        │
//! │ JPY      │ ¥      │ 0        │ -         │ ,        │
//! └──────────┴────────┴──────────┴───────────┴──────────┘
//! ```
//! BTC has zero decimals: its "major" unit is the satoshi, so converting
//! from major units never scales. Stored history amounts rely on this.
//!
//! ## Usage
//! ```rust
//! use numo_core::money::{Amount, Currency};
//!
//! let price = Amount::from_major_units(12.34, Currency::Usd);
//! assert_eq!(price.minor_units(), 1234);
//! assert_eq!(price.to_string(), "$12.34");
//!
//! let parsed = Amount::parse("€1,23", Currency::Eur).unwrap();
//! assert_eq!(parsed.minor_units(), 123);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Currency
// =============================================================================

/// Supported currencies.
///
/// Discriminants index [`CURRENCY_TABLE`]; keep both in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Bitcoin, counted in satoshis.
    Btc,
    Usd,
    Eur,
    Gbp,
    Jpy,
}

/// Formatting rules for one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencySpec {
    pub currency: Currency,
    /// ISO-style code, e.g. "USD".
    pub code: &'static str,
    pub symbol: &'static str,
    /// Number of minor-unit digits after the decimal separator.
    pub decimals: u32,
    /// `None` for zero-decimal currencies.
    pub decimal_separator: Option<char>,
    /// Thousands separator accepted when parsing.
    pub grouping_separator: char,
    /// Whether `Display` groups the integer part.
    pub group_on_display: bool,
}

impl CurrencySpec {
    /// Minor units per major unit (`10^decimals`).
    #[inline]
    pub const fn scale(&self) -> i64 {
        10_i64.pow(self.decimals)
    }
}

/// The currency lookup table, indexed by `Currency as usize`.
///
/// EUR uses a comma decimal separator. This is a fixed mapping, never derived
/// from the system locale.
pub static CURRENCY_TABLE: [CurrencySpec; 5] = [
    CurrencySpec {
        currency: Currency::Btc,
        code: "BTC",
        symbol: "₿",
        decimals: 0,
        decimal_separator: None,
        grouping_separator: ',',
        group_on_display: true,
    },
    CurrencySpec {
        currency: Currency::Usd,
        code: "USD",
        symbol: "$",
        decimals: 2,
        decimal_separator: Some('.'),
        grouping_separator: ',',
        group_on_display: false,
    },
    CurrencySpec {
        currency: Currency::Eur,
        code: "EUR",
        symbol: "€",
        decimals: 2,
        decimal_separator: Some(','),
        grouping_separator: '.',
        group_on_display: false,
    },
    CurrencySpec {
        currency: Currency::Gbp,
        code: "GBP",
        symbol: "£",
        decimals: 2,
        decimal_separator: Some('.'),
        grouping_separator: ',',
        group_on_display: false,
    },
    CurrencySpec {
        currency: Currency::Jpy,
        code: "JPY",
        symbol: "¥",
        decimals: 0,
        decimal_separator: None,
        grouping_separator: ',',
        group_on_display: false,
    },
];

impl Currency {
    /// All supported currencies, in table order.
    pub const ALL: [Currency; 5] = [
        Currency::Btc,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
    ];

    /// Returns this currency's row in the lookup table.
    #[inline]
    pub fn spec(self) -> &'static CurrencySpec {
        &CURRENCY_TABLE[self as usize]
    }

    #[inline]
    pub fn code(self) -> &'static str {
        self.spec().code
    }

    #[inline]
    pub fn symbol(self) -> &'static str {
        self.spec().symbol
    }

    #[inline]
    pub fn decimals(self) -> u32 {
        self.spec().decimals
    }

    /// Lenient lookup used by display code.
    ///
    /// `"sat"`/`"sats"` map to BTC, codes are case-insensitive, and anything
    /// unknown falls back to USD. Use `str::parse` for a strict lookup.
    ///
    /// ## Example
    /// ```rust
    /// use numo_core::money::Currency;
    ///
    /// assert_eq!(Currency::from_code("sat"), Currency::Btc);
    /// assert_eq!(Currency::from_code("gbp"), Currency::Gbp);
    /// assert_eq!(Currency::from_code("???"), Currency::Usd);
    /// ```
    pub fn from_code(code: &str) -> Currency {
        code.parse().unwrap_or(Currency::Usd)
    }

    /// Finds a currency by its display symbol (e.g. "$" -> USD).
    pub fn from_symbol(symbol: &str) -> Option<Currency> {
        CURRENCY_TABLE
            .iter()
            .find(|spec| spec.symbol == symbol)
            .map(|spec| spec.currency)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        if code == "SAT" || code == "SATS" {
            return Ok(Currency::Btc);
        }

        CURRENCY_TABLE
            .iter()
            .find(|spec| spec.code == code)
            .map(|spec| spec.currency)
            .ok_or_else(|| CoreError::UnknownCurrency(s.to_string()))
    }
}

// =============================================================================
// Amount
// =============================================================================

/// A quantity of a currency in integer minor units.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and corrections
/// - **Currency carried along**: Formatting and arithmetic never guess
/// - **Immutable**: Every operation returns a new value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Amount {
    minor_units: i64,
    currency: Currency,
}

impl Amount {
    /// Creates an amount from a major-unit decimal value.
    ///
    /// Fiat values are scaled by `10^decimals` and rounded to the nearest
    /// minor unit. BTC has zero decimals, so the value is taken as satoshis.
    /// Non-finite input saturates (`NaN` becomes zero).
    ///
    /// ## Example
    /// ```rust
    /// use numo_core::money::{Amount, Currency};
    ///
    /// assert_eq!(Amount::from_major_units(9.99, Currency::Eur).minor_units(), 999);
    /// assert_eq!(Amount::from_major_units(123_456.0, Currency::Btc).minor_units(), 123_456);
    /// ```
    pub fn from_major_units(value: f64, currency: Currency) -> Self {
        let scaled = value * currency.spec().scale() as f64;
        Amount {
            minor_units: scaled.round() as i64,
            currency,
        }
    }

    /// Creates an amount directly from minor units.
    #[inline]
    pub const fn from_minor_units(minor_units: i64, currency: Currency) -> Self {
        Amount {
            minor_units,
            currency,
        }
    }

    /// Zero in the given currency.
    #[inline]
    pub const fn zero(currency: Currency) -> Self {
        Amount::from_minor_units(0, currency)
    }

    #[inline]
    pub const fn minor_units(&self) -> i64 {
        self.minor_units
    }

    #[inline]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns the value in major units (for display and ratios only).
    pub fn major_units(&self) -> f64 {
        self.minor_units as f64 / self.currency.spec().scale() as f64
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.minor_units == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.minor_units < 0
    }

    /// Returns the absolute value (saturating at `i64::MAX`).
    #[inline]
    pub const fn abs(&self) -> Self {
        Amount::from_minor_units(self.minor_units.saturating_abs(), self.currency)
    }

    /// Adds two amounts of the same currency.
    pub fn checked_add(self, other: Amount) -> CoreResult<Amount> {
        self.ensure_same_currency(other)?;
        let minor_units = self
            .minor_units
            .checked_add(other.minor_units)
            .ok_or(CoreError::Overflow)?;
        Ok(Amount::from_minor_units(minor_units, self.currency))
    }

    /// Subtracts an amount of the same currency.
    pub fn checked_sub(self, other: Amount) -> CoreResult<Amount> {
        self.ensure_same_currency(other)?;
        let minor_units = self
            .minor_units
            .checked_sub(other.minor_units)
            .ok_or(CoreError::Overflow)?;
        Ok(Amount::from_minor_units(minor_units, self.currency))
    }

    fn ensure_same_currency(&self, other: Amount) -> CoreResult<()> {
        if self.currency != other.currency {
            return Err(CoreError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(())
    }

    /// Parses text produced by `Display` for the given currency.
    ///
    /// ## Accepted Shape
    /// ```text
    /// [-]<symbol><integer>[<decimal separator><1..=decimals digits>]
    ///
    /// integer: plain digits ("1234") or correctly grouped ("1,234")
    /// ```
    /// Returns `None` when the text does not match, including a wrong symbol,
    /// a foreign decimal separator, too many fraction digits or overflow.
    ///
    /// ## Example
    /// ```rust
    /// use numo_core::money::{Amount, Currency};
    ///
    /// assert_eq!(Amount::parse("$1.23", Currency::Usd).unwrap().minor_units(), 123);
    /// assert_eq!(Amount::parse("₿1,234", Currency::Btc).unwrap().minor_units(), 1234);
    /// assert!(Amount::parse("€1.23", Currency::Eur).is_none());
    /// ```
    pub fn parse(text: &str, currency: Currency) -> Option<Amount> {
        let spec = currency.spec();
        let text = text.trim();
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let body = unsigned.strip_prefix(spec.symbol)?;

        let (integer_part, fraction_part) = match spec.decimal_separator {
            Some(separator) => match body.split_once(separator) {
                Some((integer, fraction)) => (integer, Some(fraction)),
                None => (body, None),
            },
            None => (body, None),
        };

        let integer = parse_grouped_integer(integer_part, spec.grouping_separator)?;
        let fraction = match fraction_part {
            Some(digits) => parse_fraction(digits, spec.decimals)?,
            None => 0,
        };

        let magnitude = integer
            .checked_mul(spec.scale() as i128)?
            .checked_add(fraction)?;
        let signed = if negative { -magnitude } else { magnitude };

        i64::try_from(signed)
            .ok()
            .map(|minor_units| Amount::from_minor_units(minor_units, currency))
    }

    /// Parses text whose leading symbol identifies the currency.
    ///
    /// Handles display strings like "$0.25", "€1,50", "₿24" or "¥100".
    pub fn parse_any(text: &str) -> Option<Amount> {
        let trimmed = text.trim();
        let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
        let spec = CURRENCY_TABLE
            .iter()
            .find(|spec| unsigned.starts_with(spec.symbol))?;
        Amount::parse(trimmed, spec.currency)
    }
}

/// Parses "1234" or "1,234"-style digits. Groups after the first must be
/// exactly three digits.
fn parse_grouped_integer(text: &str, separator: char) -> Option<i128> {
    let mut groups = text.split(separator);
    let first = groups.next()?;
    if !is_ascii_digits(first) {
        return None;
    }

    let mut digits = first.to_string();
    let mut grouped = false;
    for group in groups {
        if group.len() != 3 || !is_ascii_digits(group) {
            return None;
        }
        grouped = true;
        digits.push_str(group);
    }
    if grouped && first.len() > 3 {
        return None;
    }

    digits.parse().ok()
}

/// Parses up to `decimals` fraction digits, right-padding short input.
fn parse_fraction(text: &str, decimals: u32) -> Option<i128> {
    if !is_ascii_digits(text) || text.len() > decimals as usize {
        return None;
    }
    let value: i128 = text.parse().ok()?;
    let missing = decimals - text.len() as u32;
    Some(value * 10_i128.pow(missing))
}

fn is_ascii_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

fn group_digits(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders `<sign><symbol><integer>[<separator><fraction>]`.
///
/// ```text
/// from_minor_units(1234, USD)  → "$12.34"
/// from_minor_units(1234, EUR)  → "€12,34"
/// from_minor_units(1234, BTC)  → "₿1,234"
/// from_minor_units(-550, GBP)  → "-£5.50"
/// ```
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spec = self.currency.spec();
        let sign = if self.minor_units < 0 { "-" } else { "" };
        let magnitude = self.minor_units.unsigned_abs();
        let scale = spec.scale() as u64;
        let integer = magnitude / scale;

        if spec.group_on_display {
            write!(
                f,
                "{}{}{}",
                sign,
                spec.symbol,
                group_digits(integer, spec.grouping_separator)
            )?;
        } else {
            write!(f, "{}{}{}", sign, spec.symbol, integer)?;
        }

        if let Some(separator) = spec.decimal_separator {
            write!(
                f,
                "{}{:0width$}",
                separator,
                magnitude % scale,
                width = spec.decimals as usize
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_discriminants() {
        for currency in Currency::ALL {
            assert_eq!(currency.spec().currency, currency);
        }
    }

    #[test]
    fn test_from_major_units_respects_fiat_decimals() {
        let usd = Amount::from_major_units(12.34, Currency::Usd);
        assert_eq!(usd.minor_units(), 1234);

        let eur = Amount::from_major_units(9.99, Currency::Eur);
        assert_eq!(eur.minor_units(), 999);

        let jpy = Amount::from_major_units(500.0, Currency::Jpy);
        assert_eq!(jpy.minor_units(), 500);
    }

    #[test]
    fn test_from_major_units_treats_btc_value_as_sats() {
        let btc = Amount::from_major_units(123_456.0, Currency::Btc);
        assert_eq!(btc.minor_units(), 123_456);
    }

    #[test]
    fn test_from_major_units_rounds_half_away_from_zero() {
        assert_eq!(Amount::from_major_units(0.125, Currency::Usd).minor_units(), 13);
        assert_eq!(Amount::from_major_units(-0.125, Currency::Usd).minor_units(), -13);
        assert_eq!(Amount::from_major_units(f64::NAN, Currency::Usd).minor_units(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_minor_units(1234, Currency::Usd).to_string(), "$12.34");
        assert_eq!(Amount::from_minor_units(1234, Currency::Eur).to_string(), "€12,34");
        assert_eq!(Amount::from_minor_units(123, Currency::Usd).to_string(), "$1.23");
        assert_eq!(Amount::from_minor_units(123, Currency::Eur).to_string(), "€1,23");
        assert_eq!(Amount::from_minor_units(5, Currency::Gbp).to_string(), "£0.05");
        assert_eq!(Amount::from_minor_units(-550, Currency::Gbp).to_string(), "-£5.50");
        assert_eq!(Amount::from_minor_units(0, Currency::Usd).to_string(), "$0.00");
        assert_eq!(Amount::from_minor_units(1500, Currency::Jpy).to_string(), "¥1500");
    }

    #[test]
    fn test_display_groups_sats() {
        assert_eq!(Amount::from_minor_units(24, Currency::Btc).to_string(), "₿24");
        assert_eq!(Amount::from_minor_units(1234, Currency::Btc).to_string(), "₿1,234");
        assert_eq!(
            Amount::from_minor_units(-1_234_567, Currency::Btc).to_string(),
            "-₿1,234,567"
        );
    }

    #[test]
    fn test_parse_formatted_fiat_strings() {
        let usd = Amount::parse("$1.23", Currency::Usd).unwrap();
        assert_eq!(usd.minor_units(), 123);
        assert_eq!(usd.currency(), Currency::Usd);

        let eur = Amount::parse("€1,23", Currency::Eur).unwrap();
        assert_eq!(eur.minor_units(), 123);
    }

    #[test]
    fn test_parse_lenient_shapes() {
        assert_eq!(Amount::parse("$5", Currency::Usd).unwrap().minor_units(), 500);
        assert_eq!(Amount::parse("$5.5", Currency::Usd).unwrap().minor_units(), 550);
        assert_eq!(Amount::parse("  $1,234.50 ", Currency::Usd).unwrap().minor_units(), 123_450);
        assert_eq!(Amount::parse("€1.234,50", Currency::Eur).unwrap().minor_units(), 123_450);
        assert_eq!(Amount::parse("-£5.50", Currency::Gbp).unwrap().minor_units(), -550);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(Amount::parse("", Currency::Usd).is_none());
        assert!(Amount::parse("1.23", Currency::Usd).is_none());
        assert!(Amount::parse("€1.23", Currency::Usd).is_none());
        assert!(Amount::parse("€1.23", Currency::Eur).is_none());
        assert!(Amount::parse("$1.234", Currency::Usd).is_none());
        assert!(Amount::parse("$1.", Currency::Usd).is_none());
        assert!(Amount::parse("$.50", Currency::Usd).is_none());
        assert!(Amount::parse("$1,23.00", Currency::Usd).is_none());
        assert!(Amount::parse("$12a", Currency::Usd).is_none());
        assert!(Amount::parse("$+1.00", Currency::Usd).is_none());
        assert!(Amount::parse("₿1.5", Currency::Btc).is_none());
        assert!(Amount::parse("$99999999999999999999.99", Currency::Usd).is_none());
    }

    #[test]
    fn test_round_trip_law() {
        let samples = [
            0,
            1,
            -1,
            99,
            100,
            1234,
            -987_654,
            1_000_000_007,
            i64::MAX,
            i64::MIN,
        ];
        for currency in Currency::ALL {
            for minor in samples {
                let formatted = Amount::from_minor_units(minor, currency).to_string();
                let parsed = Amount::parse(&formatted, currency)
                    .unwrap_or_else(|| panic!("failed to parse {formatted}"));
                assert_eq!(parsed.minor_units(), minor, "{formatted}");
            }
        }
    }

    #[test]
    fn test_round_trip_law_dense_sweep() {
        let near_zero = -20_000_i64..20_000;
        let near_max = (i64::MAX - 2_000)..=i64::MAX;
        let near_min = i64::MIN..=(i64::MIN + 2_000);

        for currency in Currency::ALL {
            for minor in near_zero.clone().chain(near_max.clone()).chain(near_min.clone()) {
                let formatted = Amount::from_minor_units(minor, currency).to_string();
                assert_eq!(
                    Amount::parse(&formatted, currency).map(|a| a.minor_units()),
                    Some(minor),
                    "{formatted}"
                );
            }
        }
    }

    #[test]
    fn test_parse_any_detects_currency() {
        let amount = Amount::parse_any("£12.00").unwrap();
        assert_eq!(amount, Amount::from_minor_units(1200, Currency::Gbp));

        let sats = Amount::parse_any("-₿2,100").unwrap();
        assert_eq!(sats, Amount::from_minor_units(-2100, Currency::Btc));

        assert!(Amount::parse_any("CHF 1.00").is_none());
    }

    #[test]
    fn test_currency_lookup() {
        assert_eq!(Currency::from_code("SATS"), Currency::Btc);
        assert_eq!(Currency::from_code("eur"), Currency::Eur);
        assert_eq!(Currency::from_code("CHF"), Currency::Usd);
        assert!("CHF".parse::<Currency>().is_err());
        assert_eq!(Currency::from_symbol("£"), Some(Currency::Gbp));
        assert_eq!(Currency::from_symbol("Fr"), None);
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::from_minor_units(1000, Currency::Usd);
        let b = Amount::from_minor_units(250, Currency::Usd);
        assert_eq!(a.checked_add(b).unwrap().minor_units(), 1250);
        assert_eq!(b.checked_sub(a).unwrap().minor_units(), -750);

        let sats = Amount::from_minor_units(1, Currency::Btc);
        assert!(matches!(
            a.checked_add(sats),
            Err(CoreError::CurrencyMismatch { .. })
        ));

        let max = Amount::from_minor_units(i64::MAX, Currency::Usd);
        assert!(matches!(max.checked_add(b), Err(CoreError::Overflow)));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Amount::zero(Currency::Eur);
        assert!(zero.is_zero());
        assert!(!zero.is_negative());

        let refund = Amount::from_minor_units(-550, Currency::Eur);
        assert!(refund.is_negative());
        assert_eq!(refund.abs().minor_units(), 550);
        assert!((refund.major_units() + 5.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serde_shape() {
        let amount = Amount::from_minor_units(1234, Currency::Gbp);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, r#"{"minorUnits":1234,"currency":"GBP"}"#);

        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}
