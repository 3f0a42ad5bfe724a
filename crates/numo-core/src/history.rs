//! # Payment History
//!
//! The record kept for every payment the terminal receives or starts.
//!
//! ## Entry Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Payment History Entry                              │
//! │                                                                         │
//! │  Keypad / checkout                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  create_pending() ──► status: pending, token: "", no mint               │
//! │       │                                                                 │
//! │       ├── token or invoice paid ──► complete() ──► status: completed    │
//! │       │                              (mint taken from the token)        │
//! │       │                                                                 │
//! │       └── user aborts ────────────► cancel() ────► status: cancelled    │
//! │                                                                         │
//! │  Legacy token import ──► from_token() ──► status: completed, cashu      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persistence Contract
//! - JSON field names are camelCase (`entryUnit`, `enteredAmount`, ...)
//! - Optional fields are omitted when absent, never written as placeholders
//! - `unit` and `entryUnit` read as `"sat"` when missing or `null`
//! - `status` reads as `completed` when missing, `null` or unrecognised
//! - `paymentType` reads as absent when unrecognised
//! - `token`, `amount` and `enteredAmount` read as empty/zero when missing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreResult, ValidationError};
use crate::money::{Amount, Currency};
use crate::token;
use crate::validation::{
    validate_entered_amount, validate_entry_id, validate_mint_url, validate_tip_percentage,
    ValidationResult,
};
use crate::DEFAULT_UNIT;

// =============================================================================
// Status & Type
// =============================================================================

/// Where a payment is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Payment request shown, nothing received yet.
    Pending,
    /// Funds received.
    #[default]
    Completed,
    /// Request abandoned.
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    /// Case-insensitive lookup by stored name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "cancelled" => Some(PaymentStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the payment arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Ecash token (NFC tap, QR, Nostr DM).
    Cashu,
    /// BOLT11 invoice paid to a mint quote.
    Lightning,
}

impl PaymentType {
    /// Case-insensitive lookup by stored name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "cashu" => Some(PaymentType::Cashu),
            "lightning" => Some(PaymentType::Lightning),
            _ => None,
        }
    }
}

// =============================================================================
// Payment History Entry
// =============================================================================

/// A payment transaction in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistoryEntry {
    /// Unique identifier (UUID v4), used for updates.
    #[serde(default = "new_entry_id")]
    pub id: String,

    /// Serialized ecash token; empty while pending.
    #[serde(default)]
    pub token: String,

    /// Amount received in sats.
    #[serde(default)]
    pub amount: i64,

    #[ts(as = "String")]
    pub date: DateTime<Utc>,

    /// Unit of the token (e.g. "sat").
    #[serde(default = "default_unit", deserialize_with = "unit_or_default")]
    pub unit: String,

    /// Unit the amount was entered in (e.g. "USD", "sat").
    #[serde(default = "default_unit", deserialize_with = "unit_or_default")]
    pub entry_unit: String,

    /// Amount as entered (cents for fiat, sats for BTC).
    #[serde(default)]
    pub entered_amount: i64,

    /// Bitcoin price at time of payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitcoin_price: Option<f64>,

    /// Mint the token was issued by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mint_url: Option<String>,

    /// Payment request the token was received with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_request: Option<String>,

    #[serde(default, deserialize_with = "status_or_default")]
    pub status: PaymentStatus,

    /// `None` while pending or unknown.
    #[serde(
        default,
        deserialize_with = "payment_type_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_type: Option<PaymentType>,

    /// BOLT11 invoice (lightning payments only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lightning_invoice: Option<String>,

    /// Mint quote ID, for resuming a pending lightning payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lightning_quote_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lightning_mint_url: Option<String>,

    /// Formatted amount shown when resuming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_amount: Option<String>,

    /// Nostr profile for resuming Cashu-over-Nostr payments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nostr_nprofile: Option<String>,

    /// Ephemeral nostr secret key (hex).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nostr_secret_hex: Option<String>,

    /// Serialized checkout basket. Superseded by `basket_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_basket_json: Option<String>,

    /// Saved basket associated with this payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basket_id: Option<String>,

    /// Tip in sats, kept apart from the base amount for accounting.
    #[serde(default)]
    pub tip_amount_sats: i64,

    /// Preset tip percentage, 0 for a custom amount.
    #[serde(default)]
    pub tip_percentage: i32,
}

fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

fn unit_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_unit))
}

fn status_or_default<'de, D>(deserializer: D) -> Result<PaymentStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(lenient(name.as_deref(), PaymentStatus::from_name, "status").unwrap_or_default())
}

fn payment_type_or_none<'de, D>(deserializer: D) -> Result<Option<PaymentType>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(lenient(name.as_deref(), PaymentType::from_name, "paymentType"))
}

/// Maps a stored name, logging and dropping unrecognised values.
fn lenient<T>(name: Option<&str>, lookup: fn(&str) -> Option<T>, field: &str) -> Option<T> {
    let name = name?;
    let value = lookup(name);
    if value.is_none() {
        debug!(field, value = name, "Unrecognised value in stored history entry");
    }
    value
}

/// Parameters for [`PaymentHistoryEntry::create_pending`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPayment {
    /// Amount requested in sats.
    pub amount: i64,
    pub entry_unit: String,
    pub entered_amount: i64,
    pub bitcoin_price: Option<f64>,
    pub payment_request: Option<String>,
    pub formatted_amount: Option<String>,
    pub checkout_basket_json: Option<String>,
    pub basket_id: Option<String>,
    pub tip_amount_sats: i64,
    pub tip_percentage: i32,
}

impl Default for PendingPayment {
    fn default() -> Self {
        PendingPayment {
            amount: 0,
            entry_unit: default_unit(),
            entered_amount: 0,
            bitcoin_price: None,
            payment_request: None,
            formatted_amount: None,
            checkout_basket_json: None,
            basket_id: None,
            tip_amount_sats: 0,
            tip_percentage: 0,
        }
    }
}

impl PaymentHistoryEntry {
    // =========================================================================
    // Factories
    // =========================================================================

    /// Builds a completed cashu entry from a received token.
    ///
    /// Units default to "sat", the entered amount equals the received amount,
    /// and the mint is decoded from the token on a best-effort basis.
    pub fn from_token(token: impl Into<String>, amount: i64, date: DateTime<Utc>) -> Self {
        let token = token.into();
        let mint_url = token::extract_mint(&token);

        PaymentHistoryEntry {
            id: new_entry_id(),
            token,
            amount,
            date,
            unit: default_unit(),
            entry_unit: default_unit(),
            entered_amount: amount,
            bitcoin_price: None,
            mint_url,
            payment_request: None,
            status: PaymentStatus::Completed,
            payment_type: Some(PaymentType::Cashu),
            lightning_invoice: None,
            lightning_quote_id: None,
            lightning_mint_url: None,
            formatted_amount: None,
            nostr_nprofile: None,
            nostr_secret_hex: None,
            checkout_basket_json: None,
            basket_id: None,
            tip_amount_sats: 0,
            tip_percentage: 0,
        }
    }

    /// Creates a pending entry when a payment request is shown.
    pub fn create_pending(pending: PendingPayment, date: DateTime<Utc>) -> Self {
        PaymentHistoryEntry {
            id: new_entry_id(),
            token: String::new(),
            amount: pending.amount,
            date,
            unit: default_unit(),
            entry_unit: pending.entry_unit,
            entered_amount: pending.entered_amount,
            bitcoin_price: pending.bitcoin_price,
            mint_url: None,
            payment_request: pending.payment_request,
            status: PaymentStatus::Pending,
            payment_type: None,
            lightning_invoice: None,
            lightning_quote_id: None,
            lightning_mint_url: None,
            formatted_amount: pending.formatted_amount,
            nostr_nprofile: None,
            nostr_secret_hex: None,
            checkout_basket_json: pending.checkout_basket_json,
            basket_id: pending.basket_id,
            tip_amount_sats: pending.tip_amount_sats,
            tip_percentage: pending.tip_percentage,
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Records the lightning quote a pending payment is waiting on.
    pub fn with_lightning_quote(
        mut self,
        invoice: impl Into<String>,
        quote_id: impl Into<String>,
        mint_url: impl Into<String>,
    ) -> Self {
        self.lightning_invoice = Some(invoice.into());
        self.lightning_quote_id = Some(quote_id.into());
        self.lightning_mint_url = Some(mint_url.into());
        self
    }

    /// Records the Nostr listener a pending payment is waiting on.
    pub fn with_nostr_listener(
        mut self,
        nprofile: impl Into<String>,
        secret_hex: impl Into<String>,
    ) -> Self {
        self.nostr_nprofile = Some(nprofile.into());
        self.nostr_secret_hex = Some(secret_hex.into());
        self
    }

    /// Marks the payment as received.
    ///
    /// When no mint is given, it is decoded from the token if possible.
    pub fn complete(
        mut self,
        token: impl Into<String>,
        payment_type: PaymentType,
        mint_url: Option<String>,
    ) -> Self {
        self.token = token.into();
        self.mint_url = mint_url.or_else(|| token::extract_mint(&self.token));
        self.payment_type = Some(payment_type);
        self.status = PaymentStatus::Completed;
        self
    }

    /// Marks the payment as abandoned.
    pub fn cancel(mut self) -> Self {
        self.status = PaymentStatus::Cancelled;
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn has_tip(&self) -> bool {
        self.tip_amount_sats > 0
    }

    /// Amount excluding the tip, in sats.
    pub fn base_amount_sats(&self) -> i64 {
        self.amount.saturating_sub(self.tip_amount_sats)
    }

    /// Tip formatted for display (e.g. "₿500"), empty when there is none.
    pub fn tip_display(&self) -> String {
        if self.has_tip() {
            Amount::from_minor_units(self.tip_amount_sats, Currency::Btc).to_string()
        } else {
            String::new()
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }

    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    pub fn is_lightning(&self) -> bool {
        self.payment_type == Some(PaymentType::Lightning)
    }

    pub fn is_cashu(&self) -> bool {
        self.payment_type == Some(PaymentType::Cashu)
    }

    /// Lightning invoice shortened for display: first 12 + "..." + last 12
    /// characters when longer than 24.
    pub fn abbreviated_invoice(&self) -> Option<String> {
        let invoice = self.lightning_invoice.as_deref()?;
        let chars: Vec<char> = invoice.chars().collect();
        if chars.len() <= 24 {
            return Some(invoice.to_string());
        }

        let head: String = chars[..12].iter().collect();
        let tail: String = chars[chars.len() - 12..].iter().collect();
        Some(format!("{}...{}", head, tail))
    }

    pub fn has_checkout_basket(&self) -> bool {
        self.checkout_basket_json
            .as_deref()
            .is_some_and(|json| !json.is_empty())
    }

    pub fn has_saved_basket(&self) -> bool {
        self.basket_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// The received amount in the token's unit.
    pub fn amount_display(&self) -> Amount {
        Amount::from_minor_units(self.amount, Currency::from_code(&self.unit))
    }

    /// The amount as the merchant typed it, in the entry unit's currency.
    pub fn entered_amount_display(&self) -> Amount {
        Amount::from_minor_units(self.entered_amount, Currency::from_code(&self.entry_unit))
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Checks the record before it is persisted.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_entry_id(&self.id)?;
        validate_entered_amount("amount", self.amount)?;
        validate_entered_amount("entered_amount", self.entered_amount)?;
        validate_entered_amount("tip_amount_sats", self.tip_amount_sats)?;
        if self.tip_amount_sats > self.amount {
            return Err(ValidationError::OutOfRange {
                field: "tip_amount_sats".to_string(),
                min: 0,
                max: self.amount,
            });
        }
        validate_tip_percentage(self.tip_percentage)?;
        if let Some(mint_url) = &self.mint_url {
            validate_mint_url(mint_url)?;
        }
        Ok(())
    }

    // =========================================================================
    // JSON
    // =========================================================================

    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes a whole history list.
    pub fn list_to_json(entries: &[PaymentHistoryEntry]) -> CoreResult<String> {
        Ok(serde_json::to_string(entries)?)
    }

    /// Reads a whole history list; an empty string is an empty history.
    pub fn list_from_json(json: &str) -> CoreResult<Vec<PaymentHistoryEntry>> {
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(json)?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
