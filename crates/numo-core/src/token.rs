//! # Token Module
//!
//! Best-effort decoding of Cashu ecash tokens, used to attribute a received
//! payment to the mint that issued it.
//!
//! ## Token Layout (V3, `cashuA`)
//! ```text
//! cashuA eyJ0b2tlbiI6W3sibWludCI6Imh0dHBzOi8v...
//! ──┬─── ──────────────────┬─────────────────────
//!   │                      └─ base64url(JSON), padding optional
//!   └─ prefix + version
//!
//! {
//!   "token": [ { "mint": "https://mint.example", "proofs": [ {amount,id,secret,C} ] } ],
//!   "unit":  "sat",
//!   "memo":  "Thank you"
//! }
//! ```
//!
//!
//! ## Token Layout (V4, `cashuB`)
//! ```text
//! cashuB pGF0gaJhaUgArSaMTR9YJmFwgaNhYQFhc3hA...
//!        └─ base64url(CBOR)
//!
//! { "m": mint, "u": unit, "d": memo?,
//!   "t": [ { "i": keyset id (bytes), "p": [ {a, s, c (bytes)} ] } ] }
//! ```
//! V4 tokens are normalized into the V3 shape: one entry for the single mint,
//! byte fields rendered as lowercase hex. `encode` always writes V3.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use ciborium::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TokenError;

/// Optional URI scheme some wallets prepend.
const URI_PREFIX: &str = "cashu:";

/// Token prefix preceding the version character.
const TOKEN_PREFIX: &str = "cashu";

/// A single ecash proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub amount: u64,
    /// Keyset ID.
    pub id: String,
    pub secret: String,
    /// Blind signature.
    #[serde(rename = "C")]
    pub c: String,
}

/// Proofs issued by one mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub mint: String,
    pub proofs: Vec<Proof>,
}

/// A decoded V3 Cashu token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashuToken {
    pub token: Vec<TokenEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl CashuToken {
    /// Decodes a serialized token.
    ///
    /// ## Errors
    /// - `Empty` / `MissingPrefix` for input that is not a token at all
    /// - `UnsupportedVersion` for anything but `cashuA` and `cashuB`
    /// - `Base64` / `Payload` / `Cbor` for corrupt payloads
    /// - `NoEntries` when the token names no mint
    pub fn decode(text: &str) -> Result<CashuToken, TokenError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TokenError::Empty);
        }

        let text = text.strip_prefix(URI_PREFIX).unwrap_or(text);
        let rest = text
            .strip_prefix(TOKEN_PREFIX)
            .ok_or(TokenError::MissingPrefix)?;

        let mut chars = rest.chars();
        let version = chars.next().ok_or(TokenError::MissingPrefix)?;
        let payload = chars.as_str().trim_end_matches('=');

        let token: CashuToken = match version {
            'A' => serde_json::from_slice(&decode_base64(payload)?)?,
            'B' => decode_v4(&decode_base64(payload)?)?,
            other => return Err(TokenError::UnsupportedVersion(other)),
        };

        if token.token.is_empty() {
            return Err(TokenError::NoEntries);
        }
        Ok(token)
    }

    /// Serializes as a `cashuA` token (base64url, no padding).
    pub fn encode(&self) -> Result<String, TokenError> {
        let json = serde_json::to_vec(self)?;
        Ok(format!("{}A{}", TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(json)))
    }

    /// Mint of the first entry.
    pub fn mint(&self) -> Option<&str> {
        self.token.first().map(|entry| entry.mint.as_str())
    }

    /// All mints named by the token, in order.
    pub fn mints(&self) -> impl Iterator<Item = &str> {
        self.token.iter().map(|entry| entry.mint.as_str())
    }

    /// Sum of all proof amounts.
    pub fn total_amount(&self) -> u64 {
        self.token
            .iter()
            .flat_map(|entry| entry.proofs.iter())
            .map(|proof| proof.amount)
            .fold(0_u64, u64::saturating_add)
    }

    /// Token unit, `"sat"` when unspecified.
    pub fn unit(&self) -> &str {
        self.unit.as_deref().unwrap_or("sat")
    }
}

fn decode_base64(payload: &str) -> Result<Vec<u8>, TokenError> {
    Ok(URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))?)
}

// =============================================================================
// V4 (CBOR)
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenV4 {
    #[serde(rename = "m")]
    mint: String,
    #[serde(rename = "u")]
    unit: String,
    #[serde(rename = "d", default)]
    memo: Option<String>,
    #[serde(rename = "t")]
    entries: Vec<TokenV4Entry>,
}

#[derive(Debug, Deserialize)]
struct TokenV4Entry {
    #[serde(rename = "i")]
    keyset_id: Value,
    #[serde(rename = "p")]
    proofs: Vec<ProofV4>,
}

/// DLEQ proofs and witnesses (`d`, `w`) are not needed here and are skipped.
#[derive(Debug, Deserialize)]
struct ProofV4 {
    #[serde(rename = "a")]
    amount: u64,
    #[serde(rename = "s")]
    secret: String,
    #[serde(rename = "c")]
    c: Value,
}

fn decode_v4(bytes: &[u8]) -> Result<CashuToken, TokenError> {
    let raw: TokenV4 =
        ciborium::from_reader(bytes).map_err(|e| TokenError::Cbor(format!("{:?}", e)))?;

    if raw.entries.is_empty() {
        return Err(TokenError::NoEntries);
    }

    let mut proofs = Vec::new();
    for entry in raw.entries {
        let id = bytes_as_hex(&entry.keyset_id, "i")?;
        for proof in entry.proofs {
            proofs.push(Proof {
                amount: proof.amount,
                id: id.clone(),
                secret: proof.secret,
                c: bytes_as_hex(&proof.c, "c")?,
            });
        }
    }

    Ok(CashuToken {
        token: vec![TokenEntry {
            mint: raw.mint,
            proofs,
        }],
        unit: Some(raw.unit),
        memo: raw.memo,
    })
}

fn bytes_as_hex(value: &Value, field: &str) -> Result<String, TokenError> {
    match value {
        Value::Bytes(bytes) => Ok(hex::encode(bytes)),
        Value::Text(text) => Ok(text.clone()),
        _ => Err(TokenError::Cbor(format!("field `{}` is not a byte string", field))),
    }
}

// =============================================================================
// Mint Extraction
// =============================================================================

/// Extracts the mint URL from a serialized token.
///
/// Handles both `cashuA` and `cashuB`. Mint attribution is a convenience
/// field, so every failure yields `None` instead of an error.
pub fn extract_mint(token: &str) -> Option<String> {
    if token.trim().is_empty() {
        return None;
    }

    match CashuToken::decode(token) {
        Ok(decoded) => decoded.mint().map(str::to_string),
        Err(err) => {
            debug!(error = %err, "Could not extract mint from token");
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
