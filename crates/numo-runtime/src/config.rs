//! # POS Configuration
//!
//! Merchant settings that drive pricing: display currency, VAT and tips.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     NUMO_CURRENCY=EUR                                                  │
//! │     NUMO_VAT_ENABLED=true  NUMO_VAT_RATE=19                            │
//! │     NUMO_PRICE_INCLUDES_VAT=true  NUMO_TIPS_ENABLED=false              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/numo/numo.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.electricdreams.numo/numo.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     USD, VAT off, tips off (presets 5/10/15/20)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [pricing]
//! currency = "EUR"
//! vat_enabled = true
//! vat_rate = 19
//! price_includes_vat = true
//!
//! [tips]
//! enabled = true
//! presets = [5, 10, 15, 20]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use numo_core::money::Currency;
use numo_core::validation::{validate_tip_percentage, validate_vat_rate};
use numo_core::vat::{self, VatBreakdown};

use crate::error::{RuntimeError, RuntimeResult};

/// Config file name inside the platform config directory.
const CONFIG_FILE_NAME: &str = "numo.toml";

// =============================================================================
// Pricing Settings
// =============================================================================

/// How prices are entered and displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Display currency code ("USD", "EUR", "sat", ...).
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub vat_enabled: bool,

    /// VAT rate in whole percent.
    #[serde(default)]
    pub vat_rate: i32,

    /// Whether entered prices already include VAT (EU/UK model).
    #[serde(default = "default_true")]
    pub price_includes_vat: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            currency: default_currency(),
            vat_enabled: false,
            vat_rate: 0,
            price_includes_vat: default_true(),
        }
    }
}

// =============================================================================
// Tip Settings
// =============================================================================

/// Tip prompt shown before payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Preset percentages offered to the customer.
    #[serde(default = "default_tip_presets")]
    pub presets: Vec<i32>,
}

fn default_tip_presets() -> Vec<i32> {
    vec![5, 10, 15, 20]
}

impl Default for TipSettings {
    fn default() -> Self {
        TipSettings {
            enabled: false,
            presets: default_tip_presets(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete terminal configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosConfig {
    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub tips: TipSettings,
}

impl PosConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (numo.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> RuntimeResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> RuntimeResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| RuntimeError::ConfigSave("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> RuntimeResult<()> {
        self.pricing.currency.parse::<Currency>()?;
        validate_vat_rate(self.pricing.vat_rate)?;

        if self.tips.enabled && self.tips.presets.is_empty() {
            return Err(RuntimeError::InvalidConfig(
                "tip presets must not be empty when tips are enabled".into(),
            ));
        }
        for preset in &self.tips.presets {
            validate_tip_percentage(*preset)?;
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from a key lookup (the environment in production).
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(currency) = lookup("NUMO_CURRENCY") {
            debug!(currency = %currency, "Overriding currency from environment");
            self.pricing.currency = currency;
        }

        if let Some(value) = lookup("NUMO_VAT_ENABLED") {
            match parse_bool(&value) {
                Some(enabled) => self.pricing.vat_enabled = enabled,
                None => warn!(value = %value, "Invalid NUMO_VAT_ENABLED in environment"),
            }
        }

        if let Some(value) = lookup("NUMO_VAT_RATE") {
            match value.trim().parse::<i32>() {
                Ok(rate) => {
                    debug!(rate, "Overriding VAT rate from environment");
                    self.pricing.vat_rate = rate;
                }
                Err(_) => warn!(value = %value, "Invalid NUMO_VAT_RATE in environment"),
            }
        }

        if let Some(value) = lookup("NUMO_PRICE_INCLUDES_VAT") {
            match parse_bool(&value) {
                Some(includes) => self.pricing.price_includes_vat = includes,
                None => warn!(value = %value, "Invalid NUMO_PRICE_INCLUDES_VAT in environment"),
            }
        }

        if let Some(value) = lookup("NUMO_TIPS_ENABLED") {
            match parse_bool(&value) {
                Some(enabled) => self.tips.enabled = enabled,
                None => warn!(value = %value, "Invalid NUMO_TIPS_ENABLED in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "electricdreams", "numo")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Display currency (lenient: unknown codes show as USD).
    pub fn currency(&self) -> Currency {
        Currency::from_code(&self.pricing.currency)
    }

    /// VAT rate that actually applies, 0 when VAT is disabled.
    pub fn effective_vat_rate(&self) -> i32 {
        if self.pricing.vat_enabled {
            self.pricing.vat_rate
        } else {
            0
        }
    }

    /// Breakdown of an entered price under the current settings.
    ///
    /// Prices in BTC are entered in sats; anything else in major units.
    pub fn vat_breakdown(&self, entered_price: f64) -> VatBreakdown {
        let rate = self.effective_vat_rate();
        let includes = self.pricing.price_includes_vat;

        match self.currency() {
            Currency::Btc => vat::calculate_sats_breakdown(entered_price.round() as i64, rate, includes),
            currency => vat::calculate_fiat_breakdown(entered_price, rate, includes, currency.code()),
        }
    }

    /// Net price to store for an item entered under the current settings.
    pub fn net_price_for_storage(&self, entered_price: f64) -> f64 {
        vat::net_price_for_storage(
            entered_price,
            self.pricing.vat_enabled,
            self.pricing.price_includes_vat,
            self.pricing.vat_rate,
        )
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_config_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("numo-config-{}", uuid::Uuid::new_v4()))
            .join(CONFIG_FILE_NAME)
    }

    #[test]
    fn test_default_config() {
        let config = PosConfig::default();
        assert_eq!(config.pricing.currency, "USD");
        assert!(!config.pricing.vat_enabled);
        assert!(config.pricing.price_includes_vat);
        assert_eq!(config.tips.presets, vec![5, 10, 15, 20]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PosConfig = toml::from_str(
            r#"
            [pricing]
            currency = "GBP"
            vat_enabled = true
            vat_rate = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.currency(), Currency::Gbp);
        assert_eq!(config.effective_vat_rate(), 20);
        assert!(config.pricing.price_includes_vat);
        assert!(!config.tips.enabled);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("NUMO_CURRENCY", "EUR"),
            ("NUMO_VAT_ENABLED", "yes"),
            ("NUMO_VAT_RATE", "19"),
            ("NUMO_PRICE_INCLUDES_VAT", "false"),
            ("NUMO_TIPS_ENABLED", "maybe"),
        ]
        .into_iter()
        .collect();

        let mut config = PosConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.pricing.currency, "EUR");
        assert!(config.pricing.vat_enabled);
        assert_eq!(config.pricing.vat_rate, 19);
        assert!(!config.pricing.price_includes_vat);
        assert!(!config.tips.enabled); // invalid value ignored
    }

    #[test]
    fn test_config_validation() {
        let mut config = PosConfig::default();

        config.pricing.currency = "CHF".to_string();
        assert!(matches!(config.validate(), Err(RuntimeError::Core(_))));

        config.pricing.currency = "sats".to_string();
        assert!(config.validate().is_ok());

        config.pricing.vat_rate = 150;
        assert!(matches!(config.validate(), Err(RuntimeError::Validation(_))));

        config.pricing.vat_rate = 20;
        config.tips.enabled = true;
        config.tips.presets.clear();
        assert!(matches!(config.validate(), Err(RuntimeError::InvalidConfig(_))));
    }

    #[test]
    fn test_vat_breakdown_follows_settings() {
        let mut config = PosConfig::default();
        config.pricing.currency = "GBP".to_string();
        config.pricing.vat_rate = 20;

        // VAT disabled: no VAT even with a rate configured
        let breakdown = config.vat_breakdown(120.0);
        assert_eq!(breakdown.vat_amount, "£0.00");

        config.pricing.vat_enabled = true;
        let breakdown = config.vat_breakdown(120.0);
        assert_eq!(breakdown.net_price, "£100.00");
        assert_eq!(breakdown.vat_amount, "£20.00");
        assert_eq!(breakdown.gross_price, "£120.00");
        assert!((config.net_price_for_storage(120.0) - 100.0).abs() < 1e-9);

        config.pricing.currency = "sat".to_string();
        let breakdown = config.vat_breakdown(1_200.0);
        assert_eq!(breakdown.net_price, "₿1,000");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = temp_config_path();
        let mut config = PosConfig::default();
        config.pricing.currency = "JPY".to_string();
        config.tips.enabled = true;

        config.save(Some(path.clone())).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[pricing]"));
        assert!(contents.contains("[tips]"));

        let loaded: PosConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_load_or_default_with_broken_file() {
        let path = temp_config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "pricing = 42").unwrap();

        assert!(matches!(
            PosConfig::load(Some(path.clone())),
            Err(RuntimeError::ConfigParse(_))
        ));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
