//! # numo-runtime: Application Glue for Numo
//!
//! The parts of the terminal that touch the outside world: the UI dispatch
//! loop, the settings file and the logging subscriber. Money logic lives in
//! `numo-core`.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           App Startup                                   │
//! │                                                                         │
//! │  1. logging::init_tracing()          RUST_LOG / default filter         │
//! │  2. PosConfig::load_or_default(None) numo.toml + NUMO_* env            │
//! │  3. UiDispatcher::spawn()            serial UI executor                │
//! │                                                                         │
//! │  Background work ──post()──► UiDispatcher ──► screen updates           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use numo_runtime::PosConfig;
//!
//! let mut config = PosConfig::default();
//! config.pricing.currency = "EUR".to_string();
//! config.pricing.vat_enabled = true;
//! config.pricing.vat_rate = 19;
//! config.pricing.price_includes_vat = false;
//!
//! let breakdown = config.vat_breakdown(100.0);
//! assert_eq!(breakdown.gross_price, "€119,00");
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;

pub use config::{PosConfig, PricingSettings, TipSettings};
pub use dispatch::{DispatchToken, PostHandle, UiDispatcher};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::init_tracing;
