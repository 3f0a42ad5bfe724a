//! # Runtime Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Runtime Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │      I/O        │  │        Core             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Io             │  │  CoreError              │ │
//! │  │  ConfigParse    │  │                 │  │  ValidationError        │ │
//! │  │  ConfigSave     │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file is not valid TOML for `PosConfig`.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be serialized or no path was available.
    #[error("Failed to save config: {0}")]
    ConfigSave(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] numo_core::CoreError),

    #[error(transparent)]
    Validation(#[from] numo_core::ValidationError),
}

impl From<toml::ser::Error> for RuntimeError {
    fn from(err: toml::ser::Error) -> Self {
        RuntimeError::ConfigSave(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RuntimeError::InvalidConfig("tip presets must not be empty".into());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: tip presets must not be empty"
        );

        let err: RuntimeError = numo_core::ValidationError::Required {
            field: "currency".into(),
        }
        .into();
        assert_eq!(err.to_string(), "currency is required");
    }
}
