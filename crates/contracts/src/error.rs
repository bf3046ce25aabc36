//! Layered error definitions
//!
//! Categorized by source: config / io

use thiserror::Error;

/// Unified error type for contract-level operations
#[derive(Debug, Error)]
pub enum ContractError {
    /// Configuration parse error
    #[error("settings parse error: {message}")]
    SettingsParse { message: String },

    /// Configuration validation error
    #[error("settings validation error at '{field}': {message}")]
    SettingsValidation { field: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create settings parse error
    pub fn settings_parse(message: impl Into<String>) -> Self {
        Self::SettingsParse {
            message: message.into(),
        }
    }

    /// Create settings validation error
    pub fn settings_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SettingsValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}
