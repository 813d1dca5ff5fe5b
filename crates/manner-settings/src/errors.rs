//! Errors raised while loading manner settings.

use thiserror::Error;

/// Why a settings file could not be turned into [`crate::MannerSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON, or does not fit the schema.
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
    /// A setting parsed but is outside its accepted range.
    #[error("setting `{key}` is invalid: {reason}")]
    InvalidValue {
        /// Dotted camelCase path of the offending setting.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type for settings loading.
pub type Result<T> = std::result::Result<T, SettingsError>;
