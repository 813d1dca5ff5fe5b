//! Settings type definitions.
//!
//! Field names are camelCase on the wire. Every section implements
//! [`Default`] and is marked `#[serde(default)]`, so partial JSON is accepted.

mod engine;
mod locale;

pub use engine::*;
pub use locale::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "logging": { "level": "debug" },
///   "engine": { "fillMissing": true }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MannerSettings {
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Which locale messages are rendered in.
    pub locale: LocaleSettings,
    /// Rule set behaviour.
    pub engine: EngineSettings,
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level passed to the tracing subscriber.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}
