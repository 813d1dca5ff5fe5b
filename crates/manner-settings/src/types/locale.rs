//! Locale selection.

use serde::{Deserialize, Serialize};

/// Locale selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocaleSettings {
    /// Locale tag messages are rendered in.
    pub default: String,
    /// Optional JSON catalogue overlaid on the built-in English messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_path: Option<String>,
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            default: "en".to_string(),
            bundle_path: None,
        }
    }
}
