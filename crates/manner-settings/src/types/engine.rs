//! Rule set behaviour.

use serde::{Deserialize, Serialize};

/// Rule set behaviour.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// Report every watched field, filling fields no rule spoke about with
    /// the neutral status.
    pub fill_missing: bool,
    /// Delay applied to rules built with the default debounce, in milliseconds.
    /// Zero disables debouncing.
    pub debounce_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let s: EngineSettings = serde_json::from_str(r#"{"debounceMs": 250}"#).unwrap();
        assert_eq!(s.debounce_ms, 250);
        assert!(!s.fill_missing);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(EngineSettings {
            fill_missing: true,
            debounce_ms: 10,
        })
        .unwrap();
        assert_eq!(json["fillMissing"], true);
        assert_eq!(json["debounceMs"], 10);
    }
}
