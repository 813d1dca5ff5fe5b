//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`MannerSettings::default()`]
//! 2. If `~/.manner/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::MannerSettings;

/// Longest accepted debounce delay, in milliseconds.
const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Resolve the path to the settings file (`~/.manner/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".manner").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<MannerSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<MannerSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults with the settings file merged over them, without env overrides.
fn load_file_layer(path: &Path) -> Result<MannerSettings> {
    let defaults = serde_json::to_value(MannerSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let settings: MannerSettings = serde_json::from_value(merged)?;
    if settings.engine.debounce_ms > MAX_DEBOUNCE_MS {
        return Err(SettingsError::InvalidValue {
            key: "engine.debounceMs",
            reason: format!(
                "must be at most {MAX_DEBOUNCE_MS}, got {}",
                settings.engine.debounce_ms
            ),
        });
    }
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (file/default value is kept).
pub fn apply_env_overrides(settings: &mut MannerSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`, so the rules are testable
/// without touching the process environment.
fn apply_overrides<F>(settings: &mut MannerSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("MANNER_LOG_LEVEL").filter(|v| !v.is_empty()) {
        settings.logging.level = v;
    }
    if let Some(v) = lookup("MANNER_LOCALE").filter(|v| !v.is_empty()) {
        settings.locale.default = v;
    }
    if let Some(v) = lookup("MANNER_FILL_MISSING") {
        match parse_bool(&v) {
            Some(b) => settings.engine.fill_missing = b,
            None => tracing::warn!(key = "MANNER_FILL_MISSING", value = %v, "invalid boolean env var, ignoring"),
        }
    }
    if let Some(v) = lookup("MANNER_DEBOUNCE_MS") {
        match parse_u64_range(&v, 0, MAX_DEBOUNCE_MS) {
            Some(ms) => settings.engine.debounce_ms = ms,
            None => tracing::warn!(key = "MANNER_DEBOUNCE_MS", value = %v, "invalid u64 env var, ignoring"),
        }
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
