//! # manner-settings
//!
//! Configuration for manner hosts, loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`MannerSettings::default()`]
//! 2. **User file**: `~/.manner/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `MANNER_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! let settings = manner_settings::load_settings().unwrap_or_default();
//! println!("fill missing fields: {}", settings.engine.fill_missing);
//! ```
//!
//! Settings are plain values handed to whoever needs them; there is no
//! process-wide instance.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
