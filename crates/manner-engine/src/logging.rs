//! Logging setup driven by host settings.

use manner_settings::LoggingSettings;

/// Install the stderr subscriber at `settings.level`.
///
/// `RUST_LOG` still takes precedence. Later calls are no-ops, so hosts that
/// install their own subscriber first keep it.
pub fn init_logging(settings: &LoggingSettings) {
    manner_core::logging::init_subscriber(&settings.level);
    tracing::debug!(level = %settings.level, "logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_initializes_once() {
        init_logging(&LoggingSettings {
            level: "debug".into(),
        });
        init_logging(&LoggingSettings::default());
    }
}
