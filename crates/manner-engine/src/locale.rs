//! Resolving the message bundle a host renders statuses with.

use std::path::Path;

use manner_core::{LocaleBundle, Result};
use manner_settings::LocaleSettings;
use tracing::debug;

/// The built-in English messages, tagged with the configured locale and
/// overlaid with the configured bundle file, if any.
///
/// Keys missing from the file keep their English text.
pub fn load_bundle(settings: &LocaleSettings) -> Result<LocaleBundle> {
    let bundle = LocaleBundle::english().merge(LocaleBundle::empty(settings.default.as_str()));
    match &settings.bundle_path {
        Some(path) => {
            debug!(path = %path, locale = %settings.default, "loading locale bundle");
            Ok(bundle.merge(LocaleBundle::from_path(Path::new(path))?))
        }
        None => Ok(bundle),
    }
}
