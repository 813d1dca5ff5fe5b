//! Locale bundles for rendering status messages.
//!
//! The engine never looks inside a bundle; it is handed to
//! [`Message`](crate::Message) render functions as-is. Predicates use
//! [`LocaleBundle::format`] to look up and fill their templates.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{EngineError, Result};

/// A message template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Template {
    /// Same text regardless of quantity.
    Plain(String),
    /// Singular and plural variants, chosen by the `value` parameter.
    Plural {
        /// Used when `value` is exactly 1.
        one: String,
        /// Used otherwise.
        other: String,
    },
}

/// Category → key → template catalogue for one locale.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleBundle {
    locale: String,
    #[serde(default)]
    categories: BTreeMap<String, BTreeMap<String, Template>>,
}

/// Message catalogue for predicate failures, English.
const ENGLISH_PREDICATES: &[(&str, &str)] = &[
    ("truthy", "Must be set"),
    ("falsy", "Must not be set"),
    ("equal", "Must be \"{value}\""),
    ("notEqual", "Must not be \"{value}\""),
    ("lessThan", "Must be less than {value}"),
    ("atMost", "Must be at most {value}"),
    ("greaterThan", "Must be greater than {value}"),
    ("atLeast", "Must be at least {value}"),
    ("between", "Must be between {a} and {b}"),
    ("empty", "Must be empty not \"{value}\""),
    ("notEmpty", "Cannot be empty"),
    ("notNull", "Must be provided"),
    ("elementOf", "Must be one of: {value}"),
    ("numeric", "Must be a number"),
    ("checked", "Must be checked"),
    ("unchecked", "Must not be checked"),
    ("regex", "Must match {value}"),
];

const ENGLISH_PREDICATE_PLURALS: &[(&str, &str, &str)] = &[
    (
        "lengthOf",
        "Must be exactly {value} character long",
        "Must be exactly {value} characters long",
    ),
    (
        "lengthAtLeast",
        "Must be at least {value} character long",
        "Must be at least {value} characters long",
    ),
    (
        "lengthAtMost",
        "Must be at most {value} character long",
        "Must be at most {value} characters long",
    ),
];

impl LocaleBundle {
    /// A bundle with no templates.
    pub fn empty(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            categories: BTreeMap::new(),
        }
    }

    /// The built-in English catalogue.
    pub fn english() -> Self {
        let mut bundle = Self::empty("en");
        for (key, text) in ENGLISH_PREDICATES {
            bundle.insert("predicates", key, Template::Plain((*text).to_string()));
        }
        for (key, one, other) in ENGLISH_PREDICATE_PLURALS {
            bundle.insert(
                "predicates",
                key,
                Template::Plural {
                    one: (*one).to_string(),
                    other: (*other).to_string(),
                },
            );
        }
        bundle
    }

    /// Parse a bundle from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::Configuration(format!("invalid locale bundle: {e}")))
    }

    /// Read a bundle from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!("cannot read locale bundle {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Locale tag, e.g. `en`.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Add or replace one template.
    pub fn insert(&mut self, category: &str, key: &str, template: Template) {
        let _ = self
            .categories
            .entry(category.to_owned())
            .or_default()
            .insert(key.to_owned(), template);
    }

    /// Overlay another bundle's templates on top of this one.
    ///
    /// The locale tag is taken from `other`.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        for (category, templates) in other.categories {
            let target = self.categories.entry(category).or_default();
            for (key, template) in templates {
                let _ = target.insert(key, template);
            }
        }
        self.locale = other.locale;
        self
    }

    /// Look up a template.
    pub fn template(&self, category: &str, key: &str) -> Option<&Template> {
        self.categories.get(category)?.get(key)
    }

    /// Look up and fill a template. `None` if the category or key is unknown.
    pub fn format(&self, category: &str, key: &str, params: &[(&str, &Value)]) -> Option<String> {
        let Some(template) = self.template(category, key) else {
            tracing::debug!(locale = %self.locale, category, key, "no message template");
            return None;
        };
        let text = match template {
            Template::Plain(text) => text,
            Template::Plural { one, other } => {
                let is_one = params
                    .iter()
                    .find(|(name, _)| *name == "value")
                    .and_then(|(_, v)| v.as_f64())
                    .is_some_and(|n| (n - 1.0).abs() < f64::EPSILON);
                if is_one { one } else { other }
            }
        };

        Some(substitute(text, params))
    }
}

/// Fill `{name}` placeholders in a single pass, so substituted values are
/// never scanned again. Unknown placeholders are left as written.
fn substitute(template: &str, params: &[(&str, &Value)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match params.iter().find(|(param, _)| *param == name) {
            Some((_, value)) => out.push_str(&display_value(value)),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Human-readable rendering of a parameter value.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
