//! Status kinds and the immutable [`Status`] value.
//!
//! A status is the outcome a rule assigns to one field. Two domains exist:
//! [`Validity`] for validators and [`Condition`] for visibility/enablement.
//! Each kind enumeration declares its own dominance order and neutral kind,
//! which is all the [combiner](crate::combine) needs to know about it.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::i18n::LocaleBundle;

/// A closed set of status kinds for one domain.
pub trait Kind: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Every kind of the domain, most dominant first.
    const PRIORITY: &'static [Self];

    /// Kind of the status assumed for a field nobody has an opinion on.
    const NEUTRAL: Self;

    /// Position of `self` in [`Kind::PRIORITY`] (lower is more dominant).
    ///
    /// Kinds missing from the order rank below every listed kind.
    fn rank(self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|k| *k == self)
            .unwrap_or(Self::PRIORITY.len())
    }
}

/// Validity of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    /// The field passed every check.
    Valid,
    /// At least one check failed.
    Invalid,
}

impl Kind for Validity {
    const PRIORITY: &'static [Self] = &[Self::Invalid, Self::Valid];
    const NEUTRAL: Self = Self::Valid;
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Visibility and enablement of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Shown and enabled.
    Normal,
    /// Shown but not editable.
    Disabled,
    /// Not shown at all.
    Hidden,
}

impl Kind for Condition {
    const PRIORITY: &'static [Self] = &[Self::Hidden, Self::Disabled, Self::Normal];
    const NEUTRAL: Self = Self::Normal;
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Disabled => write!(f, "disabled"),
            Self::Hidden => write!(f, "hidden"),
        }
    }
}

type RenderFn = dyn Fn(&LocaleBundle) -> Option<String> + Send + Sync;

/// A message rendered on demand against a [`LocaleBundle`].
///
/// Stored unevaluated so one status can be shown in several locales
/// without re-running the rule that produced it.
#[derive(Clone)]
pub struct Message(Arc<RenderFn>);

impl Message {
    /// Wrap a render function.
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&LocaleBundle) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(render))
    }

    /// A message that renders to the same text in every locale.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Some(text.clone()))
    }

    /// Render against a bundle.
    pub fn render(&self, bundle: &LocaleBundle) -> Option<String> {
        (self.0)(bundle)
    }

    /// Whether two handles share the same render function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Message(..)")
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

/// The outcome a rule assigns to a single field.
#[derive(Clone, Debug)]
pub struct Status<K: Kind> {
    kind: K,
    message: Option<Message>,
}

/// Status in the validity domain.
pub type ValidityStatus = Status<Validity>;

/// Status in the condition domain.
pub type ConditionStatus = Status<Condition>;

impl<K: Kind> Status<K> {
    /// Create a status without a message.
    #[must_use]
    pub fn new(kind: K) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Create a status carrying a message.
    #[must_use]
    pub fn with_message(kind: K, message: impl Into<Message>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// The domain's neutral status.
    #[must_use]
    pub fn neutral() -> Self {
        Self::new(K::NEUTRAL)
    }

    /// Kind of this status.
    pub fn kind(&self) -> K {
        self.kind
    }

    /// Whether this status has the given kind.
    pub fn is(&self, kind: K) -> bool {
        self.kind == kind
    }

    /// The unevaluated message, if any.
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    /// Render the message against a bundle. `None` when there is no message.
    pub fn render(&self, bundle: &LocaleBundle) -> Option<String> {
        self.message.as_ref().and_then(|m| m.render(bundle))
    }
}

impl Status<Validity> {
    /// A valid status.
    #[must_use]
    pub fn valid() -> Self {
        Self::new(Validity::Valid)
    }

    /// An invalid status with a reason.
    #[must_use]
    pub fn invalid(message: impl Into<Message>) -> Self {
        Self::with_message(Validity::Invalid, message)
    }
}

impl Status<Condition> {
    /// Shown and enabled.
    #[must_use]
    pub fn normal() -> Self {
        Self::new(Condition::Normal)
    }

    /// Shown but disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Condition::Disabled)
    }

    /// Hidden.
    #[must_use]
    pub fn hidden() -> Self {
        Self::new(Condition::Hidden)
    }
}

impl<K: Kind> PartialEq for Status<K> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && match (&self.message, &other.message) {
                (None, None) => true,
                (Some(a), Some(b)) => a.ptr_eq(b),
                _ => false,
            }
    }
}

impl<K: Kind> From<K> for Status<K> {
    fn from(kind: K) -> Self {
        Self::new(kind)
    }
}
