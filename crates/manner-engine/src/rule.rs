//! Rules: named, field-bound asynchronous evaluations.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use manner_core::{EngineError, FieldValues, Kind, Result, StatusMap};
use tokio_util::sync::CancellationToken;

use crate::debounce::Debounced;

/// Identity of a rule inside one rule set.
///
/// Assigned by the owning [`RuleSet`](crate::RuleSet) as the rule's position,
/// so it is stable for the rule's lifetime and never shared across sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

impl RuleId {
    /// Create an id from an arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule#{}", self.0)
    }
}

/// The evaluation function behind a [`Rule`].
///
/// Implementations receive the current values of the rule's fields and
/// return statuses for zero or more fields; a field left out means "no
/// opinion". Long-running implementations should watch `cancel` and return
/// [`EngineError::Cancelled`] once it fires.
#[async_trait]
pub trait Evaluator<K: Kind>: Send + Sync {
    /// Evaluate against the given field values.
    async fn evaluate(
        &self,
        values: &FieldValues,
        cancel: &CancellationToken,
    ) -> Result<StatusMap<K>>;
}

struct FnEvaluator<F>(F);

#[async_trait]
impl<K, F, Fut> Evaluator<K> for FnEvaluator<F>
where
    K: Kind,
    F: Fn(FieldValues) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StatusMap<K>>> + Send,
{
    async fn evaluate(
        &self,
        values: &FieldValues,
        _cancel: &CancellationToken,
    ) -> Result<StatusMap<K>> {
        (self.0)(values.clone()).await
    }
}

/// A field-bound evaluation unit.
///
/// Cheap to clone; clones share the same evaluator.
pub struct Rule<K: Kind> {
    name: String,
    field_names: Vec<String>,
    evaluator: Arc<dyn Evaluator<K>>,
}

impl<K: Kind> Rule<K> {
    /// Bind an evaluator to the fields it reads.
    ///
    /// Fails if `field_names` is empty or contains an empty name.
    pub fn new<I, S, E>(field_names: I, evaluator: E) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        E: Evaluator<K> + 'static,
    {
        Self::from_shared(field_names, Arc::new(evaluator))
    }

    /// Like [`Rule::new`] with an already shared evaluator.
    pub fn from_shared<I, S>(field_names: I, evaluator: Arc<dyn Evaluator<K>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let field_names: Vec<String> = field_names.into_iter().map(Into::into).collect();
        if field_names.is_empty() {
            return Err(EngineError::Configuration(
                "a rule needs at least one field".into(),
            ));
        }
        if field_names.iter().any(String::is_empty) {
            return Err(EngineError::Configuration(
                "field names must not be empty".into(),
            ));
        }
        Ok(Self {
            name: field_names.join(","),
            field_names,
            evaluator,
        })
    }

    /// Bind an async closure to the fields it reads.
    pub fn from_fn<I, S, F, Fut>(field_names: I, f: F) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(FieldValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StatusMap<K>>> + Send + 'static,
    {
        Self::new(field_names, FnEvaluator(f))
    }

    /// Replace the label used in logs and errors.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Delay every evaluation by `delay`, cancellable while waiting.
    #[must_use]
    pub fn debounced(mut self, delay: Duration) -> Self {
        self.evaluator = Arc::new(Debounced::new(delay, self.evaluator));
        self
    }

    /// Label used in logs and errors. Defaults to the joined field names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields this rule reads, in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// The shared evaluator.
    pub fn evaluator(&self) -> &Arc<dyn Evaluator<K>> {
        &self.evaluator
    }

    /// Run the evaluator once, bypassing any cache.
    pub async fn evaluate(
        &self,
        values: &FieldValues,
        cancel: &CancellationToken,
    ) -> Result<StatusMap<K>> {
        self.evaluator.evaluate(values, cancel).await
    }
}

impl<K: Kind> Clone for Rule<K> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            field_names: self.field_names.clone(),
            evaluator: Arc::clone(&self.evaluator),
        }
    }
}

impl<K: Kind> fmt::Debug for Rule<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("field_names", &self.field_names)
            .finish_non_exhaustive()
    }
}
