//! Rule sets: the public evaluation entry point.
//!
//! A rule set owns a list of rules and an [`EvaluationCache`]. Evaluating it
//! against a model slices the model once per rule, brings every rule up to
//! date concurrently, and merges the per-field outputs in declaration order.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use manner_core::{
    Condition, Kind, Model, Result, Status, StatusMap, Validity, merge_status_maps, slice,
};
use manner_settings::EngineSettings;
use tracing::{debug, instrument};

use crate::cache::EvaluationCache;
use crate::rule::{Rule, RuleId};

/// How a rule set reports its results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RuleSetOptions {
    /// Report every watched field, giving fields no rule spoke about the
    /// neutral status.
    pub fill_missing: bool,
    /// Debounce applied to every rule of the set.
    pub debounce: Option<Duration>,
}

impl From<&EngineSettings> for RuleSetOptions {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            fill_missing: settings.fill_missing,
            debounce: (settings.debounce_ms > 0).then(|| Duration::from_millis(settings.debounce_ms)),
        }
    }
}

/// A set of rules evaluated together against a model.
pub struct RuleSet<K: Kind> {
    rules: Arc<[Rule<K>]>,
    field_names: Arc<[String]>,
    options: RuleSetOptions,
    cache: EvaluationCache<K>,
}

/// Rule set producing validity statuses.
pub type Validators = RuleSet<Validity>;

/// Rule set producing condition statuses.
pub type Conditions = RuleSet<Condition>;

impl<K: Kind> RuleSet<K> {
    /// A rule set with default options.
    pub fn new(rules: Vec<Rule<K>>) -> Self {
        Self::with_options(rules, RuleSetOptions::default())
    }

    /// A rule set with explicit options.
    pub fn with_options(rules: Vec<Rule<K>>, options: RuleSetOptions) -> Self {
        let rules: Vec<Rule<K>> = match options.debounce {
            Some(delay) => rules.into_iter().map(|r| r.debounced(delay)).collect(),
            None => rules,
        };

        let mut field_names: Vec<String> = Vec::new();
        for name in rules.iter().flat_map(Rule::field_names) {
            if !field_names.contains(name) {
                field_names.push(name.clone());
            }
        }

        debug!(
            rules = rules.len(),
            fields = field_names.len(),
            fill_missing = options.fill_missing,
            "rule set created"
        );
        Self {
            rules: rules.into(),
            field_names: field_names.into(),
            options,
            cache: EvaluationCache::new(),
        }
    }

    /// A rule set configured from engine settings.
    pub fn from_settings(rules: Vec<Rule<K>>, settings: &EngineSettings) -> Self {
        Self::with_options(rules, settings.into())
    }

    /// Every field any rule reads, deduplicated in first-seen order.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// The rules, in declaration order.
    pub fn rules(&self) -> &[Rule<K>] {
        &self.rules
    }

    /// Options this set was built with.
    pub fn options(&self) -> RuleSetOptions {
        self.options
    }

    /// The cache backing this instance.
    pub fn cache(&self) -> &EvaluationCache<K> {
        &self.cache
    }

    /// A new instance sharing the rules but with an empty cache.
    #[must_use]
    pub fn instantiate(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            field_names: Arc::clone(&self.field_names),
            options: self.options,
            cache: EvaluationCache::new(),
        }
    }

    /// Evaluate every rule against `model` and merge the results.
    pub async fn evaluate<M>(&self, model: &M) -> Result<StatusMap<K>>
    where
        M: Model + Sync + ?Sized,
    {
        self.run(model, None).await
    }

    /// Like [`RuleSet::evaluate`], reporting each freshly evaluated rule's
    /// result to `on_partial` as soon as it settles.
    pub async fn evaluate_with<M, F>(&self, model: &M, on_partial: F) -> Result<StatusMap<K>>
    where
        M: Model + Sync + ?Sized,
        F: Fn(&StatusMap<K>) + Send + Sync,
    {
        self.run(model, Some(&on_partial)).await
    }

    #[instrument(skip_all, fields(rules = self.rules.len()))]
    async fn run<M>(
        &self,
        model: &M,
        on_partial: Option<&(dyn Fn(&StatusMap<K>) + Send + Sync)>,
    ) -> Result<StatusMap<K>>
    where
        M: Model + Sync + ?Sized,
    {
        let updates = self.rules.iter().enumerate().map(|(index, rule)| {
            let input = slice(model, rule.field_names());
            self.cache.update(RuleId::new(index), rule, input, on_partial)
        });
        let results = try_join_all(updates).await?;

        let mut merged = merge_status_maps(results);
        if self.options.fill_missing {
            for name in &*self.field_names {
                let _ = merged.entry(name.clone()).or_insert_with(Status::neutral);
            }
        }
        debug!(fields = merged.len(), "rule set evaluated");
        Ok(merged)
    }
}

impl<K: Kind> fmt::Debug for RuleSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
