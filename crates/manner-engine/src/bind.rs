//! Binding predicates to fields, and the `any` rule combinator.

use async_trait::async_trait;
use futures::future::try_join_all;
use manner_core::{EngineError, FieldValues, Kind, Result, StatusMap, Validity};
use manner_predicates::SharedPredicate;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::rule::{Evaluator, Rule};

struct Bound {
    field_names: Vec<String>,
    predicate: SharedPredicate,
}

#[async_trait]
impl Evaluator<Validity> for Bound {
    async fn evaluate(
        &self,
        values: &FieldValues,
        _cancel: &CancellationToken,
    ) -> Result<StatusMap<Validity>> {
        let args: Vec<Value> = self
            .field_names
            .iter()
            .map(|name| values.get(name).cloned().unwrap_or(Value::Null))
            .collect();

        let status = self.predicate.check(&args).await?;
        if status.is(Validity::Valid) {
            return Ok(StatusMap::new());
        }
        Ok(self
            .field_names
            .iter()
            .map(|name| (name.clone(), status.clone()))
            .collect())
    }
}

/// A rule checking one field with `predicate`.
///
/// A failure marks the field with the predicate's status; success yields no
/// statuses at all.
pub fn bind_single(field: impl Into<String>, predicate: SharedPredicate) -> Result<Rule<Validity>> {
    bind_many([field.into()], predicate)
}

/// A rule checking several fields together.
///
/// The predicate receives the fields' values positionally. A failure marks
/// every listed field with the same status.
pub fn bind_many<I, S>(fields: I, predicate: SharedPredicate) -> Result<Rule<Validity>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let field_names: Vec<String> = fields.into_iter().map(Into::into).collect();
    Rule::new(
        field_names.clone(),
        Bound {
            field_names,
            predicate,
        },
    )
}

struct AnyOf<K: Kind> {
    rules: Vec<Rule<K>>,
}

#[async_trait]
impl<K: Kind> Evaluator<K> for AnyOf<K> {
    async fn evaluate(
        &self,
        values: &FieldValues,
        cancel: &CancellationToken,
    ) -> Result<StatusMap<K>> {
        let results =
            try_join_all(self.rules.iter().map(|rule| rule.evaluate(values, cancel))).await?;

        if results.iter().any(StatusMap::is_empty) {
            return Ok(StatusMap::new());
        }

        let mut merged = StatusMap::new();
        for result in results {
            merged.extend(result);
        }
        Ok(merged)
    }
}

/// A rule that passes if any child rule reports nothing.
///
/// Children run concurrently over the concatenation of their fields. When
/// every child reports something, their outputs are united with later
/// children overwriting earlier ones per field.
pub fn any<K: Kind>(rules: Vec<Rule<K>>) -> Result<Rule<K>> {
    if rules.is_empty() {
        return Err(EngineError::Configuration(
            "any() needs at least one rule".into(),
        ));
    }
    let field_names: Vec<String> = rules
        .iter()
        .flat_map(|rule| rule.field_names().iter().cloned())
        .collect();
    let name = format!(
        "any({})",
        rules.iter().map(Rule::name).collect::<Vec<_>>().join("|")
    );
    Ok(Rule::new(field_names, AnyOf { rules })?.named(name))
}
