//! Condition rules: predicate-driven visibility and enablement.
//!
//! A condition rule evaluates a validity rule and maps its outcome through
//! one or more [`Action`]s. The predicate "succeeds" when it reports no
//! statuses at all.

use async_trait::async_trait;
use manner_core::{
    Condition, EngineError, FieldValues, Message, Result, Status, StatusMap, Validity,
    merge_status_maps,
};
use tokio_util::sync::CancellationToken;

use crate::rule::{Evaluator, Rule};

/// Maps a predicate outcome onto condition statuses for a set of fields.
#[derive(Clone, Debug)]
pub struct Action {
    field_names: Vec<String>,
    on_success: Condition,
    on_failure: Condition,
    message: Option<Message>,
}

impl Action {
    fn new<I, S>(fields: I, on_success: Condition, on_failure: Condition) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_names: fields.into_iter().map(Into::into).collect(),
            on_success,
            on_failure,
            message: None,
        }
    }

    /// Attach a reason to the statuses this action produces.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<Message>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Fields this action assigns.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Statuses for every target field given the predicate outcome.
    pub fn apply(&self, success: bool) -> StatusMap<Condition> {
        let kind = if success {
            self.on_success
        } else {
            self.on_failure
        };
        let status = match &self.message {
            Some(message) => Status::with_message(kind, message.clone()),
            None => Status::new(kind),
        };
        self.field_names
            .iter()
            .map(|name| (name.clone(), status.clone()))
            .collect()
    }
}

/// Hide `fields` when the predicate succeeds, otherwise leave them normal.
pub fn hide<I, S>(fields: I) -> Action
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Action::new(fields, Condition::Hidden, Condition::Normal)
}

/// Show `fields` when the predicate succeeds, otherwise hide them.
pub fn show<I, S>(fields: I) -> Action
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Action::new(fields, Condition::Normal, Condition::Hidden)
}

/// Disable `fields` when the predicate succeeds, otherwise leave them normal.
pub fn disable<I, S>(fields: I) -> Action
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Action::new(fields, Condition::Disabled, Condition::Normal)
}

/// Enable `fields` when the predicate succeeds, otherwise disable them.
pub fn enable<I, S>(fields: I) -> Action
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Action::new(fields, Condition::Normal, Condition::Disabled)
}

struct When {
    predicate: Rule<Validity>,
    actions: Vec<Action>,
}

#[async_trait]
impl Evaluator<Condition> for When {
    async fn evaluate(
        &self,
        values: &FieldValues,
        cancel: &CancellationToken,
    ) -> Result<StatusMap<Condition>> {
        let outcome = self.predicate.evaluate(values, cancel).await?;
        let success = outcome.is_empty();
        Ok(merge_status_maps(
            self.actions.iter().map(|action| action.apply(success)),
        ))
    }
}

/// A condition rule applying `actions` according to `predicate`.
///
/// The rule reads the predicate rule's fields. When several actions target
/// the same field, the most dominant condition wins.
pub fn when(predicate: Rule<Validity>, actions: Vec<Action>) -> Result<Rule<Condition>> {
    if actions.is_empty() {
        return Err(EngineError::Configuration(
            "when() needs at least one action".into(),
        ));
    }
    if let Some(action) = actions
        .iter()
        .find(|a| a.field_names.is_empty() || a.field_names.iter().any(String::is_empty))
    {
        return Err(EngineError::Configuration(format!(
            "action targets invalid fields: {:?}",
            action.field_names
        )));
    }
    let name = format!("when({})", predicate.name());
    let field_names = predicate.field_names().to_vec();
    Ok(Rule::new(field_names, When { predicate, actions })?.named(name))
}
