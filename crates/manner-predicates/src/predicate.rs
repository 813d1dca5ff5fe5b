//! The [`Predicate`] trait and closure adapters.

use std::sync::Arc;

use async_trait::async_trait;
use manner_core::{Message, Result, Status, Validity};
use serde_json::Value;

/// A check over one or more field values.
///
/// Values arrive positionally, in the order the predicate was bound to its
/// fields. Single-field predicates look at the first value only; a missing
/// value reads as `null`.
#[async_trait]
pub trait Predicate: Send + Sync {
    /// Check the values. Failures are reported as an invalid status, not an error;
    /// `Err` is reserved for predicates that cannot run at all.
    async fn check(&self, values: &[Value]) -> Result<Status<Validity>>;
}

/// Predicate shared between rules.
pub type SharedPredicate = Arc<dyn Predicate>;

/// First positional value, or `null`.
pub(crate) fn first(values: &[Value]) -> &Value {
    values.first().unwrap_or(&Value::Null)
}

struct FnPredicate<F>(F);

#[async_trait]
impl<F> Predicate for FnPredicate<F>
where
    F: Fn(&[Value]) -> Status<Validity> + Send + Sync,
{
    async fn check(&self, values: &[Value]) -> Result<Status<Validity>> {
        Ok((self.0)(values))
    }
}

/// Adapt a synchronous status-returning closure.
pub fn from_fn<F>(f: F) -> SharedPredicate
where
    F: Fn(&[Value]) -> Status<Validity> + Send + Sync + 'static,
{
    Arc::new(FnPredicate(f))
}

/// Adapt a single-value boolean test; `false` yields `message`.
pub fn from_bool<F>(test: F, message: impl Into<Message>) -> SharedPredicate
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    let message = message.into();
    from_fn(move |values| {
        if test(first(values)) {
            Status::valid()
        } else {
            Status::invalid(message.clone())
        }
    })
}

/// Adapt a multi-value boolean test, e.g. "both passwords match".
pub fn multi<F>(test: F, message: impl Into<Message>) -> SharedPredicate
where
    F: Fn(&[Value]) -> bool + Send + Sync + 'static,
{
    let message = message.into();
    from_fn(move |values| {
        if test(values) {
            Status::valid()
        } else {
            Status::invalid(message.clone())
        }
    })
}
