//! Predicate combinators.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use manner_core::{Message, Result, Status, Validity};
use serde_json::Value;

use crate::predicate::{Predicate, SharedPredicate};

struct All(Vec<SharedPredicate>);

#[async_trait]
impl Predicate for All {
    async fn check(&self, values: &[Value]) -> Result<Status<Validity>> {
        let results = try_join_all(self.0.iter().map(|p| p.check(values))).await?;
        Ok(Status::combine(results))
    }
}

struct AnyOf(Vec<SharedPredicate>);

#[async_trait]
impl Predicate for AnyOf {
    async fn check(&self, values: &[Value]) -> Result<Status<Validity>> {
        let results = try_join_all(self.0.iter().map(|p| p.check(values))).await?;
        if results.iter().any(|s| s.is(Validity::Valid)) {
            return Ok(Status::valid());
        }
        Ok(Status::combine(results))
    }
}

struct Reworded {
    message: Message,
    inner: SharedPredicate,
}

#[async_trait]
impl Predicate for Reworded {
    async fn check(&self, values: &[Value]) -> Result<Status<Validity>> {
        let status = self.inner.check(values).await?;
        if status.is(Validity::Invalid) {
            Ok(Status::invalid(self.message.clone()))
        } else {
            Ok(Status::valid())
        }
    }
}

/// Valid only if every predicate is valid; checks run concurrently.
///
/// The first failure (in argument order) supplies the message.
pub fn and(predicates: Vec<SharedPredicate>) -> SharedPredicate {
    Arc::new(All(predicates))
}

/// Valid if any predicate is valid; checks run concurrently.
///
/// With no predicates at all the result is valid.
pub fn or(predicates: Vec<SharedPredicate>) -> SharedPredicate {
    if predicates.is_empty() {
        return Arc::new(All(Vec::new()));
    }
    Arc::new(AnyOf(predicates))
}

/// Replace the failure message of `predicate`.
pub fn with_message(message: impl Into<Message>, predicate: SharedPredicate) -> SharedPredicate {
    Arc::new(Reworded {
        message: message.into(),
        inner: predicate,
    })
}
