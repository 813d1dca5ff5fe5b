//! Ready-made single-value predicates.
//!
//! Every leaf fails with a message looked up lazily under the `predicates`
//! category of the bundle it is rendered with, so one failed check can be
//! shown in any locale.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use manner_core::{EngineError, LocaleBundle, Message, Result, Status, Validity};
use regex::Regex;
use serde_json::Value;

use crate::predicate::{Predicate, SharedPredicate, first};
use crate::semantics::{as_text, compare, is_truthy, length, strict_eq};

type Test = dyn Fn(&Value) -> bool + Send + Sync;

/// A boolean test paired with its message template key and parameters.
struct Leaf {
    key: &'static str,
    params: Vec<(&'static str, Value)>,
    /// Pass the tested value to the template as `value`.
    echo_input: bool,
    test: Box<Test>,
}

impl Leaf {
    fn shared<F>(key: &'static str, params: Vec<(&'static str, Value)>, test: F) -> SharedPredicate
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Arc::new(Self {
            key,
            params,
            echo_input: false,
            test: Box::new(test),
        })
    }

    fn failure(&self, input: &Value) -> Status<Validity> {
        let key = self.key;
        let mut params = self.params.clone();
        if self.echo_input {
            params.push(("value", input.clone()));
        }
        Status::invalid(Message::new(move |bundle: &LocaleBundle| {
            let refs: Vec<(&str, &Value)> = params.iter().map(|(k, v)| (*k, v)).collect();
            bundle.format("predicates", key, &refs)
        }))
    }
}

#[async_trait]
impl Predicate for Leaf {
    async fn check(&self, values: &[Value]) -> Result<Status<Validity>> {
        let input = first(values);
        if (self.test)(input) {
            Ok(Status::valid())
        } else {
            Ok(self.failure(input))
        }
    }
}

fn ordered(expected: Value, key: &'static str, accept: fn(Ordering) -> bool) -> SharedPredicate {
    let bound = expected.clone();
    Leaf::shared(key, vec![("value", expected)], move |v| {
        compare(v, &bound).is_some_and(accept)
    })
}

/// Value is truthy.
pub fn truthy() -> SharedPredicate {
    Leaf::shared("truthy", Vec::new(), is_truthy)
}

/// Value is falsy.
pub fn falsy() -> SharedPredicate {
    Leaf::shared("falsy", Vec::new(), |v| !is_truthy(v))
}

/// Strictly equal to `expected`.
pub fn equal(expected: impl Into<Value>) -> SharedPredicate {
    let expected = expected.into();
    let bound = expected.clone();
    Leaf::shared("equal", vec![("value", expected)], move |v| {
        strict_eq(&bound, v)
    })
}

/// Not strictly equal to `expected`.
pub fn not_equal(expected: impl Into<Value>) -> SharedPredicate {
    let expected = expected.into();
    let bound = expected.clone();
    Leaf::shared("notEqual", vec![("value", expected)], move |v| {
        !strict_eq(&bound, v)
    })
}

/// Less than `expected`.
pub fn less_than(expected: impl Into<Value>) -> SharedPredicate {
    ordered(expected.into(), "lessThan", Ordering::is_lt)
}

/// Less than or equal to `expected`.
pub fn at_most(expected: impl Into<Value>) -> SharedPredicate {
    ordered(expected.into(), "atMost", Ordering::is_le)
}

/// Greater than `expected`.
pub fn greater_than(expected: impl Into<Value>) -> SharedPredicate {
    ordered(expected.into(), "greaterThan", Ordering::is_gt)
}

/// Greater than or equal to `expected`.
pub fn at_least(expected: impl Into<Value>) -> SharedPredicate {
    ordered(expected.into(), "atLeast", Ordering::is_ge)
}

/// Between `a` and `b`, inclusive.
pub fn between(a: impl Into<Value>, b: impl Into<Value>) -> SharedPredicate {
    let (a, b) = (a.into(), b.into());
    let (lo, hi) = (a.clone(), b.clone());
    Leaf::shared("between", vec![("a", a), ("b", b)], move |v| {
        compare(v, &lo).is_some_and(Ordering::is_ge) && compare(v, &hi).is_some_and(Ordering::is_le)
    })
}

/// `null`, or a string/array of length zero.
pub fn empty() -> SharedPredicate {
    Arc::new(Leaf {
        key: "empty",
        params: Vec::new(),
        echo_input: true,
        test: Box::new(|v: &Value| v.is_null() || length(v) == Some(0)),
    })
}

/// A string/array with at least one element.
pub fn not_empty() -> SharedPredicate {
    Leaf::shared("notEmpty", Vec::new(), |v| length(v).is_some_and(|n| n > 0))
}

/// Anything but `null`.
pub fn not_null() -> SharedPredicate {
    Leaf::shared("notNull", Vec::new(), |v| !v.is_null())
}

/// Length is exactly `n`.
pub fn length_of(n: usize) -> SharedPredicate {
    Leaf::shared("lengthOf", vec![("value", Value::from(n))], move |v| {
        length(v) == Some(n)
    })
}

/// Length is at least `n`.
pub fn length_at_least(n: usize) -> SharedPredicate {
    Leaf::shared("lengthAtLeast", vec![("value", Value::from(n))], move |v| {
        length(v).is_some_and(|len| len >= n)
    })
}

/// Length is at most `n`.
pub fn length_at_most(n: usize) -> SharedPredicate {
    Leaf::shared("lengthAtMost", vec![("value", Value::from(n))], move |v| {
        length(v).is_some_and(|len| len <= n)
    })
}

/// One of the given values.
pub fn element_of<I, V>(allowed: I) -> SharedPredicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
    let bound = allowed.clone();
    Leaf::shared("elementOf", vec![("value", Value::Array(allowed))], move |v| {
        bound.iter().any(|a| strict_eq(a, v))
    })
}

/// A number or a string made only of digits.
pub fn numeric() -> SharedPredicate {
    Leaf::shared("numeric", Vec::new(), |v| {
        as_text(v).is_some_and(|s| s.chars().all(|c| c.is_ascii_digit()))
    })
}

/// A string or number matching `pattern`.
///
/// An invalid pattern is a configuration error, reported at construction.
pub fn matches(pattern: &str) -> Result<SharedPredicate> {
    let re = Regex::new(pattern)
        .map_err(|e| EngineError::Configuration(format!("invalid pattern '{pattern}': {e}")))?;
    Ok(Leaf::shared(
        "regex",
        vec![("value", Value::from(pattern))],
        move |v| as_text(v).is_some_and(|s| re.is_match(&s)),
    ))
}

/// Exactly `true`.
pub fn checked() -> SharedPredicate {
    Leaf::shared("checked", Vec::new(), |v| v == &Value::Bool(true))
}

/// Exactly `false`.
pub fn unchecked() -> SharedPredicate {
    Leaf::shared("unchecked", Vec::new(), |v| v == &Value::Bool(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    async fn passes(p: &SharedPredicate, v: Value) -> bool {
        p.check(&[v]).await.unwrap().is(Validity::Valid)
    }

    async fn message(p: &SharedPredicate, v: Value) -> Option<String> {
        p.check(&[v])
            .await
            .unwrap()
            .render(&LocaleBundle::english())
    }

    #[tokio::test]
    async fn truthy_and_falsy() {
        assert!(passes(&truthy(), json!(1)).await);
        assert!(!passes(&truthy(), json!(0)).await);
        assert!(passes(&falsy(), Value::Null).await);
        assert!(!passes(&falsy(), json!([1])).await);
    }

    #[tokio::test]
    async fn equality() {
        assert!(!passes(&equal(Value::Null), json!(false)).await);
        assert!(!passes(&equal("42"), json!(42)).await);
        assert!(passes(&not_equal("42"), json!(42)).await);
        assert_eq!(
            message(&equal("hello"), json!("nope")).await.as_deref(),
            Some("Must be \"hello\"")
        );
    }

    #[tokio::test]
    async fn ordering() {
        assert!(passes(&less_than(10), json!(9)).await);
        assert!(!passes(&less_than(10), json!(10)).await);
        assert!(passes(&at_most(10), json!(10)).await);
        assert!(!passes(&at_most(10), json!(11)).await);
        assert!(passes(&greater_than(10), json!(11)).await);
        assert!(!passes(&greater_than(10), json!(10)).await);
        assert!(passes(&at_least(10), json!(10)).await);
        assert!(!passes(&at_least(10), json!(9)).await);
        assert!(!passes(&at_least(0), Value::Null).await);
    }

    #[tokio::test]
    async fn at_least_message() {
        assert_eq!(
            message(&at_least(18), json!(16)).await.as_deref(),
            Some("Must be at least 18")
        );
    }

    #[tokio::test]
    async fn between_is_inclusive() {
        let p = between(1, 3);
        assert!(passes(&p, json!(1)).await);
        assert!(passes(&p, json!(2)).await);
        assert!(passes(&p, json!(3)).await);
        assert!(!passes(&p, json!(0)).await);
        assert!(!passes(&p, json!(4)).await);
        assert_eq!(
            message(&p, json!(4)).await.as_deref(),
            Some("Must be between 1 and 3")
        );
    }

    #[tokio::test]
    async fn emptiness() {
        assert!(passes(&empty(), Value::Null).await);
        assert!(passes(&empty(), json!("")).await);
        assert!(passes(&empty(), json!([])).await);
        assert!(!passes(&empty(), json!(0)).await);
        assert!(!passes(&empty(), json!([[]])).await);
        assert!(!passes(&empty(), json!({})).await);
        assert!(passes(&not_empty(), json!("a")).await);
        assert!(!passes(&not_empty(), Value::Null).await);
        assert!(!passes(&not_empty(), json!(0)).await);
    }

    #[tokio::test]
    async fn empty_echoes_input() {
        assert_eq!(
            message(&empty(), json!("abc")).await.as_deref(),
            Some("Must be empty not \"abc\"")
        );
    }

    #[tokio::test]
    async fn not_null_accepts_empty_string() {
        assert!(passes(&not_null(), json!("")).await);
        assert!(!passes(&not_null(), Value::Null).await);
    }

    #[tokio::test]
    async fn lengths() {
        assert!(passes(&length_of(3), json!("abc")).await);
        assert!(!passes(&length_of(3), json!("ab")).await);
        assert!(passes(&length_at_least(2), json!([1, 2])).await);
        assert!(!passes(&length_at_most(1), json!([1, 2])).await);
        assert_eq!(
            message(&length_of(1), json!("ab")).await.as_deref(),
            Some("Must be exactly 1 character long")
        );
    }

    #[tokio::test]
    async fn membership() {
        let p = element_of(["a", "b"]);
        assert!(passes(&p, json!("a")).await);
        assert!(!passes(&p, json!("c")).await);
        assert_eq!(
            message(&p, json!("c")).await.as_deref(),
            Some("Must be one of: a, b")
        );
    }

    #[tokio::test]
    async fn numeric_values() {
        assert!(passes(&numeric(), json!("0123")).await);
        assert!(passes(&numeric(), json!(42)).await);
        assert!(!passes(&numeric(), json!("4a")).await);
        assert!(!passes(&numeric(), json!(4.5)).await);
        assert!(!passes(&numeric(), json!(true)).await);
    }

    #[tokio::test]
    async fn pattern_matching() {
        let p = matches(r"^[A-Z]{2}\d+$").unwrap();
        assert!(passes(&p, json!("AB12")).await);
        assert!(!passes(&p, json!("ab12")).await);
    }

    #[test]
    fn invalid_pattern_fails_fast() {
        assert_matches!(matches("(").err(), Some(EngineError::Configuration(_)));
    }

    #[tokio::test]
    async fn checkboxes() {
        assert!(passes(&checked(), json!(true)).await);
        assert!(!passes(&checked(), json!(1)).await);
        assert!(passes(&unchecked(), json!(false)).await);
        assert!(!passes(&unchecked(), Value::Null).await);
    }
}
