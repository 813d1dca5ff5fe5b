//! Field values, status maps and the model accessor.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::status::Status;

/// Values of the fields a rule depends on, keyed by field name.
///
/// Equality is deep and independent of insertion order, which is what the
/// evaluation cache compares inputs with. Values built by [`slice`] have
/// integral floats normalized to integers, so `1` and `1.0` compare equal.
pub type FieldValues = BTreeMap<String, Value>;

/// Per-field statuses produced by a rule or a rule set.
pub type StatusMap<K> = BTreeMap<String, Status<K>>;

/// Read-only key→value access to the data being evaluated.
///
/// Fields the model does not know read as [`Value::Null`].
pub trait Model {
    /// Current value of a field.
    fn get(&self, field: &str) -> Value;
}

impl Model for HashMap<String, Value> {
    fn get(&self, field: &str) -> Value {
        HashMap::get(self, field).cloned().unwrap_or(Value::Null)
    }
}

impl Model for BTreeMap<String, Value> {
    fn get(&self, field: &str) -> Value {
        BTreeMap::get(self, field).cloned().unwrap_or(Value::Null)
    }
}

impl Model for serde_json::Map<String, Value> {
    fn get(&self, field: &str) -> Value {
        serde_json::Map::get(self, field)
            .cloned()
            .unwrap_or(Value::Null)
    }
}

impl Model for Value {
    fn get(&self, field: &str) -> Value {
        match self {
            Value::Object(map) => Model::get(map, field),
            _ => Value::Null,
        }
    }
}

impl<M: Model + ?Sized> Model for &M {
    fn get(&self, field: &str) -> Value {
        (**self).get(field)
    }
}

/// Copy the named fields out of a model into a fresh mapping.
///
/// Repeated names collapse into a single entry. Numbers are normalized so
/// that equal values compare equal whatever their JSON representation.
pub fn slice<M, S>(model: &M, field_names: &[S]) -> FieldValues
where
    M: Model + ?Sized,
    S: AsRef<str>,
{
    field_names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            (name.to_owned(), normalize(model.get(name)))
        })
        .collect()
}

/// Rewrite integral floats as integers, recursively.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn normalize(value: Value) -> Value {
    match value {
        Value::Number(n) if !n.is_i64() && !n.is_u64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Value::from(f as i64)
            }
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize(value)))
                .collect(),
        ),
        other => other,
    }
}
