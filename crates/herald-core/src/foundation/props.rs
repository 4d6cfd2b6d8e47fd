//! Property assignment with type coercion.
//!
//! Emitters carry a small bag of named properties. Incoming values are coerced
//! to the type of the property they replace:
//!
//! | Existing kind | Result |
//! |---|---|
//! | number | numeric parse of the incoming value, `0` if it does not parse |
//! | boolean | `true` only for the strings `"true"` and `"1"` |
//! | string | the incoming value's string form |
//! | anything else / undeclared | the incoming value, unchanged |
//!
//! Keys whose incoming value is absent (`None`) are skipped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// The coercion target derived from a property's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropKind {
    Number,
    Boolean,
    Text,
}

impl PropKind {
    /// Returns the kind of an existing value, or `None` when no coercion applies.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Number(_) => Some(Self::Number),
            Value::Bool(_) => Some(Self::Boolean),
            Value::String(_) => Some(Self::Text),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Coerces `raw` to the given kind.
pub fn coerce(kind: Option<PropKind>, raw: Value) -> Value {
    match kind {
        Some(PropKind::Number) => to_number(&raw),
        Some(PropKind::Boolean) => Value::Bool(matches!(raw.as_str(), Some("true" | "1"))),
        Some(PropKind::Text) => match raw {
            Value::String(s) => Value::String(s),
            other => Value::String(other.to_string()),
        },
        None => raw,
    }
}

fn to_number(raw: &Value) -> Value {
    let parsed = match raw {
        Value::Number(n) => return Value::Number(n.clone()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok()
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    };

    match parsed.filter(|n| n.is_finite()) {
        Some(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Value::from(n as i64),
        Some(n) => Number::from_f64(n).map_or_else(|| Value::from(0), Value::Number),
        None => Value::from(0),
    }
}

// ============================================================================
// Props
// ============================================================================

/// An ordered list of property assignments.
///
/// A `None` value marks a key that was passed without a value; it is skipped
/// on assignment and the existing value is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    entries: Vec<(String, Option<Value>)>,
}

impl Props {
    /// Creates an empty set of assignments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((key.into(), Some(value.into())));
        self
    }

    /// Adds a key without a value.
    pub fn without(mut self, key: impl Into<String>) -> Self {
        self.entries.push((key.into(), None));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

impl From<Map<String, Value>> for Props {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().map(|(k, v)| (k, Some(v))).collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<Value>)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, Option<Value>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Props {
    type Item = (String, Option<Value>);
    type IntoIter = std::vec::IntoIter<(String, Option<Value>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ============================================================================
// PropertyBag
// ============================================================================

/// Named properties owned by an emitter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag {
    values: BTreeMap<String, Value>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a property with a default value, fixing its coercion kind.
    pub fn declare(&mut self, key: impl Into<String>, default: impl Into<Value>) -> &mut Self {
        self.values.insert(key.into(), default.into());
        self
    }

    /// Applies assignments, coercing each value against the current one.
    pub fn set(&mut self, props: impl Into<Props>) -> &mut Self {
        for (key, value) in props.into() {
            let Some(raw) = value else {
                continue;
            };
            let kind = self.values.get(&key).and_then(PropKind::of);
            self.values.insert(key, coerce(kind, raw));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_f64()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_number() {
        let kind = Some(PropKind::Number);
        assert_eq!(coerce(kind, json!("1")), json!(1));
        assert_eq!(coerce(kind, json!(" 2.5 ")), json!(2.5));
        assert_eq!(coerce(kind, json!("")), json!(0));
        assert_eq!(coerce(kind, json!("abc")), json!(0));
        assert_eq!(coerce(kind, json!(true)), json!(1));
        assert_eq!(coerce(kind, json!(null)), json!(0));
        assert_eq!(coerce(kind, json!({"a": 1})), json!(0));
        assert_eq!(coerce(kind, json!(7)), json!(7));
    }

    #[test]
    fn test_coerce_boolean() {
        let kind = Some(PropKind::Boolean);
        assert_eq!(coerce(kind, json!("true")), json!(true));
        assert_eq!(coerce(kind, json!("1")), json!(true));
        assert_eq!(coerce(kind, json!(1)), json!(false));
        assert_eq!(coerce(kind, json!(0)), json!(false));
        assert_eq!(coerce(kind, json!(true)), json!(false));
        assert_eq!(coerce(kind, json!("yes")), json!(false));
    }

    #[test]
    fn test_coerce_text() {
        let kind = Some(PropKind::Text);
        assert_eq!(coerce(kind, json!(1)), json!("1"));
        assert_eq!(coerce(kind, json!(false)), json!("false"));
        assert_eq!(coerce(kind, json!("same")), json!("same"));
    }

    #[test]
    fn test_coerce_without_kind_is_identity() {
        assert_eq!(coerce(None, json!({"test": "test"})), json!({"test": "test"}));
        assert_eq!(coerce(None, json!(5)), json!(5));
    }

    #[test]
    fn test_bag_casts_to_declared_types() {
        let mut bag = PropertyBag::new();
        bag.declare("a", 0).declare("b", true).declare("c", "test");

        bag.set(
            Props::new()
                .with("a", "1")
                .with("b", 0)
                .with("c", 1)
                .with("d", json!({"test": "test"})),
        );

        assert_eq!(bag.get("a"), Some(&json!(1)));
        assert_eq!(bag.get_bool("b"), Some(false));
        assert_eq!(bag.get_str("c"), Some("1"));
        assert_eq!(bag.get("d"), Some(&json!({"test": "test"})));
    }

    #[test]
    fn test_bag_skips_absent_values() {
        let mut bag = PropertyBag::new();
        bag.declare("name", "keep");
        bag.set(Props::new().without("name").without("other"));

        assert_eq!(bag.get_str("name"), Some("keep"));
        assert!(!bag.contains("other"));
    }

    #[test]
    fn test_undeclared_value_is_stored_unchanged() {
        let mut bag = PropertyBag::new();
        bag.set(Props::new().with("count", 5));
        assert_eq!(bag.get("count"), Some(&json!(5)));

        // Once present, later assignments coerce against it.
        bag.set(Props::new().with("count", "12"));
        assert_eq!(bag.get_f64("count"), Some(12.0));
    }

    #[test]
    fn test_props_from_json_map() {
        let Value::Object(map) = json!({"x": 1, "y": "two"}) else {
            unreachable!()
        };
        let props = Props::from(map);
        assert_eq!(props.len(), 2);
        assert!(props.iter().all(|(_, v)| v.is_some()));
    }
}
