//! Dynamic value model shared by example encoding, schema inference and link detection.
//!
//! Every typed example is encoded into an [`AnyValue`] before it is inspected. Objects keep
//! the insertion order of the encoder (struct field order), which keeps diff results and
//! generated documents stable across runs.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A decoded value: object, array, string, number, boolean or null.
///
/// Equality is structural. Object comparison ignores key order, array comparison does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnyValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integer above `i64::MAX`
    UInt(u64),
    Double(f64),
    String(String),
    Array(Vec<AnyValue>),
    Object(IndexMap<String, AnyValue>),
}

/// Encodes any serializable value into an [`AnyValue`].
///
/// # Errors
///
/// Returns [`Error::EncodingError`] when the value's serialization cannot be represented,
/// for example a map whose keys do not serialize to strings.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<AnyValue> {
    serde_json::to_value(value)
        .map(AnyValue::from)
        .map_err(|e| Error::EncodingError(e.to_string()))
}

impl AnyValue {
    /// Builds an object from key/value pairs, keeping their order.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, AnyValue)>,
    {
        AnyValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AnyValue::Null)
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, AnyValue>> {
        match self {
            AnyValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up the value at a key path. Array elements are addressed by their index.
    pub fn value_at<S: AsRef<str>>(&self, path: &[S]) -> Option<&AnyValue> {
        let mut current = self;
        for segment in path {
            let segment = segment.as_ref();
            current = match current {
                AnyValue::Object(map) => map.get(segment)?,
                AnyValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Returns the dotted path to the first point where `self` and `other` diverge, or an
    /// empty string when they are equal.
    ///
    /// ```
    /// use openapi_from_routes::any_value::AnyValue;
    ///
    /// let a = AnyValue::object([("a", AnyValue::Int(1)), ("c", AnyValue::Bool(true))]);
    /// let b = AnyValue::object([("a", AnyValue::Int(1)), ("c", AnyValue::Bool(false))]);
    /// assert_eq!(a.first_different_key(&b), "c");
    /// ```
    pub fn first_different_key(&self, other: &AnyValue) -> String {
        self.first_different_path(other).join(".")
    }

    /// Segment form of [`first_different_key`](Self::first_different_key).
    ///
    /// Within one container the first differing key is located before recursing into it.
    /// A key present on one side only is itself the divergence point, and so is the first
    /// missing index when two arrays differ in length.
    pub fn first_different_path(&self, other: &AnyValue) -> Vec<String> {
        match (self, other) {
            (AnyValue::Object(lhs), AnyValue::Object(rhs)) => {
                let keys = lhs
                    .keys()
                    .chain(rhs.keys().filter(|key| !lhs.contains_key(*key)));
                for key in keys {
                    match (lhs.get(key), rhs.get(key)) {
                        (Some(l), Some(r)) if l == r => continue,
                        (Some(l), Some(r)) => {
                            let mut path = vec![key.clone()];
                            path.extend(l.first_different_path(r));
                            return path;
                        }
                        _ => return vec![key.clone()],
                    }
                }
                Vec::new()
            }
            (AnyValue::Array(lhs), AnyValue::Array(rhs)) => {
                for (index, (l, r)) in lhs.iter().zip(rhs).enumerate() {
                    if l != r {
                        let mut path = vec![index.to_string()];
                        path.extend(l.first_different_path(r));
                        return path;
                    }
                }
                if lhs.len() != rhs.len() {
                    return vec![lhs.len().min(rhs.len()).to_string()];
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Depth-first search for a key, returning the keys and indices that lead to it.
    ///
    /// A numeric `key` also matches an existing array index. Returns an empty path when the
    /// key does not occur anywhere in the structure.
    pub fn path_up_to_key(&self, key: &str) -> Vec<String> {
        match self {
            AnyValue::Object(map) => {
                if map.contains_key(key) {
                    return vec![key.to_string()];
                }
                for (k, value) in map {
                    let path = value.path_up_to_key(key);
                    if !path.is_empty() {
                        return prepend(k.clone(), path);
                    }
                }
                Vec::new()
            }
            AnyValue::Array(items) => {
                if key.parse::<usize>().map_or(false, |index| index < items.len()) {
                    return vec![key.to_string()];
                }
                for (index, item) in items.iter().enumerate() {
                    let path = item.path_up_to_key(key);
                    if !path.is_empty() {
                        return prepend(index.to_string(), path);
                    }
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Depth-first search for a value equal to `target`, returning the path that leads to it.
    pub fn path_up_to_value(&self, target: &AnyValue) -> Vec<String> {
        match self {
            AnyValue::Object(map) => {
                if let Some((key, _)) = map.iter().find(|(_, value)| *value == target) {
                    return vec![key.clone()];
                }
                for (key, value) in map {
                    let path = value.path_up_to_value(target);
                    if !path.is_empty() {
                        return prepend(key.clone(), path);
                    }
                }
                Vec::new()
            }
            AnyValue::Array(items) => {
                if let Some(index) = items.iter().position(|item| item == target) {
                    return vec![index.to_string()];
                }
                for (index, item) in items.iter().enumerate() {
                    let path = item.path_up_to_value(target);
                    if !path.is_empty() {
                        return prepend(index.to_string(), path);
                    }
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}

fn prepend(head: String, tail: Vec<String>) -> Vec<String> {
    let mut path = Vec::with_capacity(tail.len() + 1);
    path.push(head);
    path.extend(tail);
    path
}

impl From<serde_json::Value> for AnyValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AnyValue::Null,
            serde_json::Value::Bool(b) => AnyValue::Bool(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => AnyValue::Int(i),
                (None, Some(u)) => AnyValue::UInt(u),
                (None, None) => AnyValue::Double(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => AnyValue::String(s),
            serde_json::Value::Array(items) => {
                AnyValue::Array(items.into_iter().map(AnyValue::from).collect())
            }
            serde_json::Value::Object(map) => {
                AnyValue::Object(map.into_iter().map(|(k, v)| (k, AnyValue::from(v))).collect())
            }
        }
    }
}

impl From<bool> for AnyValue {
    fn from(value: bool) -> Self {
        AnyValue::Bool(value)
    }
}

impl From<i64> for AnyValue {
    fn from(value: i64) -> Self {
        AnyValue::Int(value)
    }
}

impl From<f64> for AnyValue {
    fn from(value: f64) -> Self {
        AnyValue::Double(value)
    }
}

impl From<&str> for AnyValue {
    fn from(value: &str) -> Self {
        AnyValue::String(value.to_string())
    }
}

impl From<String> for AnyValue {
    fn from(value: String) -> Self {
        AnyValue::String(value)
    }
}
