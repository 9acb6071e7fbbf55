//! Structured document content.
//!
//! [`Content`] is an explicit tagged union over JSON-compatible data. Objects
//! are kept in a `BTreeMap`, so serializing the same content always yields the
//! same bytes and therefore the same blob id.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::error::TypeError;

/// A leaf value inside [`Content`].
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

/// Document payload: a tree of objects, arrays and scalars.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Object(BTreeMap<String, Content>),
    Array(Vec<Content>),
    Scalar(Scalar),
}

impl Content {
    /// An empty object. This is the content of every root revision.
    pub fn empty() -> Self {
        Self::Object(BTreeMap::new())
    }

    /// Returns `true` for an empty object or an empty array.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Object(map) => map.is_empty(),
            Self::Array(items) => items.is_empty(),
            Self::Scalar(_) => false,
        }
    }

    /// Look up a key on an object. Returns `None` for missing keys and for
    /// non-object content.
    pub fn get(&self, key: &str) -> Option<&Content> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Mutable access to a key on an object.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Content> {
        match self {
            Self::Object(map) => map.get_mut(key),
            _ => None,
        }
    }

    /// Set a key on an object, returning the previous value if any.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Content>,
    ) -> Result<Option<Content>, TypeError> {
        match self {
            Self::Object(map) => Ok(map.insert(key.into(), value.into())),
            other => Err(TypeError::WrongShape {
                expected: "object",
                found: other.shape(),
            }),
        }
    }

    /// Element of an array by position.
    pub fn index(&self, i: usize) -> Option<&Content> {
        match self {
            Self::Array(items) => items.get(i),
            _ => None,
        }
    }

    /// Replace the element of an array at position `i`.
    pub fn set_index(&mut self, i: usize, value: impl Into<Content>) -> Result<Content, TypeError> {
        match self {
            Self::Array(items) => {
                let len = items.len();
                let slot = items.get_mut(i).ok_or(TypeError::IndexOutOfBounds { index: i, len })?;
                Ok(std::mem::replace(slot, value.into()))
            }
            other => Err(TypeError::WrongShape {
                expected: "array",
                found: other.shape(),
            }),
        }
    }

    /// Append to an array.
    pub fn push(&mut self, value: impl Into<Content>) -> Result<(), TypeError> {
        match self {
            Self::Array(items) => {
                items.push(value.into());
                Ok(())
            }
            other => Err(TypeError::WrongShape {
                expected: "array",
                found: other.shape(),
            }),
        }
    }

    /// String value of a scalar, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Project into plain nested JSON values.
    pub fn plain(&self) -> Value {
        match self {
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.plain()))
                    .collect(),
            ),
            Self::Array(items) => Value::Array(items.iter().map(Content::plain).collect()),
            Self::Scalar(Scalar::Null) => Value::Null,
            Self::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Self::Scalar(Scalar::Number(n)) => Value::Number(n.clone()),
            Self::Scalar(Scalar::String(s)) => Value::String(s.clone()),
        }
    }

    /// Canonical byte form: JSON with object keys in sorted order.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Decode content from its serialized JSON form.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        serde_json::from_slice(bytes).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Scalar(_) => "scalar",
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.plain())
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Scalar(Scalar::Null),
            Value::Bool(b) => Self::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Self::Scalar(Scalar::Number(n)),
            Value::String(s) => Self::Scalar(Scalar::String(s)),
            Value::Array(items) => Self::Array(items.into_iter().map(Content::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Content::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Self::Scalar(Scalar::String(s))
    }
}

impl From<bool> for Content {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Content {
    fn from(n: i64) -> Self {
        Self::Scalar(Scalar::Number(n.into()))
    }
}

impl From<f64> for Content {
    fn from(n: f64) -> Self {
        // Non-finite floats have no JSON form.
        match Number::from_f64(n) {
            Some(n) => Self::Scalar(Scalar::Number(n)),
            None => Self::Scalar(Scalar::Null),
        }
    }
}

impl<T: Into<Content>> From<Vec<T>> for Content {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Content {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Object(map) => map.serialize(serializer),
            Self::Array(items) => items.serialize(serializer),
            Self::Scalar(scalar) => scalar.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Content::from)
    }
}
