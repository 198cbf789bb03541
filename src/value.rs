//! Tri-state attribute values.
//!
//! Every attribute the host sends is either null, unknown (its value will
//! only be known after apply), or known. Resource models use [`Attr`] for
//! each field so the three cases never collapse into one another.
//!
//! On the wire, unknown values are the string [`UNKNOWN_VALUE`].

use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ProviderError;

/// The marker the host uses in JSON for a value that is not yet known.
pub const UNKNOWN_VALUE: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

/// Returns the JSON encoding of an unknown value.
pub fn unknown() -> Value {
    Value::String(UNKNOWN_VALUE.to_string())
}

/// Whether a JSON value is the unknown marker.
pub fn is_unknown(value: &Value) -> bool {
    matches!(value, Value::String(s) if s == UNKNOWN_VALUE)
}

/// Whether a JSON value contains the unknown marker anywhere inside it.
pub fn contains_unknown(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().any(contains_unknown),
        Value::Object(map) => map.values().any(contains_unknown),
        other => is_unknown(other),
    }
}

/// An attribute value as seen in a plan, config or state.
#[derive(Clone, PartialEq, Eq)]
pub enum Attr<T> {
    /// The attribute is absent.
    Null,
    /// The attribute will be known after apply.
    Unknown,
    /// The attribute has a concrete value.
    Known(T),
}

impl<T> Default for Attr<T> {
    fn default() -> Self {
        Attr::Null
    }
}

impl<T: fmt::Debug> fmt::Debug for Attr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Null => f.write_str("null"),
            Attr::Unknown => f.write_str("(known after apply)"),
            Attr::Known(v) => v.fmt(f),
        }
    }
}

impl<T> Attr<T> {
    /// Returns `true` if the attribute is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Attr::Null)
    }

    /// Returns `true` if the attribute is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Attr::Unknown)
    }

    /// Returns `true` if the attribute has a concrete value.
    pub fn is_known(&self) -> bool {
        matches!(self, Attr::Known(_))
    }

    /// Borrow the known value, if any.
    pub fn known(&self) -> Option<&T> {
        match self {
            Attr::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Take the known value, if any.
    pub fn into_known(self) -> Option<T> {
        match self {
            Attr::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Map the known value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attr<U> {
        match self {
            Attr::Null => Attr::Null,
            Attr::Unknown => Attr::Unknown,
            Attr::Known(v) => Attr::Known(f(v)),
        }
    }

    /// The value of a required attribute.
    ///
    /// Null and unknown are both errors naming the attribute.
    pub fn require(self, attribute: &str) -> Result<T, ProviderError> {
        match self {
            Attr::Known(v) => Ok(v),
            Attr::Null => Err(ProviderError::Validation(format!(
                "attribute '{}' is required",
                attribute
            ))),
            Attr::Unknown => Err(unknown_error(attribute)),
        }
    }

    /// The value of an optional attribute: `None` when null.
    ///
    /// An unknown value is an error, since it cannot be sent downstream.
    pub fn optional(self, attribute: &str) -> Result<Option<T>, ProviderError> {
        match self {
            Attr::Known(v) => Ok(Some(v)),
            Attr::Null => Ok(None),
            Attr::Unknown => Err(unknown_error(attribute)),
        }
    }
}

impl<T> From<Option<T>> for Attr<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Attr::Known(v),
            None => Attr::Null,
        }
    }
}

impl Attr<String> {
    /// A known string, or null when the string is empty.
    ///
    /// Proto3 cannot tell an unset string from an empty one; state mirrors
    /// that by storing null.
    pub fn non_empty(value: String) -> Self {
        if value.is_empty() {
            Attr::Null
        } else {
            Attr::Known(value)
        }
    }
}

impl<T> Attr<Vec<T>> {
    /// A known list, or null when the list is empty.
    pub fn non_empty_list(value: Vec<T>) -> Self {
        if value.is_empty() {
            Attr::Null
        } else {
            Attr::Known(value)
        }
    }
}

fn unknown_error(attribute: &str) -> ProviderError {
    ProviderError::Validation(format!(
        "attribute '{}' is unknown; it must be resolved before apply",
        attribute
    ))
}

impl<T: Serialize> Serialize for Attr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Attr::Null => serializer.serialize_none(),
            Attr::Unknown => serializer.serialize_str(UNKNOWN_VALUE),
            Attr::Known(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Attr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Null => Ok(Attr::Null),
            ref v if is_unknown(v) => Ok(Attr::Unknown),
            v => T::deserialize(v).map(Attr::Known).map_err(D::Error::custom),
        }
    }
}
