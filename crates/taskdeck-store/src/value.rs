//! Field values and documents.
//!
//! A [`Document`] is an id plus an ordered map of [`FieldValue`]s. Values
//! serialize with an explicit type tag so timestamps survive a JSON round
//! trip through backends that store text.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single field value inside a document.
///
/// [`FieldValue::ServerTimestamp`] is a write-only sentinel. Backends replace
/// it with their own clock reading when the write is applied, so documents
/// returned from reads never contain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    /// Explicit null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Integer(i64),
    /// UTF-8 text.
    String(String),
    /// Point in time (UTC).
    Timestamp(DateTime<Utc>),
    /// Placeholder resolved to the backend's current time on write.
    ServerTimestamp,
}

impl FieldValue {
    /// Returns the text if this is a [`FieldValue::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the flag if this is a [`FieldValue::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is a [`FieldValue::Integer`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the instant if this is a resolved [`FieldValue::Timestamp`].
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Returns `true` for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// Ordered map of field name to value.
pub type Fields = BTreeMap<String, FieldValue>;

/// A stored record: the store-assigned id plus its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier, unique within its collection.
    pub id: String,
    /// The record's fields.
    pub fields: Fields,
}

impl Document {
    /// Returns the value of `field`, if present.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

/// Replaces every [`FieldValue::ServerTimestamp`] in `fields` with `now`.
///
/// Backends call this once per write so all sentinels in a single write
/// resolve to the same instant.
///
/// # Examples
///
/// ```
/// use taskdeck_store::value::{resolve_server_timestamps, FieldValue, Fields};
///
/// let now = chrono::Utc::now();
/// let mut fields = Fields::new();
/// fields.insert("createdAt".to_string(), FieldValue::ServerTimestamp);
/// fields.insert("title".to_string(), FieldValue::from("x"));
///
/// resolve_server_timestamps(&mut fields, now);
/// assert_eq!(fields["createdAt"], FieldValue::Timestamp(now));
/// assert_eq!(fields["title"], FieldValue::from("x"));
/// ```
pub fn resolve_server_timestamps(fields: &mut Fields, now: DateTime<Utc>) {
    for value in fields.values_mut() {
        if matches!(value, FieldValue::ServerTimestamp) {
            *value = FieldValue::Timestamp(now);
        }
    }
}

/// Returns `true` if any field still holds the server-timestamp sentinel.
pub fn has_server_timestamps(fields: &Fields) -> bool {
    fields
        .values()
        .any(|value| matches!(value, FieldValue::ServerTimestamp))
}
