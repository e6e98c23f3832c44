// Copyright (c) 2025 - Cowboy AI, Inc.
//! Flat Storage Properties
//!
//! The graph store only accepts primitive property values (strings, numbers,
//! booleans and lists of those). This module owns the boundary between the
//! typed model and that flat representation:
//!
//! - [`PropertyValue`] / [`PropertyMap`] - what actually crosses into storage
//! - [`encode_map`] / [`decode_map`] - open-ended maps carried as one JSON
//!   string property. Encoding is lossless; decoding a malformed string
//!   yields an empty map, because corrupted metadata is treated as absent
//!   metadata rather than as a failed read.
//! - [`flatten_for_write`] - lenient write policy: a field that is still a
//!   nested map when it reaches the store is dropped (and logged) instead of
//!   failing the whole entity write.
//! - [`PropertyReader`] - strict typed access used to rebuild entities.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::errors::ModelError;

/// Open-ended extension map attached to entities and relationships
pub type ExtendedProperties = BTreeMap<String, Value>;

/// Property map before flattening (may still hold nested values)
pub type RawProperties = serde_json::Map<String, Value>;

/// Flat property map as persisted on a node or edge
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Primitive property value accepted by the storage engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Convert a JSON value; `None` for null, objects and nested lists
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Integer(i)),
                None => n.as_f64().map(Self::Float),
            },
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Array(_) | Value::Object(_) | Value::Null => None,
                    scalar => Self::from_json(scalar),
                })
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            Value::Null | Value::Object(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Storage type name, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Canonical timestamp format used in storage (RFC 3339, microseconds, UTC)
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Serialize a map to its single-string storage form
pub fn encode_map<T: Serialize>(map: &T) -> String {
    serde_json::to_string(map).unwrap_or_else(|e| {
        warn!("Failed to encode property map, storing empty map: {}", e);
        "{}".to_string()
    })
}

/// Deserialize a stored map; malformed input yields an empty map
pub fn decode_map<T: DeserializeOwned + Default>(field: &str, raw: &str) -> T {
    match serde_json::from_str(raw) {
        Ok(map) => map,
        Err(e) => {
            warn!("Malformed `{}` metadata treated as empty: {}", field, e);
            T::default()
        }
    }
}

/// Insert a serializable value into a raw property map
pub(crate) fn put<T: Serialize>(raw: &mut RawProperties, key: &str, value: &T) {
    let value = serde_json::to_value(value).unwrap_or(Value::Null);
    raw.insert(key.to_string(), value);
}

/// Result of flattening a raw property map for storage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedProperties {
    pub properties: PropertyMap,
    /// Keys removed because they were still nested
    pub dropped: Vec<String>,
}

/// Flatten raw properties for a write
///
/// Nulls are omitted (absent optional fields). Objects and lists holding
/// non-primitive items are dropped and reported in
/// [`FlattenedProperties::dropped`]; everything else is kept.
pub fn flatten_for_write(raw: RawProperties) -> FlattenedProperties {
    let mut flattened = FlattenedProperties::default();

    for (key, value) in raw {
        if value.is_null() {
            continue;
        }
        match PropertyValue::from_json(&value) {
            Some(property) => {
                flattened.properties.insert(key, property);
            }
            None => {
                warn!("Removing nested field `{}` - it should be serialized as JSON", key);
                flattened.dropped.push(key);
            }
        }
    }

    flattened
}

/// Strict typed reader over a stored property map
pub struct PropertyReader<'a> {
    kind: &'static str,
    properties: &'a PropertyMap,
}

impl<'a> PropertyReader<'a> {
    /// `kind` names the record being read, for error messages
    pub fn new(kind: &'static str, properties: &'a PropertyMap) -> Self {
        Self { kind, properties }
    }

    pub fn get(&self, field: &str) -> Option<&'a PropertyValue> {
        self.properties.get(field)
    }

    fn invalid(&self, field: &'static str, reason: impl Into<String>) -> ModelError {
        ModelError::InvalidField {
            kind: self.kind,
            field,
            reason: reason.into(),
        }
    }

    fn missing(&self, field: &'static str) -> ModelError {
        ModelError::MissingField {
            kind: self.kind,
            field,
        }
    }

    pub fn required_string(&self, field: &'static str) -> Result<String, ModelError> {
        self.optional_string(field)?
            .ok_or_else(|| self.missing(field))
    }

    pub fn optional_string(&self, field: &'static str) -> Result<Option<String>, ModelError> {
        match self.get(field) {
            None => Ok(None),
            Some(PropertyValue::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.invalid(
                field,
                format!("expected string, found {}", other.type_name()),
            )),
        }
    }

    pub fn required_integer<T: TryFrom<i64>>(&self, field: &'static str) -> Result<T, ModelError> {
        self.optional_integer(field)?
            .ok_or_else(|| self.missing(field))
    }

    pub fn optional_integer<T: TryFrom<i64>>(
        &self,
        field: &'static str,
    ) -> Result<Option<T>, ModelError> {
        match self.get(field) {
            None => Ok(None),
            Some(PropertyValue::Integer(i)) => T::try_from(*i)
                .map(Some)
                .map_err(|_| self.invalid(field, format!("{} is out of range", i))),
            Some(other) => Err(self.invalid(
                field,
                format!("expected integer, found {}", other.type_name()),
            )),
        }
    }

    /// List of strings; absent means empty
    pub fn string_list(&self, field: &'static str) -> Result<Vec<String>, ModelError> {
        match self.get(field) {
            None => Ok(Vec::new()),
            Some(PropertyValue::List(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        self.invalid(
                            field,
                            format!("expected string items, found {}", item.type_name()),
                        )
                    })
                })
                .collect(),
            Some(other) => Err(self.invalid(
                field,
                format!("expected list, found {}", other.type_name()),
            )),
        }
    }

    pub fn required_timestamp(&self, field: &'static str) -> Result<DateTime<Utc>, ModelError> {
        let raw = self.required_string(field)?;
        parse_timestamp(&raw).ok_or_else(|| self.invalid(field, format!("not RFC 3339: {}", raw)))
    }

    /// Map stored as a JSON string; absent, non-string or malformed means empty
    pub fn encoded_map<T: DeserializeOwned + Default>(&self, field: &'static str) -> T {
        match self.get(field) {
            None => T::default(),
            Some(PropertyValue::String(raw)) => decode_map(field, raw),
            Some(other) => {
                warn!(
                    "`{}` metadata stored as {} instead of string, treated as empty",
                    field,
                    other.type_name()
                );
                T::default()
            }
        }
    }
}
