// Copyright (c) 2025 - Cowboy AI, Inc.
//! Directed, typed relationships between entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{now, EntityId};
use super::kind::RelationshipKind;
use crate::errors::ModelError;
use crate::properties::{
    encode_map, format_timestamp, ExtendedProperties, PropertyMap, PropertyReader, RawProperties,
};

/// Fields that shape the edge itself and are never stored as edge properties
///
/// This is a fixed list; relationship kinds that grow further structural
/// fields would need it generalized.
pub const STRUCTURAL_FIELDS: [&str; 3] = ["source_id", "target_id", "relationship_kind"];

/// Directed edge between two existing entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub relationship_kind: RelationshipKind,
    /// Stored as one JSON string property
    #[serde(default)]
    pub properties: ExtendedProperties,
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship_kind: RelationshipKind,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            source_id: EntityId::new(source_id)?,
            target_id: EntityId::new(target_id)?,
            relationship_kind,
            properties: ExtendedProperties::new(),
            created_at: now(),
        })
    }

    /// Attach a property (builder style)
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Edge property map: every field except [`STRUCTURAL_FIELDS`]
    pub fn edge_properties(&self) -> RawProperties {
        let mut raw = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => RawProperties::new(),
        };
        for field in STRUCTURAL_FIELDS {
            raw.remove(field);
        }
        raw.insert(
            "created_at".to_string(),
            Value::String(format_timestamp(&self.created_at)),
        );
        raw.insert(
            "properties".to_string(),
            Value::String(encode_map(&self.properties)),
        );
        raw
    }

    /// Rebuild from a stored edge
    pub fn from_edge(
        source_id: &str,
        target_id: &str,
        relationship_kind: &str,
        properties: &PropertyMap,
    ) -> Result<Self, ModelError> {
        let reader = PropertyReader::new("Relationship", properties);
        Ok(Self {
            source_id: EntityId::new(source_id)?,
            target_id: EntityId::new(target_id)?,
            relationship_kind: relationship_kind.parse()?,
            properties: reader.encoded_map("properties"),
            created_at: reader.required_timestamp("created_at")?,
        })
    }
}
