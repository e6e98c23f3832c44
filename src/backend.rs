// Copyright (c) 2025 - Cowboy AI, Inc.

//! Graph Backend - the storage engine boundary
//!
//! [`GraphBackend`] abstracts a transactional labeled-property-graph store.
//! Every method is one scoped unit of work: it acquires whatever session
//! the engine needs, runs its statements, and releases the session before
//! returning, whether it succeeded or not.
//!
//! Payloads cross this boundary as flat [`PropertyMap`]s; nested values must
//! already be encoded as strings.
//!
//! # Implementations
//!
//! - [`crate::memory::MemoryBackend`] - in-process graph
//! - `crate::adapters::neo4j::Neo4jBackend` - Neo4j over Bolt (feature `neo4j`)

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::errors::StoreResult;
use crate::model::{EntityKind, RelationshipKind};
use crate::properties::PropertyMap;
use crate::schema::{SchemaOutcome, SchemaStatement};

/// A stored node: its labels and flat properties
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub labels: Vec<String>,
    pub properties: PropertyMap,
}

impl NodeRecord {
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>, properties: PropertyMap) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            properties,
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// String property, if present and a string
    pub fn text(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|value| value.as_str())
    }
}

/// A directed edge to be created between two entity ids
#[derive(Debug, Clone, PartialEq)]
pub struct NewEdge {
    pub source_id: String,
    pub target_id: String,
    pub kind: RelationshipKind,
    pub properties: PropertyMap,
}

/// A stored directed edge between two entity nodes
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub source_id: String,
    pub target_id: String,
    /// Relationship type as stored
    pub kind: String,
    pub properties: PropertyMap,
}

/// A node adjacent to a queried node, and the edge type joining them
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborRecord {
    pub node: NodeRecord,
    pub relationship_kind: String,
}

/// Node summary inside a path
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    pub id: String,
    pub name: String,
    pub kind: String,
}

/// Shortest path as stored: nodes in order, edge types in order
#[derive(Debug, Clone, PartialEq)]
pub struct PathRecord {
    pub nodes: Vec<PathStep>,
    pub relationship_kinds: Vec<String>,
}

/// Raw aggregate counts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphCounts {
    /// Entity nodes grouped by their `kind` property
    pub entities_by_kind: BTreeMap<String, u64>,
    /// Edges grouped by relationship type
    pub relationships_by_kind: BTreeMap<String, u64>,
}

/// Abstract transactional labeled-property-graph store
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Trivial round-trip used to validate connectivity
    async fn ping(&self) -> StoreResult<()>;

    /// Apply one schema declaration with "create if not exists" semantics
    async fn apply_schema(&self, statement: &SchemaStatement) -> StoreResult<SchemaOutcome>;

    /// Create a node; `Err(ConstraintViolation)` if a uniqueness constraint rejects it
    async fn create_node(&self, node: &NodeRecord) -> StoreResult<()>;

    /// Create an edge between two existing entity nodes
    ///
    /// Returns `Ok(false)` when either endpoint does not exist; nothing is
    /// written in that case.
    async fn create_edge(&self, edge: &NewEdge) -> StoreResult<bool>;

    /// Entity node with the given id
    async fn find_node(&self, id: &str) -> StoreResult<Option<NodeRecord>>;

    /// Entity nodes adjacent to `id` in either direction
    ///
    /// An empty `kinds` slice means every relationship kind.
    async fn neighbors(&self, id: &str, kinds: &[RelationshipKind])
        -> StoreResult<Vec<NeighborRecord>>;

    /// Shortest undirected path by hop count, any relationship kind
    async fn shortest_path(&self, start_id: &str, end_id: &str) -> StoreResult<Option<PathRecord>>;

    /// Every node carrying `label`
    async fn nodes_by_label(&self, label: &str) -> StoreResult<Vec<NodeRecord>>;

    /// Every directed edge between entity nodes
    async fn all_edges(&self) -> StoreResult<Vec<EdgeRecord>>;

    /// Case-insensitive substring search ordered by name
    ///
    /// Without `kinds` the term is matched against `name`, `hostname` and
    /// `ip_address`; with `kinds` only against `name`, restricted to nodes
    /// carrying one of the kind labels.
    async fn search(&self, term: &str, kinds: Option<&[EntityKind]>)
        -> StoreResult<Vec<NodeRecord>>;

    /// Delete all edges, then all nodes
    async fn clear(&self) -> StoreResult<()>;

    /// Aggregate counts, computed on demand
    async fn counts(&self) -> StoreResult<GraphCounts>;

    /// Release the connection; further calls fail with `StoreError::Closed`
    async fn close(&self) -> StoreResult<()>;
}
