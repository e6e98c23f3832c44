// Copyright (c) 2025 - Cowboy AI, Inc.

//! Graph Store
//!
//! [`GraphStore`] owns a [`GraphBackend`] handle for its whole lifetime and
//! implements the topology operations on top of it.
//!
//! # Failure semantics
//!
//! - [`GraphStore::connect`] validates the backend with a round-trip and
//!   propagates the failure. There is no retry.
//! - Every other operation catches its own failure, logs it with the entity
//!   or relationship involved, and returns `false`, `None` or an empty
//!   collection. A bulk load therefore continues past individual failures.
//! - [`GraphStore::clear_database`] and [`GraphStore::close`] are lifecycle
//!   operations and return [`StoreResult`].
//!
//! # Example
//!
//! ```rust,no_run
//! use infra_topology_graph::memory::MemoryBackend;
//! use infra_topology_graph::model::{EntityKind, Server};
//! use infra_topology_graph::GraphStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = GraphStore::connect(MemoryBackend::new()).await?;
//! store.setup_schema().await;
//! store.create_entity(&Server::new("srv-001", "web-01", "web01.example.com")?.into()).await;
//!
//! let servers = store.query_entities_by_kind(EntityKind::Server).await;
//! assert_eq!(servers.len(), 1);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use crate::backend::{GraphBackend, NewEdge, NodeRecord, PathRecord};
use crate::errors::{ModelError, StoreError, StoreResult};
use crate::model::{Entity, EntityKind, Relationship, RelationshipKind, ENTITY_LABEL};
use crate::properties::flatten_for_write;
use crate::schema::{SchemaManager, SchemaReport};

/// An entity adjacent to a queried entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub entity: Entity,
    /// Kind of the edge joining the two, in either direction
    pub relationship_kind: RelationshipKind,
}

/// Node summary inside a [`TopologyPath`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathNode {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
}

/// Shortest path between two entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyPath {
    /// Start entity first, end entity last
    pub nodes: Vec<PathNode>,
    /// Always one shorter than `nodes`
    pub relationship_kinds: Vec<RelationshipKind>,
}

impl TopologyPath {
    pub fn hop_count(&self) -> usize {
        self.relationship_kinds.len()
    }

    pub fn start(&self) -> Option<&PathNode> {
        self.nodes.first()
    }

    pub fn end(&self) -> Option<&PathNode> {
        self.nodes.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphMetadata {
    pub generated_at: DateTime<Utc>,
    pub total_entities: usize,
    pub total_relationships: usize,
}

/// Every entity and every directed edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyGraph {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub metadata: GraphMetadata,
}

impl TopologyGraph {
    pub(crate) fn new(entities: Vec<Entity>, relationships: Vec<Relationship>) -> Self {
        let metadata = GraphMetadata {
            generated_at: Utc::now(),
            total_entities: entities.len(),
            total_relationships: relationships.len(),
        };
        Self {
            entities,
            relationships,
            metadata,
        }
    }
}

/// Aggregate counts, recomputed on each call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStatistics {
    pub total_entities: u64,
    pub total_relationships: u64,
    pub entity_counts: BTreeMap<EntityKind, u64>,
    pub relationship_counts: BTreeMap<RelationshipKind, u64>,
}

impl GraphStatistics {
    pub fn entity_count(&self, kind: EntityKind) -> u64 {
        self.entity_counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn relationship_count(&self, kind: RelationshipKind) -> u64 {
        self.relationship_counts.get(&kind).copied().unwrap_or(0)
    }
}

/// Outcome of a bulk load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub entities_attempted: usize,
    pub entities_created: usize,
    pub relationships_attempted: usize,
    pub relationships_created: usize,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.entities_created == self.entities_attempted
            && self.relationships_created == self.relationships_attempted
    }
}

fn path_from_record(record: PathRecord) -> Result<TopologyPath, ModelError> {
    let nodes = record
        .nodes
        .into_iter()
        .map(|step| {
            Ok(PathNode {
                kind: step.kind.parse::<EntityKind>()?,
                id: step.id,
                name: step.name,
            })
        })
        .collect::<Result<Vec<_>, ModelError>>()?;
    let relationship_kinds = record
        .relationship_kinds
        .iter()
        .map(|kind| kind.parse::<RelationshipKind>())
        .collect::<Result<Vec<_>, ModelError>>()?;
    Ok(TopologyPath {
        nodes,
        relationship_kinds,
    })
}

fn decode_node(node: &NodeRecord) -> Option<Entity> {
    match Entity::from_node(&node.labels, &node.properties) {
        Ok(entity) => Some(entity),
        Err(e) => {
            warn!(
                "Skipping unreadable node {}: {}",
                node.text("id").unwrap_or("<no id>"),
                e
            );
            None
        }
    }
}

/// Topology graph store over a [`GraphBackend`]
pub struct GraphStore<B: GraphBackend> {
    backend: B,
    closed: AtomicBool,
}

impl<B: GraphBackend> GraphStore<B> {
    /// Take ownership of `backend` and validate it with a round-trip
    pub async fn connect(backend: B) -> StoreResult<Self> {
        info!("Connecting graph store to {} backend", backend.name());
        backend.ping().await?;
        info!("Graph store connected");

        Ok(Self {
            backend,
            closed: AtomicBool::new(false),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Declare constraints and indexes; safe to re-run
    pub async fn setup_schema(&self) -> SchemaReport {
        SchemaManager::apply(&self.backend).await
    }

    /// Create an entity node; `false` if it was rejected
    pub async fn create_entity(&self, entity: &Entity) -> bool {
        let id = entity.id();
        if let Err(e) = entity.validate() {
            error!("Refusing to write invalid entity {}: {}", id, e);
            return false;
        }

        let flattened = flatten_for_write(entity.to_raw_properties());
        if !flattened.dropped.is_empty() {
            warn!(
                "Entity {} written without nested fields {:?}",
                id, flattened.dropped
            );
        }

        let node = NodeRecord::new(entity.labels(), flattened.properties);
        match self.backend.create_node(&node).await {
            Ok(()) => {
                debug!("Created {} {}", entity.kind(), id);
                true
            }
            Err(StoreError::ConstraintViolation(detail)) => {
                error!("Entity {} already exists: {}", id, detail);
                false
            }
            Err(e) => {
                let keys: Vec<&String> = node.properties.keys().collect();
                error!("Failed to create entity {}: {} (properties: {:?})", id, e, keys);
                false
            }
        }
    }

    /// Create a directed edge; `false` if either endpoint is missing
    pub async fn create_relationship(&self, relationship: &Relationship) -> bool {
        let flattened = flatten_for_write(relationship.edge_properties());
        if !flattened.dropped.is_empty() {
            warn!(
                "Relationship {} -> {} written without nested fields {:?}",
                relationship.source_id, relationship.target_id, flattened.dropped
            );
        }

        let edge = NewEdge {
            source_id: relationship.source_id.to_string(),
            target_id: relationship.target_id.to_string(),
            kind: relationship.relationship_kind,
            properties: flattened.properties,
        };

        match self.backend.create_edge(&edge).await {
            Ok(true) => {
                debug!(
                    "Created relationship {} -[{}]-> {}",
                    edge.source_id, edge.kind, edge.target_id
                );
                true
            }
            Ok(false) => {
                warn!(
                    "Relationship {} -[{}]-> {} not created: source or target entity not found",
                    edge.source_id, edge.kind, edge.target_id
                );
                false
            }
            Err(e) => {
                error!(
                    "Failed to create relationship {} -[{}]-> {}: {}",
                    edge.source_id, edge.kind, edge.target_id, e
                );
                false
            }
        }
    }

    /// Entity by id; `None` when absent or unreadable
    pub async fn get_entity(&self, id: &str) -> Option<Entity> {
        match self.backend.find_node(id).await {
            Ok(Some(node)) => decode_node(&node),
            Ok(None) => {
                debug!("Entity {} not found", id);
                None
            }
            Err(e) => {
                error!("Failed to get entity {}: {}", id, e);
                None
            }
        }
    }

    /// Entities directly connected to `id` in either direction
    ///
    /// `None` means every relationship kind. An empty filter matches nothing.
    pub async fn get_entity_neighbors(
        &self,
        id: &str,
        kinds: Option<&[RelationshipKind]>,
    ) -> Vec<Neighbor> {
        let filter: &[RelationshipKind] = match kinds {
            Some([]) => return Vec::new(),
            Some(kinds) => kinds,
            None => &[],
        };

        let records = match self.backend.neighbors(id, filter).await {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to get neighbors of {}: {}", id, e);
                return Vec::new();
            }
        };

        records
            .into_iter()
            .filter_map(|record| {
                let relationship_kind = match record.relationship_kind.parse() {
                    Ok(kind) => kind,
                    Err(e) => {
                        warn!("Skipping neighbor of {}: {}", id, e);
                        return None;
                    }
                };
                decode_node(&record.node).map(|entity| Neighbor {
                    entity,
                    relationship_kind,
                })
            })
            .collect()
    }

    /// Shortest undirected path by hop count
    ///
    /// `None` when either entity is missing or no path connects them. A path
    /// from an entity to itself is that single entity.
    pub async fn get_topology_path(&self, start_id: &str, end_id: &str) -> Option<TopologyPath> {
        if start_id == end_id {
            let entity = self.get_entity(start_id).await?;
            return Some(TopologyPath {
                nodes: vec![PathNode {
                    id: entity.id().to_string(),
                    name: entity.name().to_string(),
                    kind: entity.kind(),
                }],
                relationship_kinds: Vec::new(),
            });
        }

        let record = match self.backend.shortest_path(start_id, end_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("No path between {} and {}", start_id, end_id);
                return None;
            }
            Err(e) => {
                error!("Failed to find path {} -> {}: {}", start_id, end_id, e);
                return None;
            }
        };

        match path_from_record(record) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Unreadable path {} -> {}: {}", start_id, end_id, e);
                None
            }
        }
    }

    /// Every entity of `kind`, in no particular order
    pub async fn query_entities_by_kind(&self, kind: EntityKind) -> Vec<Entity> {
        match self.backend.nodes_by_label(kind.label()).await {
            Ok(nodes) => nodes.iter().filter_map(decode_node).collect(),
            Err(e) => {
                error!("Failed to query {} entities: {}", kind, e);
                Vec::new()
            }
        }
    }

    /// Materialize the whole graph; O(graph size)
    pub async fn get_full_topology_graph(&self) -> TopologyGraph {
        let entities = match self.backend.nodes_by_label(ENTITY_LABEL).await {
            Ok(nodes) => nodes.iter().filter_map(decode_node).collect(),
            Err(e) => {
                error!("Failed to read entities: {}", e);
                Vec::new()
            }
        };

        let relationships = match self.backend.all_edges().await {
            Ok(edges) => edges
                .iter()
                .filter_map(|edge| {
                    Relationship::from_edge(
                        &edge.source_id,
                        &edge.target_id,
                        &edge.kind,
                        &edge.properties,
                    )
                    .map_err(|e| {
                        warn!(
                            "Skipping unreadable relationship {} -> {}: {}",
                            edge.source_id, edge.target_id, e
                        )
                    })
                    .ok()
                })
                .collect(),
            Err(e) => {
                error!("Failed to read relationships: {}", e);
                Vec::new()
            }
        };

        TopologyGraph::new(entities, relationships)
    }

    /// Case-insensitive substring search ordered by name
    ///
    /// Without `kinds` the term matches `name`, `hostname` or `ip_address`;
    /// with `kinds` it matches `name` within those kinds only.
    pub async fn search_entities(&self, term: &str, kinds: Option<&[EntityKind]>) -> Vec<Entity> {
        match self.backend.search(term, kinds).await {
            Ok(nodes) => nodes.iter().filter_map(decode_node).collect(),
            Err(e) => {
                error!("Search for {:?} failed: {}", term, e);
                Vec::new()
            }
        }
    }

    /// Delete every relationship, then every node
    pub async fn clear_database(&self) -> StoreResult<()> {
        warn!("Clearing topology graph - ALL DATA WILL BE DELETED");
        self.backend.clear().await?;
        info!("Topology graph cleared");
        Ok(())
    }

    pub async fn get_statistics(&self) -> GraphStatistics {
        let counts = match self.backend.counts().await {
            Ok(counts) => counts,
            Err(e) => {
                error!("Failed to get statistics: {}", e);
                return GraphStatistics::default();
            }
        };

        let mut statistics = GraphStatistics::default();
        for (kind, count) in counts.entities_by_kind {
            statistics.total_entities += count;
            match kind.parse::<EntityKind>() {
                Ok(kind) => {
                    statistics.entity_counts.insert(kind, count);
                }
                Err(e) => debug!("Uncategorized entities: {}", e),
            }
        }
        for (kind, count) in counts.relationships_by_kind {
            statistics.total_relationships += count;
            match kind.parse::<RelationshipKind>() {
                Ok(kind) => {
                    statistics.relationship_counts.insert(kind, count);
                }
                Err(e) => debug!("Uncategorized relationships: {}", e),
            }
        }
        statistics
    }

    /// Write entities, then relationships, one at a time
    pub async fn load_topology(
        &self,
        entities: &[Entity],
        relationships: &[Relationship],
    ) -> LoadReport {
        let mut report = LoadReport {
            entities_attempted: entities.len(),
            relationships_attempted: relationships.len(),
            ..Default::default()
        };

        for entity in entities {
            if self.create_entity(entity).await {
                report.entities_created += 1;
            }
        }
        for relationship in relationships {
            if self.create_relationship(relationship).await {
                report.relationships_created += 1;
            }
        }

        info!(
            "Loaded {}/{} entities and {}/{} relationships",
            report.entities_created,
            report.entities_attempted,
            report.relationships_created,
            report.relationships_attempted
        );
        report
    }

    /// Release the backend; calling again is a no-op
    pub async fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.backend.close().await?;
        info!("Graph store closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl<B: GraphBackend> Drop for GraphStore<B> {
    fn drop(&mut self) {
        if !self.is_closed() {
            debug!("Graph store dropped without close; releasing {} backend", self.backend.name());
        }
    }
}
