// Copyright (c) 2025 - Cowboy AI, Inc.

//! In-Memory Graph Backend
//!
//! An in-process labeled property graph with the same observable semantics
//! as the Neo4j backend:
//!
//! - uniqueness constraints are enforced only once declared, per label
//! - edges are created only when both endpoint entities exist
//! - shortest paths are undirected breadth-first searches by hop count
//! - clearing removes edges before nodes
//!
//! Node deletion is whole-graph only, so nodes are kept in insertion order
//! and edges refer to them by position.

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::backend::{
    EdgeRecord, GraphBackend, GraphCounts, NeighborRecord, NewEdge, NodeRecord, PathRecord,
    PathStep,
};
use crate::errors::{StoreError, StoreResult};
use crate::model::{EntityKind, RelationshipKind, ENTITY_LABEL};
use crate::properties::PropertyMap;
use crate::schema::{SchemaOutcome, SchemaStatement};

#[derive(Debug, Clone)]
struct StoredEdge {
    source: usize,
    target: usize,
    kind: RelationshipKind,
    properties: PropertyMap,
}

#[derive(Debug, Default)]
struct MemoryGraph {
    nodes: Vec<NodeRecord>,
    edges: Vec<StoredEdge>,
    schema: BTreeMap<&'static str, SchemaStatement>,
}

impl MemoryGraph {
    fn position(&self, id: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.has_label(ENTITY_LABEL) && node.text("id") == Some(id))
    }

    fn constraints(&self) -> impl Iterator<Item = &SchemaStatement> {
        self.schema.values().filter(|statement| statement.is_constraint())
    }

    fn check_unique(&self, node: &NodeRecord) -> StoreResult<()> {
        for constraint in self.constraints() {
            let (label, property) = (constraint.label(), constraint.property());
            if !node.has_label(label) {
                continue;
            }
            let Some(value) = node.properties.get(property) else {
                continue;
            };
            let clash = self
                .nodes
                .iter()
                .position(|existing| {
                    existing.has_label(label) && existing.properties.get(property) == Some(value)
                });
            if let Some(existing) = clash {
                return Err(StoreError::ConstraintViolation(format!(
                    "Node({}) already exists with label `{}` and property `{}` = {:?}",
                    existing, label, property, value
                )));
            }
        }
        Ok(())
    }

    fn check_existing_data(&self, constraint: &SchemaStatement) -> StoreResult<()> {
        let (label, property) = (constraint.label(), constraint.property());
        let values: Vec<_> = self
            .nodes
            .iter()
            .filter(|node| node.has_label(label))
            .filter_map(|node| node.properties.get(property))
            .collect();
        for (i, value) in values.iter().enumerate() {
            if values[i + 1..].contains(value) {
                return Err(StoreError::ConstraintViolation(format!(
                    "Unable to create {}: duplicate {:?} among existing :{} nodes",
                    constraint, value, label
                )));
            }
        }
        Ok(())
    }

    fn path_step(&self, index: usize) -> PathStep {
        let node = &self.nodes[index];
        PathStep {
            id: node.text("id").unwrap_or_default().to_string(),
            name: node.text("name").unwrap_or_default().to_string(),
            kind: node.text("kind").unwrap_or_default().to_string(),
        }
    }

    fn shortest_path(&self, start: usize, end: usize) -> Option<PathRecord> {
        let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); self.nodes.len()];
        for (index, edge) in self.edges.iter().enumerate() {
            adjacency[edge.source].push((edge.target, index));
            if edge.source != edge.target {
                adjacency[edge.target].push((edge.source, index));
            }
        }

        let mut previous: Vec<Option<(usize, usize)>> = vec![None; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([start]);
        visited[start] = true;

        while let Some(current) = queue.pop_front() {
            if current == end {
                break;
            }
            for &(next, edge) in &adjacency[current] {
                if !visited[next] {
                    visited[next] = true;
                    previous[next] = Some((current, edge));
                    queue.push_back(next);
                }
            }
        }

        if !visited[end] {
            return None;
        }

        let mut node_indexes = vec![end];
        let mut edge_indexes = Vec::new();
        let mut current = end;
        while let Some((prev, edge)) = previous[current] {
            node_indexes.push(prev);
            edge_indexes.push(edge);
            current = prev;
        }
        node_indexes.reverse();
        edge_indexes.reverse();

        Some(PathRecord {
            nodes: node_indexes.into_iter().map(|i| self.path_step(i)).collect(),
            relationship_kinds: edge_indexes
                .into_iter()
                .map(|i| self.edges[i].kind.type_name().to_string())
                .collect(),
        })
    }
}

fn contains_ignore_case(value: Option<&str>, needle: &str) -> bool {
    value.is_some_and(|v| v.to_lowercase().contains(needle))
}

/// In-process [`GraphBackend`]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    graph: RwLock<MemoryGraph>,
    closed: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl GraphBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.ensure_open()
    }

    async fn apply_schema(&self, statement: &SchemaStatement) -> StoreResult<SchemaOutcome> {
        self.ensure_open()?;
        let mut graph = self.graph.write().await;

        if graph.schema.contains_key(statement.name()) {
            return Ok(SchemaOutcome::AlreadyExists);
        }
        if statement.is_constraint() {
            graph.check_existing_data(statement)?;
        }
        graph.schema.insert(statement.name(), statement.clone());
        Ok(SchemaOutcome::Created)
    }

    async fn create_node(&self, node: &NodeRecord) -> StoreResult<()> {
        self.ensure_open()?;
        let mut graph = self.graph.write().await;
        graph.check_unique(node)?;
        graph.nodes.push(node.clone());
        Ok(())
    }

    async fn create_edge(&self, edge: &NewEdge) -> StoreResult<bool> {
        self.ensure_open()?;
        let mut graph = self.graph.write().await;

        let (Some(source), Some(target)) =
            (graph.position(&edge.source_id), graph.position(&edge.target_id))
        else {
            return Ok(false);
        };

        graph.edges.push(StoredEdge {
            source,
            target,
            kind: edge.kind,
            properties: edge.properties.clone(),
        });
        Ok(true)
    }

    async fn find_node(&self, id: &str) -> StoreResult<Option<NodeRecord>> {
        self.ensure_open()?;
        let graph = self.graph.read().await;
        Ok(graph.position(id).map(|i| graph.nodes[i].clone()))
    }

    async fn neighbors(
        &self,
        id: &str,
        kinds: &[RelationshipKind],
    ) -> StoreResult<Vec<NeighborRecord>> {
        self.ensure_open()?;
        let graph = self.graph.read().await;
        let Some(position) = graph.position(id) else {
            return Ok(Vec::new());
        };

        let neighbors = graph
            .edges
            .iter()
            .filter(|edge| kinds.is_empty() || kinds.contains(&edge.kind))
            .filter_map(|edge| {
                let other = if edge.source == position {
                    edge.target
                } else if edge.target == position {
                    edge.source
                } else {
                    return None;
                };
                let node = &graph.nodes[other];
                node.has_label(ENTITY_LABEL).then(|| NeighborRecord {
                    node: node.clone(),
                    relationship_kind: edge.kind.type_name().to_string(),
                })
            })
            .collect();
        Ok(neighbors)
    }

    async fn shortest_path(&self, start_id: &str, end_id: &str) -> StoreResult<Option<PathRecord>> {
        self.ensure_open()?;
        let graph = self.graph.read().await;
        match (graph.position(start_id), graph.position(end_id)) {
            (Some(start), Some(end)) => Ok(graph.shortest_path(start, end)),
            _ => Ok(None),
        }
    }

    async fn nodes_by_label(&self, label: &str) -> StoreResult<Vec<NodeRecord>> {
        self.ensure_open()?;
        let graph = self.graph.read().await;
        Ok(graph
            .nodes
            .iter()
            .filter(|node| node.has_label(label))
            .cloned()
            .collect())
    }

    async fn all_edges(&self) -> StoreResult<Vec<EdgeRecord>> {
        self.ensure_open()?;
        let graph = self.graph.read().await;
        Ok(graph
            .edges
            .iter()
            .map(|edge| EdgeRecord {
                source_id: graph.nodes[edge.source].text("id").unwrap_or_default().to_string(),
                target_id: graph.nodes[edge.target].text("id").unwrap_or_default().to_string(),
                kind: edge.kind.type_name().to_string(),
                properties: edge.properties.clone(),
            })
            .collect())
    }

    async fn search(
        &self,
        term: &str,
        kinds: Option<&[EntityKind]>,
    ) -> StoreResult<Vec<NodeRecord>> {
        self.ensure_open()?;
        let needle = term.to_lowercase();
        let graph = self.graph.read().await;

        let mut matches: Vec<NodeRecord> = graph
            .nodes
            .iter()
            .filter(|node| node.has_label(ENTITY_LABEL))
            .filter(|node| match kinds {
                Some(kinds) => {
                    kinds.iter().any(|kind| node.has_label(kind.label()))
                        && contains_ignore_case(node.text("name"), &needle)
                }
                None => ["name", "hostname", "ip_address"]
                    .iter()
                    .any(|field| contains_ignore_case(node.text(field), &needle)),
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| a.text("name").cmp(&b.text("name")));
        Ok(matches)
    }

    async fn clear(&self) -> StoreResult<()> {
        self.ensure_open()?;
        let mut graph = self.graph.write().await;
        let (nodes, edges) = (graph.nodes.len(), graph.edges.len());
        graph.edges.clear();
        graph.nodes.clear();
        debug!("Deleted {} relationships and {} nodes", edges, nodes);
        Ok(())
    }

    async fn counts(&self) -> StoreResult<GraphCounts> {
        self.ensure_open()?;
        let graph = self.graph.read().await;
        let mut counts = GraphCounts::default();

        for node in graph.nodes.iter().filter(|node| node.has_label(ENTITY_LABEL)) {
            let kind = node.text("kind").unwrap_or_default().to_string();
            *counts.entities_by_kind.entry(kind).or_insert(0) += 1;
        }
        for edge in &graph.edges {
            *counts
                .relationships_by_kind
                .entry(edge.kind.type_name().to_string())
                .or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn close(&self) -> StoreResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Released in-memory graph");
        }
        Ok(())
    }
}
