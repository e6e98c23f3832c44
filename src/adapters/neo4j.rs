// Copyright (c) 2025 - Cowboy AI, Inc.

//! Neo4j Graph Backend
//!
//! Implements [`GraphBackend`] over Bolt using `neo4rs`.
//!
//! # Graph Model
//!
//! ## Nodes
//! Every entity carries the common `Entity` label plus its kind label:
//! - `(:Entity:NetworkSwitch)`, `(:Entity:NetworkPort)`, `(:Entity:VLAN)`
//! - `(:Entity:Server)`, `(:Entity:VirtualMachine)`
//! - `(:Entity:KubernetesPod)`, `(:Entity:Container)`
//!
//! ## Relationships
//! - `(Server)-[:HOSTS]->(VirtualMachine)`
//! - `(KubernetesPod)-[:RUNS_ON]->(VirtualMachine)`
//! - `(KubernetesPod)-[:CONTAINS]->(Container)`
//! - `(Server)-[:BELONGS_TO]->(VLAN)`
//! - `(NetworkSwitch)-[:CONNECTED_TO]->(NetworkPort)`
//! - plus `DEPLOYED_ON` and `PART_OF`
//!
//! # Example
//!
//! ```rust,no_run
//! use infra_topology_graph::adapters::Neo4jBackend;
//! use infra_topology_graph::{GraphStore, Neo4jConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = Neo4jBackend::connect(&Neo4jConfig::from_env()?).await?;
//!     let store = GraphStore::connect(backend).await?;
//!     store.setup_schema().await;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use neo4rs::{
    BoltList, BoltMap, BoltString, BoltType, ConfigBuilder, Graph, Node, Query, Relation, Row,
};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::backend::{
    EdgeRecord, GraphBackend, GraphCounts, NeighborRecord, NewEdge, NodeRecord, PathRecord,
    PathStep,
};
use crate::config::Neo4jConfig;
use crate::cypher;
use crate::errors::{StoreError, StoreResult};
use crate::model::{EntityKind, RelationshipKind};
use crate::properties::{PropertyMap, PropertyValue};
use crate::schema::{SchemaOutcome, SchemaStatement};

/// Classify a driver error
fn database_error(e: neo4rs::Error) -> StoreError {
    let message = e.to_string();
    if message.contains("ConstraintValidationFailed") || message.contains("already exists with") {
        StoreError::ConstraintViolation(message)
    } else {
        StoreError::Database(message)
    }
}

fn bolt_value(value: &PropertyValue) -> BoltType {
    match value {
        PropertyValue::Boolean(b) => BoltType::from(*b),
        PropertyValue::Integer(i) => BoltType::from(*i),
        PropertyValue::Float(f) => BoltType::from(*f),
        PropertyValue::String(s) => BoltType::from(s.as_str()),
        PropertyValue::List(items) => {
            BoltType::List(BoltList::from(items.iter().map(bolt_value).collect::<Vec<_>>()))
        }
    }
}

fn bolt_map(properties: &PropertyMap) -> BoltType {
    let mut map = BoltMap::new();
    for (key, value) in properties {
        map.put(BoltString::from(key.as_str()), bolt_value(value));
    }
    BoltType::Map(map)
}

/// Read every key of a node or relationship into a [`PropertyMap`]
///
/// Values of types the model never writes (temporal, spatial) are skipped.
macro_rules! read_properties {
    ($element:expr) => {{
        let element = $element;
        let mut properties = PropertyMap::new();
        for key in element.keys() {
            let value = if let Ok(s) = element.get::<String>(key) {
                PropertyValue::String(s)
            } else if let Ok(b) = element.get::<bool>(key) {
                PropertyValue::Boolean(b)
            } else if let Ok(i) = element.get::<i64>(key) {
                PropertyValue::Integer(i)
            } else if let Ok(f) = element.get::<f64>(key) {
                PropertyValue::Float(f)
            } else if let Ok(items) = element.get::<Vec<String>>(key) {
                PropertyValue::List(items.into_iter().map(PropertyValue::String).collect())
            } else if let Ok(items) = element.get::<Vec<i64>>(key) {
                PropertyValue::List(items.into_iter().map(PropertyValue::Integer).collect())
            } else {
                debug!("Skipping unsupported property type for `{}`", key);
                continue;
            };
            properties.insert(key.to_string(), value);
        }
        properties
    }};
}

fn node_record(node: &Node) -> NodeRecord {
    let labels: Vec<String> = node.labels().iter().map(|l| l.to_string()).collect();
    NodeRecord {
        labels,
        properties: read_properties!(node),
    }
}

fn relation_properties(relation: &Relation) -> PropertyMap {
    read_properties!(relation)
}

/// Read one column of a result row
fn column<T: DeserializeOwned>(row: &Row, name: &str) -> StoreResult<T> {
    row.get::<T>(name)
        .map_err(|e| StoreError::Query(format!("column `{}` unreadable: {}", name, e)))
}

/// Decode the parallel lists returned by [`cypher::SHORTEST_PATH`]
fn path_record(row: &Row) -> StoreResult<PathRecord> {
    let ids: Vec<String> = column(row, "ids")?;
    let names: Vec<String> = column(row, "names")?;
    let kinds: Vec<String> = column(row, "kinds")?;
    let relationship_kinds: Vec<String> = column(row, "relationship_kinds")?;

    if names.len() != ids.len() || kinds.len() != ids.len() {
        return Err(StoreError::Query(format!(
            "path lists disagree: {} ids, {} names, {} kinds",
            ids.len(),
            names.len(),
            kinds.len()
        )));
    }

    let nodes = ids
        .into_iter()
        .zip(names)
        .zip(kinds)
        .map(|((id, name), kind)| PathStep { id, name, kind })
        .collect();

    Ok(PathRecord {
        nodes,
        relationship_kinds,
    })
}

/// Neo4j [`GraphBackend`] with a pooled Bolt connection
///
/// The pool is dropped by [`GraphBackend::close`]; statements already in
/// flight keep their own handle until they finish.
pub struct Neo4jBackend {
    graph: RwLock<Option<Graph>>,
    database: String,
}

impl Neo4jBackend {
    /// Open the connection pool described by `config`
    pub async fn connect(config: &Neo4jConfig) -> StoreResult<Self> {
        config.validate()?;
        info!("Connecting to Neo4j at {}", config.uri);

        let driver_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.username.as_str())
            .password(config.password.as_str())
            .db(config.database.as_str())
            .fetch_size(config.fetch_size)
            .max_connections(config.max_connections)
            .build()
            .map_err(|e| StoreError::Configuration(e.to_string()))?;

        let graph = Graph::connect(driver_config)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to connect to Neo4j: {}", e)))?;

        Ok(Self {
            graph: RwLock::new(Some(graph)),
            database: config.database.clone(),
        })
    }

    /// Handle to the open pool
    async fn graph(&self) -> StoreResult<Graph> {
        self.graph.read().await.clone().ok_or(StoreError::Closed)
    }

    async fn schema_exists(&self, graph: &Graph, statement: &SchemaStatement) -> StoreResult<bool> {
        let show = if statement.is_constraint() {
            "SHOW CONSTRAINTS YIELD name WHERE name = $name RETURN name"
        } else {
            "SHOW INDEXES YIELD name WHERE name = $name RETURN name"
        };
        let query = Query::new(show.to_string()).param("name", statement.name());
        let mut result = graph.execute(query).await.map_err(database_error)?;
        Ok(result.next().await.map_err(database_error)?.is_some())
    }

    async fn collect_nodes(&self, query: Query) -> StoreResult<Vec<NodeRecord>> {
        let mut result = self.graph().await?.execute(query).await.map_err(database_error)?;
        let mut nodes = Vec::new();
        while let Some(row) = result.next().await.map_err(database_error)? {
            match row.get::<Node>("n") {
                Ok(node) => nodes.push(node_record(&node)),
                Err(e) => warn!("Skipping unreadable node row: {}", e),
            }
        }
        Ok(nodes)
    }
}

#[async_trait]
impl GraphBackend for Neo4jBackend {
    fn name(&self) -> &str {
        "neo4j"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.graph()
            .await?
            .run(Query::new(cypher::PING.to_string()))
            .await
            .map_err(|e| StoreError::Connection(format!("Neo4j health check failed: {}", e)))?;
        debug!("Neo4j health check passed (database {})", self.database);
        Ok(())
    }

    async fn apply_schema(&self, statement: &SchemaStatement) -> StoreResult<SchemaOutcome> {
        let graph = self.graph().await?;
        if self.schema_exists(&graph, statement).await? {
            return Ok(SchemaOutcome::AlreadyExists);
        }
        graph
            .run(Query::new(statement.to_cypher()))
            .await
            .map_err(database_error)?;
        Ok(SchemaOutcome::Created)
    }

    async fn create_node(&self, node: &NodeRecord) -> StoreResult<()> {
        let query = Query::new(cypher::create_node(&node.labels))
            .param("props", bolt_map(&node.properties));
        self.graph().await?.run(query).await.map_err(database_error)
    }

    async fn create_edge(&self, edge: &NewEdge) -> StoreResult<bool> {
        let query = Query::new(cypher::create_edge(edge.kind))
            .param("source_id", edge.source_id.as_str())
            .param("target_id", edge.target_id.as_str())
            .param("props", bolt_map(&edge.properties));

        let mut result = self.graph().await?.execute(query).await.map_err(database_error)?;
        match result.next().await.map_err(database_error)? {
            Some(row) => Ok(column::<i64>(&row, "created")? > 0),
            None => Ok(false),
        }
    }

    async fn find_node(&self, id: &str) -> StoreResult<Option<NodeRecord>> {
        let query = Query::new(cypher::FIND_NODE.to_string()).param("id", id);
        Ok(self.collect_nodes(query).await?.into_iter().next())
    }

    async fn neighbors(
        &self,
        id: &str,
        kinds: &[RelationshipKind],
    ) -> StoreResult<Vec<NeighborRecord>> {
        let query = Query::new(cypher::neighbors(kinds)).param("id", id);
        let mut result = self.graph().await?.execute(query).await.map_err(database_error)?;

        let mut neighbors = Vec::new();
        while let Some(row) = result.next().await.map_err(database_error)? {
            let (Ok(node), Ok(relationship_kind)) =
                (row.get::<Node>("m"), row.get::<String>("relationship_kind"))
            else {
                warn!("Skipping unreadable neighbor row for {}", id);
                continue;
            };
            neighbors.push(NeighborRecord {
                node: node_record(&node),
                relationship_kind,
            });
        }
        Ok(neighbors)
    }

    async fn shortest_path(&self, start_id: &str, end_id: &str) -> StoreResult<Option<PathRecord>> {
        let query = Query::new(cypher::SHORTEST_PATH.to_string())
            .param("start_id", start_id)
            .param("end_id", end_id);
        let mut result = self.graph().await?.execute(query).await.map_err(database_error)?;

        match result.next().await.map_err(database_error)? {
            Some(row) => path_record(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn nodes_by_label(&self, label: &str) -> StoreResult<Vec<NodeRecord>> {
        self.collect_nodes(Query::new(cypher::nodes_by_label(label))).await
    }

    async fn all_edges(&self) -> StoreResult<Vec<EdgeRecord>> {
        let mut result = self
            .graph()
            .await?
            .execute(Query::new(cypher::ALL_EDGES.to_string()))
            .await
            .map_err(database_error)?;

        let mut edges = Vec::new();
        while let Some(row) = result.next().await.map_err(database_error)? {
            let properties = match row.get::<Relation>("r") {
                Ok(relation) => relation_properties(&relation),
                Err(e) => {
                    warn!("Relationship properties unreadable: {}", e);
                    PropertyMap::new()
                }
            };
            edges.push(EdgeRecord {
                source_id: column(&row, "source_id")?,
                target_id: column(&row, "target_id")?,
                kind: column(&row, "kind")?,
                properties,
            });
        }
        Ok(edges)
    }

    async fn search(
        &self,
        term: &str,
        kinds: Option<&[EntityKind]>,
    ) -> StoreResult<Vec<NodeRecord>> {
        let term = term.to_lowercase();
        let query = match kinds {
            Some(kinds) => {
                let labels: Vec<String> = kinds.iter().map(|k| k.label().to_string()).collect();
                Query::new(cypher::SEARCH_KINDS.to_string())
                    .param("term", term)
                    .param("labels", labels)
            }
            None => Query::new(cypher::SEARCH_ANY.to_string()).param("term", term),
        };
        self.collect_nodes(query).await
    }

    async fn clear(&self) -> StoreResult<()> {
        let mut txn = self.graph().await?.start_txn().await.map_err(database_error)?;
        for statement in cypher::CLEAR {
            txn.run(Query::new(statement.to_string()))
                .await
                .map_err(database_error)?;
        }
        txn.commit().await.map_err(database_error)
    }

    async fn counts(&self) -> StoreResult<GraphCounts> {
        let graph = self.graph().await?;
        let mut counts = GraphCounts::default();

        for (statement, target) in [
            (cypher::COUNT_ENTITIES, &mut counts.entities_by_kind),
            (cypher::COUNT_RELATIONSHIPS, &mut counts.relationships_by_kind),
        ] {
            let mut result = graph
                .execute(Query::new(statement.to_string()))
                .await
                .map_err(database_error)?;
            while let Some(row) = result.next().await.map_err(database_error)? {
                let kind: Option<String> = column(&row, "kind")?;
                let count: i64 = column(&row, "count")?;
                target.insert(kind.unwrap_or_default(), count.max(0) as u64);
            }
        }
        Ok(counts)
    }

    async fn close(&self) -> StoreResult<()> {
        if self.graph.write().await.take().is_some() {
            info!("Closed Neo4j connection pool for database {}", self.database);
        }
        Ok(())
    }
}
