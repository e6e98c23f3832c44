// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure topology graph
//!
//! Models a multi-layer infrastructure topology (switches, ports, VLANs,
//! servers, virtual machines, Kubernetes pods, containers) as a typed
//! property graph, persists it through a [`GraphBackend`], and answers
//! topology-aware queries (neighbors, shortest paths, full-graph export).
//!
//! # Layers
//!
//! - [`model`] - entity and relationship vocabulary
//! - [`properties`] - flat storage property representation
//! - [`schema`] - idempotent constraint and index setup
//! - [`store`] - the [`GraphStore`] and its operations
//! - [`queries`] - read-only composite views over the store
//!
//! # Example
//!
//! ```rust,no_run
//! use infra_topology_graph::memory::MemoryBackend;
//! use infra_topology_graph::model::{Relationship, RelationshipKind, Server, VirtualMachine};
//! use infra_topology_graph::GraphStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = GraphStore::connect(MemoryBackend::new()).await?;
//!     store.setup_schema().await;
//!
//!     let server = Server::new("srv-001", "web-01", "web01.example.com")?;
//!     let vm = VirtualMachine::new("vm-001", "app-vm", "app01.example.com")?;
//!     store.create_entity(&server.into()).await;
//!     store.create_entity(&vm.into()).await;
//!
//!     let hosts = Relationship::new("srv-001", "vm-001", RelationshipKind::Hosts)?;
//!     store.create_relationship(&hosts).await;
//!
//!     let neighbors = store.get_entity_neighbors("srv-001", None).await;
//!     assert_eq!(neighbors.len(), 1);
//!
//!     store.close().await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod backend;
pub mod config;
pub mod cypher;
pub mod errors;
pub mod memory;
pub mod model;
pub mod properties;
pub mod queries;
pub mod schema;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use backend::GraphBackend;
pub use config::{LogConfig, Neo4jConfig};
pub use errors::{ModelError, QueryError, StoreError, StoreResult};
pub use model::{Entity, EntityId, EntityKind, Relationship, RelationshipKind};
pub use queries::TopologyQueries;
pub use schema::{SchemaManager, SchemaReport};
pub use store::{GraphStatistics, GraphStore, LoadReport, Neighbor, TopologyGraph, TopologyPath};
