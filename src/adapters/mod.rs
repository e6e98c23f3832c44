// Copyright (c) 2025 - Cowboy AI, Inc.

//! External graph database adapters
//!
//! - **Neo4j** (feature `neo4j`): Bolt-connected [`GraphBackend`](crate::GraphBackend)
//!
//! The in-process backend lives in [`crate::memory`] and is always available.

#[cfg(feature = "neo4j")]
pub mod neo4j;

#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jBackend;
