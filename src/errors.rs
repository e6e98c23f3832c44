// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology model, storage and query operations

use thiserror::Error;

use crate::model::EntityKind;

/// Entity and relationship construction errors
///
/// Construction rejects bad input instead of coercing it: a required field
/// that is absent or empty, or a stored value of the wrong type, is an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Identifier is empty")]
    EmptyIdentifier,

    #[error("{kind} is missing required field `{field}`")]
    MissingField { kind: &'static str, field: &'static str },

    #[error("{kind} has invalid field `{field}`: {reason}")]
    InvalidField {
        kind: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("Kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: EntityKind, found: String },

    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("Unknown relationship kind: {0}")]
    UnknownRelationshipKind(String),
}

/// Graph store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Service unreachable or credentials rejected
    #[error("Connection error: {0}")]
    Connection(String),

    /// Storage engine reported a failure
    #[error("Database error: {0}")]
    Database(String),

    /// Uniqueness constraint rejected a write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A result row could not be decoded
    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid entity: {0}")]
    Model(#[from] ModelError),

    /// The store handle was already released
    #[error("Graph store is closed")]
    Closed,
}

/// Result type for graph store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the topology query views
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Entity {0} not found")]
    EntityNotFound(String),

    #[error("Entity {id} is a {found}, expected {expected}")]
    UnexpectedKind {
        id: String,
        expected: EntityKind,
        found: EntityKind,
    },

    #[error("No {0} entities found in topology")]
    NoEntitiesOfKind(EntityKind),

    #[error("No path found between {from} and {to}")]
    NoPath { from: String, to: String },

    #[error("Export failed: {0}")]
    Export(String),
}
