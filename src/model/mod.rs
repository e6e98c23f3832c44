// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Model
//!
//! The vocabulary the rest of the crate operates on.
//!
//! # Entities
//!
//! - [`NetworkSwitch`], [`NetworkPort`], [`Vlan`] - network layer
//! - [`Server`] - compute layer
//! - [`VirtualMachine`] - virtualization layer
//! - [`KubernetesPod`] - container orchestration layer
//! - [`Container`] - application layer
//!
//! All seven are variants of the [`Entity`] sum type.
//!
//! # Relationships
//!
//! [`Relationship`] is a directed edge typed by [`RelationshipKind`]
//! (`CONNECTED_TO`, `HOSTS`, `RUNS_ON`, `BELONGS_TO`, `CONTAINS`,
//! `DEPLOYED_ON`, `PART_OF`).

pub mod entity;
pub mod kind;
pub mod relationship;

pub use entity::{
    Container, Entity, EntityCommon, EntityId, EntityVariant, KubernetesPod, NetworkPort,
    NetworkSwitch, Server, VirtualMachine, Vlan,
};
pub use kind::{EntityKind, InfrastructureLayer, RelationshipKind, ENTITY_LABEL};
pub use relationship::{Relationship, STRUCTURAL_FIELDS};
