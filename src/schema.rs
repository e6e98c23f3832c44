// Copyright (c) 2025 - Cowboy AI, Inc.

//! Schema Manager
//!
//! Declares one uniqueness constraint on `id` for the common `Entity` label
//! and for each of the seven kind labels, plus secondary indexes on the
//! attributes queries filter by. Every declaration is "create if not
//! exists", so applying the schema again is a no-op. A backend failure on an
//! individual declaration is downgraded to a warning and setup continues.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::backend::GraphBackend;
use crate::model::{EntityKind, ENTITY_LABEL};

/// One schema declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum SchemaStatement {
    /// `property` is unique among nodes carrying `label`
    UniqueConstraint {
        name: &'static str,
        label: &'static str,
        property: &'static str,
    },
    /// Secondary index on `label.property`
    Index {
        name: &'static str,
        label: &'static str,
        property: &'static str,
    },
}

impl SchemaStatement {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaStatement::UniqueConstraint { name, .. } | SchemaStatement::Index { name, .. } => {
                *name
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SchemaStatement::UniqueConstraint { label, .. }
            | SchemaStatement::Index { label, .. } => *label,
        }
    }

    pub fn property(&self) -> &'static str {
        match self {
            SchemaStatement::UniqueConstraint { property, .. }
            | SchemaStatement::Index { property, .. } => *property,
        }
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, SchemaStatement::UniqueConstraint { .. })
    }

    /// Cypher rendering with `IF NOT EXISTS`
    pub fn to_cypher(&self) -> String {
        match self {
            SchemaStatement::UniqueConstraint {
                name,
                label,
                property,
            } => format!(
                "CREATE CONSTRAINT {} IF NOT EXISTS FOR (n:{}) REQUIRE n.{} IS UNIQUE",
                name, label, property
            ),
            SchemaStatement::Index {
                name,
                label,
                property,
            } => format!(
                "CREATE INDEX {} IF NOT EXISTS FOR (n:{}) ON (n.{})",
                name, label, property
            ),
        }
    }
}

impl fmt::Display for SchemaStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = if self.is_constraint() { "constraint" } else { "index" };
        write!(f, "{} {} on :{}({})", what, self.name(), self.label(), self.property())
    }
}

/// What applying a statement did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaOutcome {
    Created,
    AlreadyExists,
}

const fn unique(name: &'static str, label: &'static str) -> SchemaStatement {
    SchemaStatement::UniqueConstraint {
        name,
        label,
        property: "id",
    }
}

const fn index(name: &'static str, label: &'static str, property: &'static str) -> SchemaStatement {
    SchemaStatement::Index {
        name,
        label,
        property,
    }
}

fn constraint_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::NetworkSwitch => "switch_id",
        EntityKind::NetworkPort => "port_id",
        EntityKind::Vlan => "vlan_id",
        EntityKind::Server => "server_id",
        EntityKind::VirtualMachine => "vm_id",
        EntityKind::KubernetesPod => "pod_id",
        EntityKind::Container => "container_id",
    }
}

/// Uniqueness constraints: the common label first, then one per kind
pub fn constraints() -> Vec<SchemaStatement> {
    std::iter::once(unique("entity_id", ENTITY_LABEL))
        .chain(
            EntityKind::ALL
                .into_iter()
                .map(|kind| unique(constraint_name(kind), kind.label())),
        )
        .collect()
}

/// Secondary indexes on frequently filtered attributes
pub fn indexes() -> Vec<SchemaStatement> {
    vec![
        index("entity_name", ENTITY_LABEL, "name"),
        index("entity_kind", ENTITY_LABEL, "kind"),
        index("vlan_vlan_id", EntityKind::Vlan.label(), "vlan_id"),
        index("server_hostname", EntityKind::Server.label(), "hostname"),
        index("vm_hostname", EntityKind::VirtualMachine.label(), "hostname"),
        index("pod_namespace", EntityKind::KubernetesPod.label(), "namespace"),
        index("container_image", EntityKind::Container.label(), "image"),
    ]
}

/// Counts from one schema setup run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReport {
    pub created: usize,
    pub already_present: usize,
    /// One message per declaration the backend rejected
    pub warnings: Vec<String>,
}

impl SchemaReport {
    pub fn attempted(&self) -> usize {
        self.created + self.already_present + self.warnings.len()
    }
}

/// Applies the topology schema to a backend
pub struct SchemaManager;

impl SchemaManager {
    /// Full schema: constraints, then indexes
    pub fn statements() -> Vec<SchemaStatement> {
        let mut statements = constraints();
        statements.extend(indexes());
        statements
    }

    /// Apply every declaration; failures become warnings, never errors
    pub async fn apply<B: GraphBackend + ?Sized>(backend: &B) -> SchemaReport {
        info!("Initializing graph schema on {}", backend.name());

        let mut report = SchemaReport::default();

        for statement in Self::statements() {
            match backend.apply_schema(&statement).await {
                Ok(SchemaOutcome::Created) => {
                    debug!("Created {}", statement);
                    report.created += 1;
                }
                Ok(SchemaOutcome::AlreadyExists) => {
                    debug!("{} already exists", statement);
                    report.already_present += 1;
                }
                Err(e) => {
                    warn!("Schema declaration warning for {}: {}", statement, e);
                    report.warnings.push(format!("{}: {}", statement, e));
                }
            }
        }

        info!(
            "Schema initialization complete ({} created, {} already present, {} warnings)",
            report.created,
            report.already_present,
            report.warnings.len()
        );
        report
    }
}
