// Copyright (c) 2025 - Cowboy AI, Inc.
//! Entity and relationship kinds
//!
//! Kinds are closed enums: every storage label and relationship type the
//! graph can contain is named here, so labels are never assembled from
//! free-form strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ModelError;

/// Common supertype label carried by every entity node
pub const ENTITY_LABEL: &str = "Entity";

/// Entity kinds in the topology graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Physical network switch
    NetworkSwitch,
    /// Port on a switch
    NetworkPort,
    /// IEEE 802.1Q virtual LAN
    #[serde(rename = "VLAN")]
    Vlan,
    /// Physical server
    Server,
    /// Virtual machine running on a server
    VirtualMachine,
    /// Kubernetes pod scheduled on a VM
    KubernetesPod,
    /// Container running in a pod
    Container,
}

impl EntityKind {
    /// All entity kinds, network layer first
    pub const ALL: [EntityKind; 7] = [
        EntityKind::NetworkSwitch,
        EntityKind::NetworkPort,
        EntityKind::Vlan,
        EntityKind::Server,
        EntityKind::VirtualMachine,
        EntityKind::KubernetesPod,
        EntityKind::Container,
    ];

    /// Kind-specific storage label (also the value of the `kind` property)
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::NetworkSwitch => "NetworkSwitch",
            EntityKind::NetworkPort => "NetworkPort",
            EntityKind::Vlan => "VLAN",
            EntityKind::Server => "Server",
            EntityKind::VirtualMachine => "VirtualMachine",
            EntityKind::KubernetesPod => "KubernetesPod",
            EntityKind::Container => "Container",
        }
    }

    /// Both labels an entity node of this kind carries
    pub fn labels(&self) -> [&'static str; 2] {
        [ENTITY_LABEL, self.label()]
    }

    /// Infrastructure layer this kind belongs to
    pub fn layer(&self) -> InfrastructureLayer {
        match self {
            EntityKind::NetworkSwitch | EntityKind::NetworkPort | EntityKind::Vlan => {
                InfrastructureLayer::Network
            }
            EntityKind::Server => InfrastructureLayer::Compute,
            EntityKind::VirtualMachine => InfrastructureLayer::Virtualization,
            EntityKind::KubernetesPod => InfrastructureLayer::ContainerOrchestration,
            EntityKind::Container => InfrastructureLayer::Application,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.label() == s)
            .ok_or_else(|| ModelError::UnknownKind(s.to_string()))
    }
}

/// Relationship kinds (one directed edge type each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    /// Physical or logical link (port to switch, port to VLAN)
    ConnectedTo,
    /// Server hosts a virtual machine
    Hosts,
    /// Workload runs on a lower layer
    RunsOn,
    /// Membership (port belongs to VLAN)
    BelongsTo,
    /// Containment (pod contains container)
    Contains,
    /// Deployment target
    DeployedOn,
    /// Component of a larger unit
    PartOf,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 7] = [
        RelationshipKind::ConnectedTo,
        RelationshipKind::Hosts,
        RelationshipKind::RunsOn,
        RelationshipKind::BelongsTo,
        RelationshipKind::Contains,
        RelationshipKind::DeployedOn,
        RelationshipKind::PartOf,
    ];

    /// Storage relationship type name
    pub fn type_name(&self) -> &'static str {
        match self {
            RelationshipKind::ConnectedTo => "CONNECTED_TO",
            RelationshipKind::Hosts => "HOSTS",
            RelationshipKind::RunsOn => "RUNS_ON",
            RelationshipKind::BelongsTo => "BELONGS_TO",
            RelationshipKind::Contains => "CONTAINS",
            RelationshipKind::DeployedOn => "DEPLOYED_ON",
            RelationshipKind::PartOf => "PART_OF",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for RelationshipKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationshipKind::ALL
            .into_iter()
            .find(|kind| kind.type_name() == s)
            .ok_or_else(|| ModelError::UnknownRelationshipKind(s.to_string()))
    }
}

/// Infrastructure layers, bottom (network) to top (application)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InfrastructureLayer {
    Network,
    Compute,
    Virtualization,
    ContainerOrchestration,
    Application,
}

impl InfrastructureLayer {
    /// Human-readable layer name
    pub fn display_name(&self) -> &'static str {
        match self {
            InfrastructureLayer::Network => "Network Layer",
            InfrastructureLayer::Compute => "Compute Layer",
            InfrastructureLayer::Virtualization => "Virtualization Layer",
            InfrastructureLayer::ContainerOrchestration => "Container Orchestration Layer",
            InfrastructureLayer::Application => "Application Layer",
        }
    }
}

impl fmt::Display for InfrastructureLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(EntityKind::NetworkSwitch, "NetworkSwitch")]
    #[test_case(EntityKind::NetworkPort, "NetworkPort")]
    #[test_case(EntityKind::Vlan, "VLAN")]
    #[test_case(EntityKind::Server, "Server")]
    #[test_case(EntityKind::VirtualMachine, "VirtualMachine")]
    #[test_case(EntityKind::KubernetesPod, "KubernetesPod")]
    #[test_case(EntityKind::Container, "Container")]
    fn test_entity_kind_label(kind: EntityKind, label: &str) {
        assert_eq!(kind.label(), label);
        assert_eq!(label.parse::<EntityKind>().unwrap(), kind);
        assert_eq!(kind.labels(), [ENTITY_LABEL, label]);
    }

    #[test]
    fn test_entity_kind_serde_matches_label() {
        for kind in EntityKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.label()));
        }
    }

    #[test]
    fn test_unknown_kinds_rejected() {
        assert_eq!(
            "Router".parse::<EntityKind>(),
            Err(ModelError::UnknownKind("Router".to_string()))
        );
        assert!("hosts".parse::<RelationshipKind>().is_err());
    }

    #[test]
    fn test_relationship_kind_type_names() {
        for kind in RelationshipKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.type_name()));
            assert_eq!(kind.type_name().parse::<RelationshipKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_layers() {
        assert_eq!(EntityKind::Vlan.layer(), InfrastructureLayer::Network);
        assert_eq!(EntityKind::VirtualMachine.layer(), InfrastructureLayer::Virtualization);
        assert_eq!(
            EntityKind::Container.layer().display_name(),
            "Application Layer"
        );
    }
}
