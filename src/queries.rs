// Copyright (c) 2025 - Cowboy AI, Inc.

//! Topology Query Facade
//!
//! Read-only composite views built from [`GraphStore`] operations only. Every
//! view is computed fresh on each call and nothing is written back.
//!
//! Where a view needs "an entity of kind X" (entity context, container
//! mapping) the entity with the lowest id is used, so results are stable
//! across backends.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

use crate::backend::GraphBackend;
use crate::errors::QueryError;
use crate::model::{Entity, EntityId, EntityKind, InfrastructureLayer, RelationshipKind};
use crate::store::{GraphStatistics, GraphStore, Neighbor, PathNode, TopologyPath};

/// Paths longer than this are flagged in [`PathAnalysis::potential_issues`]
pub const HIGH_HOP_COUNT: usize = 10;

/// More VLAN memberships than this triggers a segmentation recommendation
pub const MAX_VLANS_BEFORE_REVIEW: usize = 3;

/// Names listed per kind in the text export
const EXPORT_SAMPLE_SIZE: usize = 5;

/// Kinds an entity context tries to reach
const CONTEXT_TARGET_KINDS: [EntityKind; 5] = [
    EntityKind::NetworkSwitch,
    EntityKind::Server,
    EntityKind::VirtualMachine,
    EntityKind::KubernetesPod,
    EntityKind::Container,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub layer: InfrastructureLayer,
    pub name: &'static str,
    pub entity_counts: BTreeMap<EntityKind, u64>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologySummary {
    pub statistics: GraphStatistics,
    /// Bottom (network) to top (application)
    pub layers: Vec<LayerSummary>,
    pub generated_at: DateTime<Utc>,
}

/// Path from an entity to a sample entity of another kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerPath {
    pub target_kind: EntityKind,
    pub path: TopologyPath,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityContext {
    pub entity: Entity,
    pub direct_neighbors: Vec<Neighbor>,
    pub paths_to_other_layers: Vec<LayerPath>,
    pub queried_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathAnalysis {
    pub source_id: String,
    pub target_id: String,
    pub hop_count: usize,
    pub relationship_chain: Vec<RelationshipKind>,
    pub path: TopologyPath,
    /// In order of first appearance along the path
    pub layers_traversed: Vec<InfrastructureLayer>,
    pub potential_issues: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackEntry {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub layer: InfrastructureLayer,
}

/// Network-layer nodes found along a path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkDetails {
    pub vlans: Vec<PathNode>,
    pub switches: Vec<PathNode>,
    pub servers: Vec<PathNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerNetworkMapping {
    pub container: Entity,
    /// Representative switch the container was traced to
    pub switch_id: EntityId,
    /// `None` when the container is not connected to that switch
    pub network_path: Option<TopologyPath>,
    pub infrastructure_stack: Vec<StackEntry>,
    pub network_details: NetworkDetails,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoundaryType {
    Dmz,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityBoundary {
    pub boundary: BoundaryType,
    pub vlan_id: EntityId,
    pub vlan_name: String,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityContext {
    pub entity: Entity,
    /// VLANs directly connected to the entity
    pub network_segments: Vec<Entity>,
    pub security_boundaries: Vec<SecurityBoundary>,
    pub recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSummary {
    pub total_cpu_cores: u64,
    pub total_memory_gb: u64,
    /// Over entities that report cores
    pub average_cpu_cores: f64,
    /// Over entities that report memory
    pub average_memory_gb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceUtilization {
    pub kind: EntityKind,
    pub total_entities: usize,
    /// Only servers and virtual machines carry resource figures
    pub summary: Option<ResourceSummary>,
    pub analyzed_at: DateTime<Utc>,
}

/// Full-graph export rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for ExportFormat {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(QueryError::Export(format!("unknown format {:?}", other))),
        }
    }
}

fn stack_entry(node: &PathNode) -> StackEntry {
    StackEntry {
        id: node.id.clone(),
        name: node.name.clone(),
        kind: node.kind,
        layer: node.kind.layer(),
    }
}

fn network_details(path: &TopologyPath) -> NetworkDetails {
    let mut details = NetworkDetails::default();
    for node in &path.nodes {
        match node.kind {
            EntityKind::Vlan => details.vlans.push(node.clone()),
            EntityKind::NetworkSwitch => details.switches.push(node.clone()),
            EntityKind::Server => details.servers.push(node.clone()),
            _ => {}
        }
    }
    details
}

fn security_boundary(vlan: &Entity) -> Option<SecurityBoundary> {
    let (boundary, risk_level) = if vlan.name().contains("DMZ") {
        (BoundaryType::Dmz, RiskLevel::High)
    } else if vlan.name().contains("Production") {
        (BoundaryType::Production, RiskLevel::Medium)
    } else {
        return None;
    };
    Some(SecurityBoundary {
        boundary,
        vlan_id: vlan.id().clone(),
        vlan_name: vlan.name().to_string(),
        risk_level,
    })
}

fn resources(entity: &Entity) -> (Option<u32>, Option<u32>) {
    match entity {
        Entity::Server(server) => (server.cpu_cores, server.memory_gb),
        Entity::VirtualMachine(vm) => (vm.cpu_cores, vm.memory_gb),
        _ => (None, None),
    }
}

fn average(values: &[u64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<u64>() as f64 / values.len() as f64
    }
}

/// Plain-text digest of a topology graph
fn render_text(graph: &crate::store::TopologyGraph) -> String {
    let mut by_kind: BTreeMap<EntityKind, Vec<&Entity>> = BTreeMap::new();
    for entity in &graph.entities {
        by_kind.entry(entity.kind()).or_default().push(entity);
    }
    let mut by_relationship: BTreeMap<RelationshipKind, usize> = BTreeMap::new();
    for relationship in &graph.relationships {
        *by_relationship.entry(relationship.relationship_kind).or_insert(0) += 1;
    }

    let mut lines = vec![
        "INFRASTRUCTURE KNOWLEDGE GRAPH".to_string(),
        "=".repeat(50),
        format!("Generated: {}", graph.metadata.generated_at.to_rfc3339()),
        format!("Total Entities: {}", graph.metadata.total_entities),
        format!("Total Relationships: {}", graph.metadata.total_relationships),
        String::new(),
    ];

    for (kind, entities) in &by_kind {
        lines.push(format!(
            "{} ENTITIES ({})",
            kind.label().to_uppercase(),
            entities.len()
        ));
        lines.push("-".repeat(30));
        lines.extend(
            entities
                .iter()
                .take(EXPORT_SAMPLE_SIZE)
                .map(|entity| format!("  - {} (ID: {})", entity.name(), entity.id())),
        );
        if entities.len() > EXPORT_SAMPLE_SIZE {
            lines.push(format!("  ... and {} more", entities.len() - EXPORT_SAMPLE_SIZE));
        }
        lines.push(String::new());
    }

    lines.push("RELATIONSHIPS".to_string());
    lines.push("-".repeat(30));
    lines.extend(
        by_relationship
            .iter()
            .map(|(kind, count)| format!("  - {}: {} connections", kind, count)),
    );
    lines.join("\n")
}

/// Read-only views over a [`GraphStore`]
pub struct TopologyQueries<'a, B: GraphBackend> {
    store: &'a GraphStore<B>,
}

impl<'a, B: GraphBackend> TopologyQueries<'a, B> {
    pub fn new(store: &'a GraphStore<B>) -> Self {
        Self { store }
    }

    async fn require_entity(&self, id: &str) -> Result<Entity, QueryError> {
        self.store
            .get_entity(id)
            .await
            .ok_or_else(|| QueryError::EntityNotFound(id.to_string()))
    }

    /// Entity of `kind` with the lowest id
    async fn representative(&self, kind: EntityKind) -> Option<Entity> {
        self.store
            .query_entities_by_kind(kind)
            .await
            .into_iter()
            .min_by(|a, b| a.id().as_str().cmp(b.id().as_str()))
    }

    /// Counts overall and per infrastructure layer
    pub async fn topology_summary(&self) -> TopologySummary {
        let statistics = self.store.get_statistics().await;

        let mut layers: BTreeMap<InfrastructureLayer, LayerSummary> = BTreeMap::new();
        for kind in EntityKind::ALL {
            let layer = kind.layer();
            let count = statistics.entity_count(kind);
            let summary = layers.entry(layer).or_insert_with(|| LayerSummary {
                layer,
                name: layer.display_name(),
                entity_counts: BTreeMap::new(),
                total: 0,
            });
            summary.entity_counts.insert(kind, count);
            summary.total += count;
        }

        TopologySummary {
            statistics,
            layers: layers.into_values().collect(),
            generated_at: Utc::now(),
        }
    }

    /// An entity, its neighbors, and paths to one sample of each other kind
    pub async fn entity_context(&self, id: &str) -> Result<EntityContext, QueryError> {
        let entity = self.require_entity(id).await?;
        let direct_neighbors = self.store.get_entity_neighbors(id, None).await;

        let targets = CONTEXT_TARGET_KINDS
            .into_iter()
            .filter(|kind| *kind != entity.kind())
            .map(|kind| async move {
                let sample = self.representative(kind).await?;
                let path = self.store.get_topology_path(id, sample.id().as_str()).await?;
                Some(LayerPath {
                    target_kind: kind,
                    path,
                })
            });
        let paths_to_other_layers = join_all(targets).await.into_iter().flatten().collect();

        Ok(EntityContext {
            entity,
            direct_neighbors,
            paths_to_other_layers,
            queried_at: Utc::now(),
        })
    }

    /// Hop count, relationship chain and layers along the shortest path
    pub async fn path_analysis(
        &self,
        source_id: &str,
        target_id: &str,
    ) -> Result<PathAnalysis, QueryError> {
        let path = self
            .store
            .get_topology_path(source_id, target_id)
            .await
            .ok_or_else(|| QueryError::NoPath {
                from: source_id.to_string(),
                to: target_id.to_string(),
            })?;

        let mut layers_traversed = Vec::new();
        for node in &path.nodes {
            let layer = node.kind.layer();
            if !layers_traversed.contains(&layer) {
                layers_traversed.push(layer);
            }
        }

        let hop_count = path.hop_count();
        let mut potential_issues = Vec::new();
        if hop_count > HIGH_HOP_COUNT {
            potential_issues.push("High hop count - may indicate complex routing".to_string());
        }

        Ok(PathAnalysis {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            hop_count,
            relationship_chain: path.relationship_kinds.clone(),
            path,
            layers_traversed,
            potential_issues,
            analyzed_at: Utc::now(),
        })
    }

    /// Trace a container down to a representative network switch
    pub async fn container_network_mapping(
        &self,
        container_id: &str,
    ) -> Result<ContainerNetworkMapping, QueryError> {
        let container = self.require_entity(container_id).await?;
        if container.kind() != EntityKind::Container {
            return Err(QueryError::UnexpectedKind {
                id: container_id.to_string(),
                expected: EntityKind::Container,
                found: container.kind(),
            });
        }

        let switch = self
            .representative(EntityKind::NetworkSwitch)
            .await
            .ok_or(QueryError::NoEntitiesOfKind(EntityKind::NetworkSwitch))?;

        let network_path = self
            .store
            .get_topology_path(container_id, switch.id().as_str())
            .await;
        if network_path.is_none() {
            debug!("Container {} has no path to switch {}", container_id, switch.id());
        }

        let (infrastructure_stack, network_details) = match &network_path {
            Some(path) => (
                path.nodes.iter().map(stack_entry).collect(),
                network_details(path),
            ),
            None => (Vec::new(), NetworkDetails::default()),
        };

        Ok(ContainerNetworkMapping {
            container,
            switch_id: switch.id().clone(),
            network_path,
            infrastructure_stack,
            network_details,
            analyzed_at: Utc::now(),
        })
    }

    /// VLAN membership and the risk it implies
    pub async fn security_context(&self, id: &str) -> Result<SecurityContext, QueryError> {
        let entity = self.require_entity(id).await?;

        let mut network_segments: Vec<Entity> = Vec::new();
        for neighbor in self.store.get_entity_neighbors(id, None).await {
            let is_new = !network_segments
                .iter()
                .any(|vlan| vlan.id() == neighbor.entity.id());
            if neighbor.entity.kind() == EntityKind::Vlan && is_new {
                network_segments.push(neighbor.entity);
            }
        }

        let security_boundaries = network_segments.iter().filter_map(security_boundary).collect();

        let mut recommendations = Vec::new();
        if network_segments.len() > MAX_VLANS_BEFORE_REVIEW {
            recommendations.push(
                "Entity connected to multiple VLANs - review network segmentation".to_string(),
            );
        }

        Ok(SecurityContext {
            entity,
            network_segments,
            security_boundaries,
            recommendations,
            analyzed_at: Utc::now(),
        })
    }

    /// CPU and memory totals and averages for a kind
    pub async fn resource_utilization(&self, kind: EntityKind) -> ResourceUtilization {
        let entities = self.store.query_entities_by_kind(kind).await;

        let summary = matches!(kind, EntityKind::Server | EntityKind::VirtualMachine).then(|| {
            let mut cpu = Vec::new();
            let mut memory = Vec::new();
            for entity in &entities {
                let (cores, gb) = resources(entity);
                cpu.extend(cores.filter(|c| *c > 0).map(u64::from));
                memory.extend(gb.filter(|m| *m > 0).map(u64::from));
            }
            ResourceSummary {
                total_cpu_cores: cpu.iter().sum(),
                total_memory_gb: memory.iter().sum(),
                average_cpu_cores: average(&cpu),
                average_memory_gb: average(&memory),
            }
        });

        ResourceUtilization {
            kind,
            total_entities: entities.len(),
            summary,
            analyzed_at: Utc::now(),
        }
    }

    /// Render the full graph
    pub async fn export(&self, format: ExportFormat) -> Result<String, QueryError> {
        let graph = self.store.get_full_topology_graph().await;
        match format {
            ExportFormat::Json => serde_json::to_string_pretty(&graph)
                .map_err(|e| QueryError::Export(e.to_string())),
            ExportFormat::Text => Ok(render_text(&graph)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Server, Vlan};

    fn node(id: &str, kind: EntityKind) -> PathNode {
        PathNode {
            id: id.to_string(),
            name: id.to_string(),
            kind,
        }
    }

    #[test]
    fn test_network_details_pick_network_nodes() {
        let path = TopologyPath {
            nodes: vec![
                node("c", EntityKind::Container),
                node("p", EntityKind::KubernetesPod),
                node("v", EntityKind::VirtualMachine),
                node("s", EntityKind::Server),
                node("vlan", EntityKind::Vlan),
                node("sw", EntityKind::NetworkSwitch),
            ],
            relationship_kinds: vec![RelationshipKind::Contains; 5],
        };
        let details = network_details(&path);
        assert_eq!(details.servers.len(), 1);
        assert_eq!(details.vlans[0].id, "vlan");
        assert_eq!(details.switches[0].id, "sw");
    }

    #[test]
    fn test_security_boundary_by_vlan_name() {
        let dmz: Entity = Vlan::new("v1", "VLAN-DMZ", 10).unwrap().into();
        let prod: Entity = Vlan::new("v2", "VLAN-Production", 20).unwrap().into();
        let dev: Entity = Vlan::new("v3", "VLAN-Dev", 30).unwrap().into();

        assert_eq!(security_boundary(&dmz).unwrap().risk_level, RiskLevel::High);
        assert_eq!(
            security_boundary(&prod).unwrap().boundary,
            BoundaryType::Production
        );
        assert!(security_boundary(&dev).is_none());
    }

    #[test]
    fn test_average_of_nothing_is_zero() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[16, 32]), 24.0);
    }

    #[test]
    fn test_resources_only_for_compute_kinds() {
        let mut server = Server::new("s", "s", "s.example.com").unwrap();
        server.cpu_cores = Some(8);
        assert_eq!(resources(&server.into()), (Some(8), None));

        let vlan: Entity = Vlan::new("v", "v", 5).unwrap().into();
        assert_eq!(resources(&vlan), (None, None));
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!("text".parse::<ExportFormat>(), Ok(ExportFormat::Text));
        assert!("yaml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_text_digest_layout() {
        let servers: Vec<Entity> = (1..=6)
            .map(|i| {
                Server::new(format!("srv-{}", i), format!("server-{}", i), "host")
                    .unwrap()
                    .into()
            })
            .collect();
        let link = crate::model::Relationship::new(
            "srv-1",
            "srv-2",
            RelationshipKind::ConnectedTo,
        )
        .unwrap();
        let graph = crate::store::TopologyGraph::new(servers, vec![link]);

        let text = render_text(&graph);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "INFRASTRUCTURE KNOWLEDGE GRAPH");
        assert_eq!(lines[3], "Total Entities: 6");
        assert_eq!(lines[6], "SERVER ENTITIES (6)");
        assert_eq!(lines[8], "  - server-1 (ID: srv-1)");
        assert_eq!(lines[13], "  ... and 1 more");
        assert_eq!(lines[14], "");
        let rule = "-".repeat(30);
        assert_eq!(
            lines[15..],
            ["RELATIONSHIPS", rule.as_str(), "  - CONNECTED_TO: 1 connections"]
        );
        assert!(!text.ends_with('\n'));
    }
}

