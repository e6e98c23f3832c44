// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for infra-topology-graph
//!
//! Deterministic topology data shared by the integration tests. Ids and
//! timestamps are fixed constants so stored entities compare equal to the
//! fixtures they were written from.
//!
//! # Sample topology
//!
//! ```text
//! ctr-001 <-CONTAINS- pod-001 -RUNS_ON-> vm-001 <-HOSTS- srv-001
//! srv-001 -CONNECTED_TO-> port-001 -CONNECTED_TO-> sw-001
//! srv-001 -BELONGS_TO-> vlan-100 (VLAN-Production)
//! srv-001 -BELONGS_TO-> vlan-200 (VLAN-DMZ)
//! port-001 -BELONGS_TO-> vlan-100
//! srv-002 (isolated)
//! ```

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde_json::json;

use infra_topology_graph::memory::MemoryBackend;
use infra_topology_graph::model::{
    Container, Entity, KubernetesPod, NetworkPort, NetworkSwitch, Relationship, RelationshipKind,
    Server, VirtualMachine, Vlan,
};
use infra_topology_graph::GraphStore;

pub const SWITCH_ID: &str = "sw-001";
pub const PORT_ID: &str = "port-001";
pub const PRODUCTION_VLAN_ID: &str = "vlan-100";
pub const DMZ_VLAN_ID: &str = "vlan-200";
pub const SERVER_ID: &str = "srv-001";
pub const ISOLATED_SERVER_ID: &str = "srv-002";
pub const VM_ID: &str = "vm-001";
pub const POD_ID: &str = "pod-001";
pub const CONTAINER_ID: &str = "ctr-001";

// Fixed test timestamp (2026-01-19T12:00:00.123456Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00.123456Z";

pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

/// Pin both timestamps to [`FIXED_TIMESTAMP`]
pub fn stamped(entity: impl Into<Entity>) -> Entity {
    let mut entity = entity.into();
    let common = entity.common_mut();
    common.created_at = fixed_timestamp();
    common.updated_at = fixed_timestamp();
    entity
}

pub fn core_switch() -> Entity {
    let mut switch = NetworkSwitch::new(SWITCH_ID, "core-switch-01").expect("switch fixture");
    switch.vendor = Some("Arista".to_string());
    switch.model = Some("7050X".to_string());
    switch.ip_address = Some("10.0.0.2".to_string());
    switch.port_count = Some(48);
    stamped(switch)
}

pub fn uplink_port() -> Entity {
    let mut port = NetworkPort::new(PORT_ID, "Ethernet1", 1).expect("port fixture");
    port.port_type = Some("ethernet".to_string());
    port.speed = Some("10G".to_string());
    port.status = Some("up".to_string());
    stamped(port)
}

pub fn vlan(id: &str, name: &str, vlan_id: u16) -> Entity {
    let mut vlan = Vlan::new(id, name, vlan_id).expect("vlan fixture");
    vlan.subnet = Some(format!("10.{}.0.0/24", vlan_id % 256));
    stamped(vlan)
}

pub fn server(id: &str, name: &str, cpu_cores: u32, memory_gb: u32) -> Entity {
    let mut server =
        Server::new(id, name, format!("{}.example.com", name)).expect("server fixture");
    server.ip_address = Some("10.0.1.10".to_string());
    server.cpu_cores = Some(cpu_cores);
    server.memory_gb = Some(memory_gb);
    server.os = Some("Ubuntu 24.04".to_string());
    server.rack_location = Some("R1-U12".to_string());
    stamped(server)
}

pub fn virtual_machine(id: &str, name: &str, cpu_cores: u32, memory_gb: u32) -> Entity {
    let mut vm =
        VirtualMachine::new(id, name, format!("{}.vm.example.com", name)).expect("vm fixture");
    vm.cpu_cores = Some(cpu_cores);
    vm.memory_gb = Some(memory_gb);
    vm.hypervisor = Some("KVM".to_string());
    stamped(vm)
}

pub fn web_pod() -> Entity {
    let mut pod = KubernetesPod::new(POD_ID, "web-frontend-7d9f", "production").expect("pod fixture");
    pod.k8s_labels.insert("app".to_string(), "web".to_string());
    pod.k8s_labels.insert("tier".to_string(), "frontend".to_string());
    pod.annotations
        .insert("prometheus.io/scrape".to_string(), "true".to_string());
    pod.phase = Some("Running".to_string());
    pod.restart_count = Some(0);
    stamped(pod)
}

pub fn nginx_container() -> Entity {
    let mut container = Container::new(CONTAINER_ID, "nginx", "nginx").expect("container fixture");
    container.image_tag = Some("1.27".to_string());
    container.ports = vec!["80/tcp".to_string(), "443/tcp".to_string()];
    container
        .environment_vars
        .insert("NGINX_PORT".to_string(), "80".to_string());
    stamped(container)
}

/// One entity of every kind, with extended properties on the server
pub fn sample_entities() -> Vec<Entity> {
    let mut web = server(SERVER_ID, "web-server-01", 32, 128);
    web.common_mut()
        .extended_properties
        .insert("owner".to_string(), json!({"team": "platform", "oncall": ["alice", "bob"]}));

    vec![
        core_switch(),
        uplink_port(),
        vlan(PRODUCTION_VLAN_ID, "VLAN-Production", 100),
        vlan(DMZ_VLAN_ID, "VLAN-DMZ", 200),
        web,
        server(ISOLATED_SERVER_ID, "batch-server-02", 16, 64),
        virtual_machine(VM_ID, "app-vm-01", 8, 32),
        web_pod(),
        nginx_container(),
    ]
}

pub fn relationship(source: &str, target: &str, kind: RelationshipKind) -> Relationship {
    let mut relationship = Relationship::new(source, target, kind).expect("relationship fixture");
    relationship.created_at = fixed_timestamp();
    relationship
}

pub fn sample_relationships() -> Vec<Relationship> {
    vec![
        relationship(SERVER_ID, VM_ID, RelationshipKind::Hosts)
            .with_property("allocated_cpu", json!(8)),
        relationship(POD_ID, VM_ID, RelationshipKind::RunsOn),
        relationship(POD_ID, CONTAINER_ID, RelationshipKind::Contains),
        relationship(SERVER_ID, PORT_ID, RelationshipKind::ConnectedTo),
        relationship(PORT_ID, SWITCH_ID, RelationshipKind::ConnectedTo),
        relationship(SERVER_ID, PRODUCTION_VLAN_ID, RelationshipKind::BelongsTo),
        relationship(SERVER_ID, DMZ_VLAN_ID, RelationshipKind::BelongsTo),
        relationship(PORT_ID, PRODUCTION_VLAN_ID, RelationshipKind::BelongsTo),
    ]
}

pub async fn empty_store() -> GraphStore<MemoryBackend> {
    let store = GraphStore::connect(MemoryBackend::new())
        .await
        .expect("memory backend connects");
    store.setup_schema().await;
    store
}

/// Store holding the sample topology
pub async fn loaded_store() -> GraphStore<MemoryBackend> {
    let store = empty_store().await;
    let report = store
        .load_topology(&sample_entities(), &sample_relationships())
        .await;
    assert!(report.is_complete(), "sample topology failed to load: {:?}", report);
    store
}
