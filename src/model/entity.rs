// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Entities
//!
//! [`Entity`] is a closed sum over the seven infrastructure kinds. Each
//! variant wraps a concrete struct with its own strict field set; the kind
//! is implied by the variant and cannot be set independently of it.
//!
//! # Storage mapping
//!
//! [`Entity::labels`] and [`Entity::to_raw_properties`] are the single
//! mapping from a variant to its label pair and flattened property map.
//! Maps (`extended_properties`, pod labels/annotations, container
//! environment) are stored as JSON strings; [`Entity::from_properties`]
//! reverses the mapping and re-validates.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::kind::EntityKind;
use crate::errors::ModelError;
use crate::properties::{
    encode_map, format_timestamp, put, ExtendedProperties, PropertyMap, PropertyReader,
    RawProperties,
};

/// Globally unique entity identifier, assigned by the producer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Create an identifier; must be non-empty
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ModelError::EmptyIdentifier);
        }
        Ok(Self(id))
    }

    /// Generate `<prefix>-<8 hex chars>` for producers without their own scheme
    pub fn generate(prefix: &str) -> Self {
        let hex = Uuid::now_v7().simple().to_string();
        Self(format!("{}-{}", prefix, &hex[hex.len() - 8..]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EntityId {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Current time at storage granularity
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fields shared by every entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCommon {
    id: EntityId,

    /// Human-readable label, not unique
    pub name: String,

    /// Set once at construction
    pub created_at: DateTime<Utc>,

    /// Refreshed by [`EntityCommon::touch`]; the store never updates it
    pub updated_at: DateTime<Utc>,

    /// Open-ended extension properties
    #[serde(default)]
    pub extended_properties: ExtendedProperties,
}

impl EntityCommon {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, ModelError> {
        let timestamp = now();
        Ok(Self {
            id: EntityId::new(id)?,
            name: name.into(),
            created_at: timestamp,
            updated_at: timestamp,
            extended_properties: ExtendedProperties::new(),
        })
    }

    /// Immutable identifier
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Mark the entity as modified
    pub fn touch(&mut self) {
        self.updated_at = now();
    }

    fn validate(&self, kind: EntityKind) -> Result<(), ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::MissingField {
                kind: kind.label(),
                field: "name",
            });
        }
        Ok(())
    }

    fn write_properties(&self, kind: EntityKind, raw: &mut RawProperties) {
        put(raw, "id", &self.id);
        put(raw, "name", &self.name);
        put(raw, "kind", &kind.label());
        put(raw, "created_at", &format_timestamp(&self.created_at));
        put(raw, "updated_at", &format_timestamp(&self.updated_at));
        put(raw, "extended_properties", &encode_map(&self.extended_properties));
    }

    fn read_properties(reader: &PropertyReader<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            id: EntityId::new(reader.required_string("id")?)?,
            name: reader.required_string("name")?,
            created_at: reader.required_timestamp("created_at")?,
            updated_at: reader.required_timestamp("updated_at")?,
            extended_properties: reader.encoded_map("extended_properties"),
        })
    }
}

/// A concrete entity struct bound to exactly one [`EntityKind`]
pub trait EntityVariant: Sized {
    /// The kind every value of this type has
    const KIND: EntityKind;

    fn common(&self) -> &EntityCommon;

    fn common_mut(&mut self) -> &mut EntityCommon;

    /// Check required fields and value ranges
    fn validate(&self) -> Result<(), ModelError>;

    /// Kind-specific properties (common fields are written by [`Entity`])
    fn write_properties(&self, raw: &mut RawProperties);

    /// Rebuild from stored properties
    fn read_properties(common: EntityCommon, reader: &PropertyReader<'_>)
        -> Result<Self, ModelError>;
}

fn require_non_empty(kind: EntityKind, field: &'static str, value: &str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::MissingField {
            kind: kind.label(),
            field,
        });
    }
    Ok(())
}

/// Declares a variant struct whose `Deserialize` runs [`EntityVariant::validate`],
/// so decoding cannot produce a value the constructor would reject
macro_rules! entity_struct {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$field_meta:meta])* pub $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct $name {
            $( $(#[$field_meta])* pub $field: $ty ),*
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                #[derive(Deserialize)]
                struct Unchecked {
                    $( $(#[$field_meta])* $field: $ty ),*
                }

                let unchecked = Unchecked::deserialize(deserializer)?;
                let value = $name {
                    $( $field: unchecked.$field ),*
                };
                value.validate().map_err(de::Error::custom)?;
                Ok(value)
            }
        }
    };
}

entity_struct! {
    /// Network switch
    pub struct NetworkSwitch {
        #[serde(flatten)]
        pub common: EntityCommon,
        pub model: Option<String>,
        pub vendor: Option<String>,
        /// Management IP address
        pub ip_address: Option<String>,
        pub mac_address: Option<String>,
        pub port_count: Option<u32>,
        pub location: Option<String>,
    }
}

impl NetworkSwitch {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, ModelError> {
        let switch = Self {
            common: EntityCommon::new(id, name)?,
            model: None,
            vendor: None,
            ip_address: None,
            mac_address: None,
            port_count: None,
            location: None,
        };
        switch.validate()?;
        Ok(switch)
    }
}

impl EntityVariant for NetworkSwitch {
    const KIND: EntityKind = EntityKind::NetworkSwitch;

    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn validate(&self) -> Result<(), ModelError> {
        self.common.validate(Self::KIND)
    }

    fn write_properties(&self, raw: &mut RawProperties) {
        put(raw, "model", &self.model);
        put(raw, "vendor", &self.vendor);
        put(raw, "ip_address", &self.ip_address);
        put(raw, "mac_address", &self.mac_address);
        put(raw, "port_count", &self.port_count);
        put(raw, "location", &self.location);
    }

    fn read_properties(
        common: EntityCommon,
        reader: &PropertyReader<'_>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common,
            model: reader.optional_string("model")?,
            vendor: reader.optional_string("vendor")?,
            ip_address: reader.optional_string("ip_address")?,
            mac_address: reader.optional_string("mac_address")?,
            port_count: reader.optional_integer("port_count")?,
            location: reader.optional_string("location")?,
        })
    }
}

entity_struct! {
    /// Port on a network switch
    pub struct NetworkPort {
        #[serde(flatten)]
        pub common: EntityCommon,
        /// Port number on the switch
        pub port_number: u32,
        /// e.g. GigabitEthernet
        pub port_type: Option<String>,
        /// up / down
        pub status: Option<String>,
        pub speed: Option<String>,
        pub duplex: Option<String>,
    }
}

impl NetworkPort {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        port_number: u32,
    ) -> Result<Self, ModelError> {
        let port = Self {
            common: EntityCommon::new(id, name)?,
            port_number,
            port_type: None,
            status: None,
            speed: None,
            duplex: None,
        };
        port.validate()?;
        Ok(port)
    }
}

impl EntityVariant for NetworkPort {
    const KIND: EntityKind = EntityKind::NetworkPort;

    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn validate(&self) -> Result<(), ModelError> {
        self.common.validate(Self::KIND)
    }

    fn write_properties(&self, raw: &mut RawProperties) {
        put(raw, "port_number", &self.port_number);
        put(raw, "port_type", &self.port_type);
        put(raw, "status", &self.status);
        put(raw, "speed", &self.speed);
        put(raw, "duplex", &self.duplex);
    }

    fn read_properties(
        common: EntityCommon,
        reader: &PropertyReader<'_>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common,
            port_number: reader.required_integer("port_number")?,
            port_type: reader.optional_string("port_type")?,
            status: reader.optional_string("status")?,
            speed: reader.optional_string("speed")?,
            duplex: reader.optional_string("duplex")?,
        })
    }
}

entity_struct! {
    /// IEEE 802.1Q virtual LAN
    pub struct Vlan {
        #[serde(flatten)]
        pub common: EntityCommon,
        /// VLAN tag, 1-4094
        pub vlan_id: u16,
        pub subnet: Option<String>,
        pub gateway: Option<String>,
        pub description: Option<String>,
    }
}

impl Vlan {
    pub const MIN_VLAN_ID: u16 = 1;
    pub const MAX_VLAN_ID: u16 = 4094;

    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        vlan_id: u16,
    ) -> Result<Self, ModelError> {
        let vlan = Self {
            common: EntityCommon::new(id, name)?,
            vlan_id,
            subnet: None,
            gateway: None,
            description: None,
        };
        vlan.validate()?;
        Ok(vlan)
    }
}

impl EntityVariant for Vlan {
    const KIND: EntityKind = EntityKind::Vlan;

    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn validate(&self) -> Result<(), ModelError> {
        self.common.validate(Self::KIND)?;
        if !(Self::MIN_VLAN_ID..=Self::MAX_VLAN_ID).contains(&self.vlan_id) {
            return Err(ModelError::InvalidField {
                kind: Self::KIND.label(),
                field: "vlan_id",
                reason: format!("{} is outside 1-4094", self.vlan_id),
            });
        }
        Ok(())
    }

    fn write_properties(&self, raw: &mut RawProperties) {
        put(raw, "vlan_id", &self.vlan_id);
        put(raw, "subnet", &self.subnet);
        put(raw, "gateway", &self.gateway);
        put(raw, "description", &self.description);
    }

    fn read_properties(
        common: EntityCommon,
        reader: &PropertyReader<'_>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common,
            vlan_id: reader.required_integer("vlan_id")?,
            subnet: reader.optional_string("subnet")?,
            gateway: reader.optional_string("gateway")?,
            description: reader.optional_string("description")?,
        })
    }
}

entity_struct! {
    /// Physical server
    pub struct Server {
        #[serde(flatten)]
        pub common: EntityCommon,
        pub hostname: String,
        pub ip_address: Option<String>,
        pub mac_address: Option<String>,
        pub cpu_cores: Option<u32>,
        pub memory_gb: Option<u32>,
        pub storage_gb: Option<u32>,
        pub os: Option<String>,
        pub rack_location: Option<String>,
    }
}

impl Server {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        hostname: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let server = Self {
            common: EntityCommon::new(id, name)?,
            hostname: hostname.into(),
            ip_address: None,
            mac_address: None,
            cpu_cores: None,
            memory_gb: None,
            storage_gb: None,
            os: None,
            rack_location: None,
        };
        server.validate()?;
        Ok(server)
    }
}

impl EntityVariant for Server {
    const KIND: EntityKind = EntityKind::Server;

    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn validate(&self) -> Result<(), ModelError> {
        self.common.validate(Self::KIND)?;
        require_non_empty(Self::KIND, "hostname", &self.hostname)
    }

    fn write_properties(&self, raw: &mut RawProperties) {
        put(raw, "hostname", &self.hostname);
        put(raw, "ip_address", &self.ip_address);
        put(raw, "mac_address", &self.mac_address);
        put(raw, "cpu_cores", &self.cpu_cores);
        put(raw, "memory_gb", &self.memory_gb);
        put(raw, "storage_gb", &self.storage_gb);
        put(raw, "os", &self.os);
        put(raw, "rack_location", &self.rack_location);
    }

    fn read_properties(
        common: EntityCommon,
        reader: &PropertyReader<'_>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common,
            hostname: reader.required_string("hostname")?,
            ip_address: reader.optional_string("ip_address")?,
            mac_address: reader.optional_string("mac_address")?,
            cpu_cores: reader.optional_integer("cpu_cores")?,
            memory_gb: reader.optional_integer("memory_gb")?,
            storage_gb: reader.optional_integer("storage_gb")?,
            os: reader.optional_string("os")?,
            rack_location: reader.optional_string("rack_location")?,
        })
    }
}

entity_struct! {
    /// Virtual machine
    pub struct VirtualMachine {
        #[serde(flatten)]
        pub common: EntityCommon,
        pub hostname: String,
        pub ip_address: Option<String>,
        pub cpu_cores: Option<u32>,
        pub memory_gb: Option<u32>,
        pub storage_gb: Option<u32>,
        /// Guest operating system
        pub os: Option<String>,
        pub hypervisor: Option<String>,
        /// Identifier inside the hypervisor
        pub vm_id: Option<String>,
    }
}

impl VirtualMachine {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        hostname: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let vm = Self {
            common: EntityCommon::new(id, name)?,
            hostname: hostname.into(),
            ip_address: None,
            cpu_cores: None,
            memory_gb: None,
            storage_gb: None,
            os: None,
            hypervisor: None,
            vm_id: None,
        };
        vm.validate()?;
        Ok(vm)
    }
}

impl EntityVariant for VirtualMachine {
    const KIND: EntityKind = EntityKind::VirtualMachine;

    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn validate(&self) -> Result<(), ModelError> {
        self.common.validate(Self::KIND)?;
        require_non_empty(Self::KIND, "hostname", &self.hostname)
    }

    fn write_properties(&self, raw: &mut RawProperties) {
        put(raw, "hostname", &self.hostname);
        put(raw, "ip_address", &self.ip_address);
        put(raw, "cpu_cores", &self.cpu_cores);
        put(raw, "memory_gb", &self.memory_gb);
        put(raw, "storage_gb", &self.storage_gb);
        put(raw, "os", &self.os);
        put(raw, "hypervisor", &self.hypervisor);
        put(raw, "vm_id", &self.vm_id);
    }

    fn read_properties(
        common: EntityCommon,
        reader: &PropertyReader<'_>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common,
            hostname: reader.required_string("hostname")?,
            ip_address: reader.optional_string("ip_address")?,
            cpu_cores: reader.optional_integer("cpu_cores")?,
            memory_gb: reader.optional_integer("memory_gb")?,
            storage_gb: reader.optional_integer("storage_gb")?,
            os: reader.optional_string("os")?,
            hypervisor: reader.optional_string("hypervisor")?,
            vm_id: reader.optional_string("vm_id")?,
        })
    }
}

entity_struct! {
    /// Kubernetes pod
    pub struct KubernetesPod {
        #[serde(flatten)]
        pub common: EntityCommon,
        pub namespace: String,
        pub pod_ip: Option<String>,
        /// Kubernetes node the pod is scheduled on
        pub node_name: Option<String>,
        /// Stored as a JSON string
        #[serde(default)]
        pub k8s_labels: BTreeMap<String, String>,
        /// Stored as a JSON string
        #[serde(default)]
        pub annotations: BTreeMap<String, String>,
        /// Running, Pending, ...
        pub phase: Option<String>,
        pub restart_count: Option<u32>,
    }
}

impl KubernetesPod {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let pod = Self {
            common: EntityCommon::new(id, name)?,
            namespace: namespace.into(),
            pod_ip: None,
            node_name: None,
            k8s_labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            phase: None,
            restart_count: None,
        };
        pod.validate()?;
        Ok(pod)
    }
}

impl EntityVariant for KubernetesPod {
    const KIND: EntityKind = EntityKind::KubernetesPod;

    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn validate(&self) -> Result<(), ModelError> {
        self.common.validate(Self::KIND)?;
        require_non_empty(Self::KIND, "namespace", &self.namespace)
    }

    fn write_properties(&self, raw: &mut RawProperties) {
        put(raw, "namespace", &self.namespace);
        put(raw, "pod_ip", &self.pod_ip);
        put(raw, "node_name", &self.node_name);
        put(raw, "k8s_labels", &encode_map(&self.k8s_labels));
        put(raw, "annotations", &encode_map(&self.annotations));
        put(raw, "phase", &self.phase);
        put(raw, "restart_count", &self.restart_count);
    }

    fn read_properties(
        common: EntityCommon,
        reader: &PropertyReader<'_>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common,
            namespace: reader.required_string("namespace")?,
            pod_ip: reader.optional_string("pod_ip")?,
            node_name: reader.optional_string("node_name")?,
            k8s_labels: reader.encoded_map("k8s_labels"),
            annotations: reader.encoded_map("annotations"),
            phase: reader.optional_string("phase")?,
            restart_count: reader.optional_integer("restart_count")?,
        })
    }
}

entity_struct! {
    /// Container
    pub struct Container {
        #[serde(flatten)]
        pub common: EntityCommon,
        pub image: String,
        pub image_tag: Option<String>,
        /// Runtime container ID
        pub container_id: Option<String>,
        /// Exposed ports, e.g. `8080/tcp`
        #[serde(default)]
        pub ports: Vec<String>,
        /// Stored as a JSON string
        #[serde(default)]
        pub environment_vars: BTreeMap<String, String>,
        pub cpu_limit: Option<String>,
        pub memory_limit: Option<String>,
        pub status: Option<String>,
    }
}

impl Container {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let container = Self {
            common: EntityCommon::new(id, name)?,
            image: image.into(),
            image_tag: None,
            container_id: None,
            ports: Vec::new(),
            environment_vars: BTreeMap::new(),
            cpu_limit: None,
            memory_limit: None,
            status: None,
        };
        container.validate()?;
        Ok(container)
    }
}

impl EntityVariant for Container {
    const KIND: EntityKind = EntityKind::Container;

    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn validate(&self) -> Result<(), ModelError> {
        self.common.validate(Self::KIND)?;
        require_non_empty(Self::KIND, "image", &self.image)
    }

    fn write_properties(&self, raw: &mut RawProperties) {
        put(raw, "image", &self.image);
        put(raw, "image_tag", &self.image_tag);
        put(raw, "container_id", &self.container_id);
        put(raw, "ports", &self.ports);
        put(raw, "environment_vars", &encode_map(&self.environment_vars));
        put(raw, "cpu_limit", &self.cpu_limit);
        put(raw, "memory_limit", &self.memory_limit);
        put(raw, "status", &self.status);
    }

    fn read_properties(
        common: EntityCommon,
        reader: &PropertyReader<'_>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            common,
            image: reader.required_string("image")?,
            image_tag: reader.optional_string("image_tag")?,
            container_id: reader.optional_string("container_id")?,
            ports: reader.string_list("ports")?,
            environment_vars: reader.encoded_map("environment_vars"),
            cpu_limit: reader.optional_string("cpu_limit")?,
            memory_limit: reader.optional_string("memory_limit")?,
            status: reader.optional_string("status")?,
        })
    }
}

/// Any topology entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Entity {
    NetworkSwitch(NetworkSwitch),
    NetworkPort(NetworkPort),
    #[serde(rename = "VLAN")]
    Vlan(Vlan),
    Server(Server),
    VirtualMachine(VirtualMachine),
    KubernetesPod(KubernetesPod),
    Container(Container),
}

macro_rules! dispatch {
    ($entity:expr, $inner:ident => $body:expr) => {
        match $entity {
            Entity::NetworkSwitch($inner) => $body,
            Entity::NetworkPort($inner) => $body,
            Entity::Vlan($inner) => $body,
            Entity::Server($inner) => $body,
            Entity::VirtualMachine($inner) => $body,
            Entity::KubernetesPod($inner) => $body,
            Entity::Container($inner) => $body,
        }
    };
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::NetworkSwitch(_) => NetworkSwitch::KIND,
            Entity::NetworkPort(_) => NetworkPort::KIND,
            Entity::Vlan(_) => Vlan::KIND,
            Entity::Server(_) => Server::KIND,
            Entity::VirtualMachine(_) => VirtualMachine::KIND,
            Entity::KubernetesPod(_) => KubernetesPod::KIND,
            Entity::Container(_) => Container::KIND,
        }
    }

    pub fn common(&self) -> &EntityCommon {
        dispatch!(self, inner => inner.common())
    }

    pub fn common_mut(&mut self) -> &mut EntityCommon {
        dispatch!(self, inner => inner.common_mut())
    }

    pub fn id(&self) -> &EntityId {
        self.common().id()
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    /// Hostname for kinds that have one
    pub fn hostname(&self) -> Option<&str> {
        match self {
            Entity::Server(server) => Some(&server.hostname),
            Entity::VirtualMachine(vm) => Some(&vm.hostname),
            _ => None,
        }
    }

    /// Primary IP address for kinds that have one
    pub fn ip_address(&self) -> Option<&str> {
        match self {
            Entity::NetworkSwitch(switch) => switch.ip_address.as_deref(),
            Entity::Server(server) => server.ip_address.as_deref(),
            Entity::VirtualMachine(vm) => vm.ip_address.as_deref(),
            Entity::KubernetesPod(pod) => pod.pod_ip.as_deref(),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        dispatch!(self, inner => inner.validate())
    }

    /// Storage labels: the common supertype plus the kind label
    pub fn labels(&self) -> [&'static str; 2] {
        self.kind().labels()
    }

    /// Full property map for storage, maps already encoded as strings
    pub fn to_raw_properties(&self) -> RawProperties {
        let mut raw = RawProperties::new();
        self.common().write_properties(self.kind(), &mut raw);
        dispatch!(self, inner => inner.write_properties(&mut raw));
        raw
    }

    /// Rebuild an entity from stored properties
    ///
    /// The stored `kind` selects the variant; all required fields must be
    /// present with the right types and the result must validate.
    pub fn from_properties(properties: &PropertyMap) -> Result<Self, ModelError> {
        let kind = match properties.get("kind") {
            Some(value) => value
                .as_str()
                .ok_or_else(|| ModelError::UnknownKind(format!("{:?}", value)))?
                .parse::<EntityKind>()?,
            None => {
                return Err(ModelError::MissingField {
                    kind: "Entity",
                    field: "kind",
                })
            }
        };

        let reader = PropertyReader::new(kind.label(), properties);
        let common = EntityCommon::read_properties(&reader)?;

        let entity = match kind {
            EntityKind::NetworkSwitch => {
                Entity::NetworkSwitch(NetworkSwitch::read_properties(common, &reader)?)
            }
            EntityKind::NetworkPort => {
                Entity::NetworkPort(NetworkPort::read_properties(common, &reader)?)
            }
            EntityKind::Vlan => Entity::Vlan(Vlan::read_properties(common, &reader)?),
            EntityKind::Server => Entity::Server(Server::read_properties(common, &reader)?),
            EntityKind::VirtualMachine => {
                Entity::VirtualMachine(VirtualMachine::read_properties(common, &reader)?)
            }
            EntityKind::KubernetesPod => {
                Entity::KubernetesPod(KubernetesPod::read_properties(common, &reader)?)
            }
            EntityKind::Container => {
                Entity::Container(Container::read_properties(common, &reader)?)
            }
        };

        entity.validate()?;
        Ok(entity)
    }

    /// Rebuild from a node, checking the kind label agrees with the `kind` property
    pub fn from_node(labels: &[String], properties: &PropertyMap) -> Result<Self, ModelError> {
        let entity = Self::from_properties(properties)?;
        let kind = entity.kind();
        if !labels.iter().any(|label| label == kind.label()) {
            return Err(ModelError::KindMismatch {
                expected: kind,
                found: labels.join(":"),
            });
        }
        Ok(entity)
    }

    /// Set one extension property and mark the entity modified
    pub fn set_extended_property(&mut self, key: impl Into<String>, value: Value) {
        let common = self.common_mut();
        common.extended_properties.insert(key.into(), value);
        common.touch();
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Entity {
                fn from(value: $variant) -> Self {
                    Entity::$variant(value)
                }
            }
        )*
    };
}

impl_from_variant!(
    NetworkSwitch,
    NetworkPort,
    Vlan,
    Server,
    VirtualMachine,
    KubernetesPod,
    Container,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{flatten_for_write, PropertyValue};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    fn stored(entity: &Entity) -> PropertyMap {
        let flattened = flatten_for_write(entity.to_raw_properties());
        assert!(flattened.dropped.is_empty(), "unexpected nested fields: {:?}", flattened.dropped);
        flattened.properties
    }

    #[test]
    fn test_entity_id_rejects_empty() {
        assert_eq!(EntityId::new(""), Err(ModelError::EmptyIdentifier));
        assert_eq!(EntityId::new("   "), Err(ModelError::EmptyIdentifier));
        assert_eq!(EntityId::new("srv-001").unwrap().as_str(), "srv-001");
    }

    #[test]
    fn test_generated_ids_have_prefix() {
        let a = EntityId::generate("server");
        let b = EntityId::generate("server");
        assert!(a.as_str().starts_with("server-"));
        assert_eq!(a.as_str().len(), "server-".len() + 8);
        assert_ne!(a, b);
    }

    #[test_case(Server::new("srv-1", "web", "").map(Entity::from), "hostname"; "server without hostname")]
    #[test_case(VirtualMachine::new("vm-1", "app", " ").map(Entity::from), "hostname"; "vm without hostname")]
    #[test_case(KubernetesPod::new("pod-1", "api", "").map(Entity::from), "namespace"; "pod without namespace")]
    #[test_case(Container::new("c-1", "nginx", "").map(Entity::from), "image"; "container without image")]
    #[test_case(NetworkSwitch::new("sw-1", "").map(Entity::from), "name"; "switch without name")]
    fn test_missing_required_field_rejected(result: Result<Entity, ModelError>, field: &str) {
        match result {
            Err(ModelError::MissingField { field: missing, .. }) => assert_eq!(missing, field),
            other => panic!("expected missing {}, got {:?}", field, other),
        }
    }

    #[test]
    fn test_vlan_id_range() {
        assert!(Vlan::new("vlan-0", "VLAN-0", 0).is_err());
        assert!(Vlan::new("vlan-4095", "VLAN-4095", 4095).is_err());
        assert!(Vlan::new("vlan-100", "VLAN-100", 100).is_ok());
    }

    #[test]
    fn test_kind_is_fixed_by_variant() {
        let entity: Entity = Server::new("srv-1", "web", "web01").unwrap().into();
        assert_eq!(entity.kind(), EntityKind::Server);
        assert_eq!(entity.labels(), ["Entity", "Server"]);

        let props = stored(&entity);
        assert_eq!(props.get("kind"), Some(&PropertyValue::from("Server")));
    }

    #[test]
    fn test_vlan_without_integer_vlan_id_rejected() {
        let entity: Entity = Vlan::new("vlan-10", "VLAN-10", 10).unwrap().into();
        let mut props = stored(&entity);

        props.insert("vlan_id".to_string(), PropertyValue::from("ten"));
        assert!(matches!(
            Entity::from_properties(&props),
            Err(ModelError::InvalidField { field: "vlan_id", .. })
        ));

        props.remove("vlan_id");
        assert!(matches!(
            Entity::from_properties(&props),
            Err(ModelError::MissingField { field: "vlan_id", .. })
        ));
    }

    #[test]
    fn test_unknown_stored_kind_rejected() {
        let entity: Entity = Server::new("srv-1", "web", "web01").unwrap().into();
        let mut props = stored(&entity);
        props.insert("kind".to_string(), PropertyValue::from("Mainframe"));
        assert_eq!(
            Entity::from_properties(&props),
            Err(ModelError::UnknownKind("Mainframe".to_string()))
        );
    }

    #[test]
    fn test_label_kind_mismatch_rejected() {
        let entity: Entity = Server::new("srv-1", "web", "web01").unwrap().into();
        let props = stored(&entity);
        let labels = vec!["Entity".to_string(), "VirtualMachine".to_string()];
        assert!(matches!(
            Entity::from_node(&labels, &props),
            Err(ModelError::KindMismatch { expected: EntityKind::Server, .. })
        ));
    }

    #[test]
    fn test_pod_round_trip_through_storage() {
        let mut pod = KubernetesPod::new("pod-1", "api-7f9", "production").unwrap();
        pod.k8s_labels.insert("app".to_string(), "api".to_string());
        pod.annotations
            .insert("prometheus.io/scrape".to_string(), "true".to_string());
        pod.restart_count = Some(3);
        pod.phase = Some("Running".to_string());
        let mut entity: Entity = pod.into();
        entity.set_extended_property("team", json!({"name": "core", "oncall": ["a", "b"]}));

        let props = stored(&entity);
        assert!(matches!(props.get("k8s_labels"), Some(PropertyValue::String(_))));
        assert!(matches!(props.get("extended_properties"), Some(PropertyValue::String(_))));

        let restored = Entity::from_node(&["Entity".to_string(), "KubernetesPod".to_string()], &props).unwrap();
        assert_eq!(restored, entity);
    }

    #[test]
    fn test_container_round_trip_through_storage() {
        let mut container = Container::new("c-1", "nginx-1", "nginx").unwrap();
        container.image_tag = Some("1.27".to_string());
        container.ports = vec!["80/tcp".to_string(), "443/tcp".to_string()];
        container
            .environment_vars
            .insert("RUST_LOG".to_string(), "info".to_string());
        let entity: Entity = container.into();

        let restored = Entity::from_properties(&stored(&entity)).unwrap();
        assert_eq!(restored, entity);
    }

    #[test]
    fn test_corrupt_metadata_reads_as_empty() {
        let mut server = Server::new("srv-1", "web", "web01").unwrap();
        server
            .common
            .extended_properties
            .insert("owner".to_string(), json!("ops"));
        let entity: Entity = server.into();

        let mut props = stored(&entity);
        props.insert("extended_properties".to_string(), PropertyValue::from("{oops"));

        let restored = Entity::from_properties(&props).unwrap();
        assert!(restored.common().extended_properties.is_empty());
        assert_eq!(restored.id(), entity.id());
    }

    #[test]
    fn test_entity_json_is_tagged_by_kind() {
        let entity: Entity = Vlan::new("vlan-10", "VLAN-Production", 10).unwrap().into();
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["kind"], "VLAN");
        assert_eq!(json["vlan_id"], 10);

        let back: Entity = serde_json::from_value(json).unwrap();
        assert_eq!(back, entity);
    }

    fn tagged(kind: &str, fields: Value) -> Value {
        let mut json = json!({
            "kind": kind,
            "id": "x-1",
            "name": "x",
            "created_at": "2026-01-19T12:00:00Z",
            "updated_at": "2026-01-19T12:00:00Z",
        });
        if let (Some(target), Value::Object(extra)) = (json.as_object_mut(), fields) {
            target.extend(extra);
        }
        json
    }

    #[test_case(tagged("VLAN", json!({"name": "", "vlan_id": 10})), "name"; "vlan with empty name")]
    #[test_case(tagged("VLAN", json!({"vlan_id": 0})), "outside 1-4094"; "vlan id zero")]
    #[test_case(tagged("VLAN", json!({"vlan_id": 4095})), "outside 1-4094"; "vlan id above range")]
    #[test_case(tagged("Server", json!({"hostname": " "})), "hostname"; "server with blank hostname")]
    #[test_case(tagged("KubernetesPod", json!({"namespace": ""})), "namespace"; "pod with empty namespace")]
    #[test_case(tagged("Container", json!({"image": ""})), "image"; "container with empty image")]
    #[test_case(tagged("NetworkSwitch", json!({"id": ""})), "Identifier is empty"; "switch with empty id")]
    fn test_invalid_entity_json_rejected(json: Value, reason: &str) {
        let err = serde_json::from_value::<Entity>(json).unwrap_err();
        assert!(err.to_string().contains(reason), "unexpected error: {}", err);
    }

    #[test]
    fn test_variant_json_is_validated() {
        let json = tagged("VLAN", json!({"vlan_id": 0}));
        assert!(serde_json::from_value::<Vlan>(json).is_err());

        let json = tagged("Server", json!({"hostname": "web-01.example.com"}));
        let server: Server = serde_json::from_value(json).unwrap();
        assert_eq!(server.hostname, "web-01.example.com");
    }
}
