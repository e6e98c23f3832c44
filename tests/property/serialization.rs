// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Storage Serialization
//!
//! Maps carried as a single string property must round-trip losslessly,
//! malformed strings must degrade to an empty map, and any valid entity
//! written to the store must read back equal.

use infra_topology_graph::memory::MemoryBackend;
use infra_topology_graph::model::{Entity, KubernetesPod, Server};
use infra_topology_graph::properties::{decode_map, encode_map, ExtendedProperties};
use infra_topology_graph::GraphStore;
use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Strategies
// ============================================================================

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_filter("finite", |f| f.is_finite()).prop_map(Value::from),
        (0.0f64..1000.0).prop_map(Value::from),
        "[a-zA-Z0-9 _./-]{0,16}".prop_map(Value::from),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn extended_properties() -> impl Strategy<Value = ExtendedProperties> {
    prop::collection::btree_map("[a-z_]{1,10}", json_value(), 0..6)
}

fn string_map() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z./]{1,12}", "[a-zA-Z0-9-]{0,12}", 0..5)
}

/// Write one entity to a fresh store and read it back
fn store_round_trip(entity: &Entity) -> Option<Entity> {
    tokio_test::block_on(async {
        let store = GraphStore::connect(MemoryBackend::new())
            .await
            .expect("memory backend connects");
        store.setup_schema().await;
        assert!(store.create_entity(entity).await);
        store.get_entity(entity.id().as_str()).await
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// decode(encode(map)) == map
    #[test]
    fn prop_extended_properties_round_trip(map in extended_properties()) {
        let encoded = encode_map(&map);
        let decoded: ExtendedProperties = decode_map("extended_properties", &encoded);
        prop_assert_eq!(decoded, map);
    }

    /// Anything that is not a JSON object decodes to an empty map
    #[test]
    fn prop_malformed_map_is_empty(garbage in "[^{]{0,32}") {
        let decoded: ExtendedProperties = decode_map("extended_properties", &garbage);
        prop_assert!(decoded.is_empty());
    }

    #[test]
    fn prop_server_round_trips_through_store(
        id in "[a-z]{1,8}-[0-9]{1,4}",
        name in "[a-zA-Z][a-zA-Z0-9 -]{0,20}",
        hostname in "[a-z]{1,10}\\.example\\.com",
        cpu_cores in proptest::option::of(1u32..256),
        memory_gb in proptest::option::of(1u32..4096),
        os in proptest::option::of("[A-Za-z0-9 .]{1,16}"),
        extended in extended_properties(),
    ) {
        let mut server = Server::new(id, name, hostname).unwrap();
        server.cpu_cores = cpu_cores;
        server.memory_gb = memory_gb;
        server.os = os;
        server.common.extended_properties = extended;
        let entity: Entity = server.into();

        prop_assert_eq!(store_round_trip(&entity), Some(entity));
    }

    #[test]
    fn prop_pod_maps_round_trip_through_store(
        namespace in "[a-z][a-z0-9-]{0,15}",
        labels in string_map(),
        annotations in string_map(),
        restart_count in proptest::option::of(0u32..100),
    ) {
        let mut pod = KubernetesPod::new("pod-prop", "pod", namespace).unwrap();
        pod.k8s_labels = labels;
        pod.annotations = annotations;
        pod.restart_count = restart_count;
        let entity: Entity = pod.into();

        prop_assert_eq!(store_round_trip(&entity), Some(entity));
    }
}
