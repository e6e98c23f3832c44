// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Topology Traversal

use infra_topology_graph::memory::MemoryBackend;
use infra_topology_graph::model::{Entity, NetworkPort, Relationship, RelationshipKind};
use infra_topology_graph::GraphStore;
use proptest::prelude::*;

fn chain_id(i: usize) -> String {
    format!("node-{:03}", i)
}

/// `len` ports linked in a line; edge directions alternate so traversal
/// must ignore direction
fn chain(len: usize) -> (Vec<Entity>, Vec<Relationship>) {
    let entities = (0..len)
        .map(|i| {
            NetworkPort::new(chain_id(i), chain_id(i), i as u32)
                .expect("valid port")
                .into()
        })
        .collect();
    let relationships = (1..len)
        .map(|i| {
            let (source, target) = if i % 2 == 0 {
                (chain_id(i - 1), chain_id(i))
            } else {
                (chain_id(i), chain_id(i - 1))
            };
            Relationship::new(source, target, RelationshipKind::ConnectedTo).expect("valid edge")
        })
        .collect();
    (entities, relationships)
}

proptest! {
    #[test]
    fn prop_path_spans_chain(len in 2usize..20, shortcut in any::<bool>()) {
        let (entities, mut relationships) = chain(len);
        if shortcut && len > 3 {
            relationships.push(
                Relationship::new(chain_id(0), chain_id(len - 1), RelationshipKind::PartOf).unwrap(),
            );
        }

        let path = tokio_test::block_on(async {
            let store = GraphStore::connect(MemoryBackend::new()).await.unwrap();
            let report = store.load_topology(&entities, &relationships).await;
            assert!(report.is_complete());
            store.get_topology_path(&chain_id(0), &chain_id(len - 1)).await
        });

        let path = path.expect("chain is connected");
        prop_assert_eq!(path.nodes.first().map(|n| n.id.clone()), Some(chain_id(0)));
        prop_assert_eq!(path.nodes.last().map(|n| n.id.clone()), Some(chain_id(len - 1)));
        prop_assert_eq!(path.relationship_kinds.len(), path.nodes.len() - 1);

        let expected_hops = if shortcut && len > 3 { 1 } else { len - 1 };
        prop_assert_eq!(path.hop_count(), expected_hops);
    }

    #[test]
    fn prop_disconnected_halves_have_no_path(left in 1usize..8, right in 1usize..8) {
        let (mut entities, mut relationships) = chain(left);
        let offset = left;
        for i in 0..right {
            entities.push(
                NetworkPort::new(chain_id(offset + i), "right", i as u32).unwrap().into(),
            );
            if i > 0 {
                relationships.push(
                    Relationship::new(
                        chain_id(offset + i - 1),
                        chain_id(offset + i),
                        RelationshipKind::ConnectedTo,
                    )
                    .unwrap(),
                );
            }
        }

        let path = tokio_test::block_on(async {
            let store = GraphStore::connect(MemoryBackend::new()).await.unwrap();
            store.load_topology(&entities, &relationships).await;
            store.get_topology_path(&chain_id(0), &chain_id(offset + right - 1)).await
        });
        prop_assert_eq!(path, None);
    }
}
