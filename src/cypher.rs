// Copyright (c) 2025 - Cowboy AI, Inc.

//! Cypher statements for the topology graph
//!
//! Labels and relationship types cannot be query parameters, so statements
//! that depend on them are rendered here from the closed kind enums. All
//! values travel as parameters:
//!
//! - `$props` - flat property map of a node or edge
//! - `$id`, `$source_id`, `$target_id`, `$start_id`, `$end_id` - entity ids
//! - `$term` - lowercased search term
//! - `$labels` - kind labels restricting a search

use crate::model::{RelationshipKind, ENTITY_LABEL};

/// Connectivity check
pub const PING: &str = "RETURN 1 AS ok";

pub const FIND_NODE: &str = "MATCH (n:Entity {id: $id}) RETURN n LIMIT 1";

/// Undirected shortest path between two entities, as parallel lists
pub const SHORTEST_PATH: &str = r#"
MATCH (a:Entity {id: $start_id}), (b:Entity {id: $end_id})
MATCH p = shortestPath((a)-[*]-(b))
RETURN [n IN nodes(p) | n.id] AS ids,
       [n IN nodes(p) | n.name] AS names,
       [n IN nodes(p) | n.kind] AS kinds,
       [r IN relationships(p) | type(r)] AS relationship_kinds
"#;

pub const ALL_EDGES: &str = r#"
MATCH (a:Entity)-[r]->(b:Entity)
RETURN a.id AS source_id, b.id AS target_id, type(r) AS kind, r
"#;

pub const SEARCH_ANY: &str = r#"
MATCH (n:Entity)
WHERE toLower(n.name) CONTAINS $term
   OR toLower(coalesce(n.hostname, '')) CONTAINS $term
   OR toLower(coalesce(n.ip_address, '')) CONTAINS $term
RETURN n
ORDER BY n.name
"#;

pub const SEARCH_KINDS: &str = r#"
MATCH (n:Entity)
WHERE any(label IN labels(n) WHERE label IN $labels)
  AND toLower(n.name) CONTAINS $term
RETURN n
ORDER BY n.name
"#;

/// Edges first so no node is deleted while still attached
pub const CLEAR: [&str; 2] = ["MATCH ()-[r]->() DELETE r", "MATCH (n) DELETE n"];

pub const COUNT_ENTITIES: &str =
    "MATCH (n:Entity) RETURN n.kind AS kind, count(n) AS count ORDER BY kind";

pub const COUNT_RELATIONSHIPS: &str =
    "MATCH ()-[r]->() RETURN type(r) AS kind, count(r) AS count ORDER BY kind";

/// Backtick-quote an identifier
pub fn quote(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

fn label_expression<S: AsRef<str>>(labels: &[S]) -> String {
    labels
        .iter()
        .map(|label| format!(":{}", quote(label.as_ref())))
        .collect()
}

/// `CREATE` a node carrying every label in `labels`
pub fn create_node<S: AsRef<str>>(labels: &[S]) -> String {
    format!("CREATE (n{}) SET n = $props", label_expression(labels))
}

/// `CREATE` an edge between two existing entities
///
/// Returns one row with `created = 0` when either endpoint is missing.
pub fn create_edge(kind: RelationshipKind) -> String {
    format!(
        "OPTIONAL MATCH (a:{entity} {{id: $source_id}}) \
         OPTIONAL MATCH (b:{entity} {{id: $target_id}}) \
         FOREACH (_ IN CASE WHEN a IS NULL OR b IS NULL THEN [] ELSE [1] END | \
         CREATE (a)-[r:{kind}]->(b) SET r = $props) \
         RETURN CASE WHEN a IS NULL OR b IS NULL THEN 0 ELSE 1 END AS created",
        entity = ENTITY_LABEL,
        kind = quote(kind.type_name()),
    )
}

/// Adjacent entities in either direction, optionally filtered by edge type
pub fn neighbors(kinds: &[RelationshipKind]) -> String {
    let filter = if kinds.is_empty() {
        String::new()
    } else {
        let types: Vec<String> = kinds.iter().map(|k| quote(k.type_name())).collect();
        format!(":{}", types.join("|"))
    };
    format!(
        "MATCH (n:Entity {{id: $id}})-[r{}]-(m:Entity) RETURN m, type(r) AS relationship_kind",
        filter
    )
}

pub fn nodes_by_label(label: &str) -> String {
    format!("MATCH (n:{}) RETURN n", quote(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_node_carries_both_labels() {
        assert_eq!(
            create_node(&["Entity", "VLAN"]),
            "CREATE (n:`Entity`:`VLAN`) SET n = $props"
        );
    }

    #[test]
    fn test_neighbor_filter() {
        assert_eq!(
            neighbors(&[]),
            "MATCH (n:Entity {id: $id})-[r]-(m:Entity) RETURN m, type(r) AS relationship_kind"
        );
        let filtered = neighbors(&[RelationshipKind::Hosts, RelationshipKind::RunsOn]);
        assert!(filtered.contains("-[r:`HOSTS`|`RUNS_ON`]-"));
    }

    #[test]
    fn test_create_edge_is_guarded() {
        let statement = create_edge(RelationshipKind::BelongsTo);
        assert!(statement.contains("CREATE (a)-[r:`BELONGS_TO`]->(b)"));
        assert!(statement.contains("AS created"));
    }

    #[test]
    fn test_quote_escapes_backticks() {
        assert_eq!(quote("odd`label"), "`odd``label`");
        assert_eq!(nodes_by_label("Server"), "MATCH (n:`Server`) RETURN n");
    }

    #[test]
    fn test_clear_deletes_edges_first() {
        assert!(CLEAR[0].contains("DELETE r"));
        assert!(CLEAR[1].contains("DELETE n"));
    }
}
