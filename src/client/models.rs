//! Data models returned by graph store clients

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::AddAssign;

/// A graph node returned from a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Store-assigned node ID
    pub id: String,
    pub labels: Vec<String>,
    pub properties: HashMap<String, serde_json::Value>,
}

impl GraphNode {
    /// String property, if present
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}

/// A graph edge returned from a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Store-assigned edge ID
    pub id: String,
    /// Source node ID
    pub source: String,
    /// Target node ID
    pub target: String,
    /// Relationship type
    #[serde(rename = "type")]
    pub edge_type: String,
    pub properties: HashMap<String, serde_json::Value>,
}

/// Node and edge IDs held by one column of a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementIds {
    pub nodes: Vec<String>,
    pub edges: Vec<String>,
}

/// Graph elements referenced by a single result record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Elements per column, when the store reports them
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub columns: HashMap<String, ElementIds>,
}

impl RecordGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Elements held by `column`.
    ///
    /// Records without per-column IDs yield every element of the record.
    pub fn for_column(&self, column: &str) -> RecordGraph {
        let Some(ids) = self.columns.get(column) else {
            return self.clone();
        };
        RecordGraph {
            nodes: self
                .nodes
                .iter()
                .filter(|n| ids.nodes.contains(&n.id))
                .cloned()
                .collect(),
            edges: self
                .edges
                .iter()
                .filter(|e| ids.edges.contains(&e.id))
                .cloned()
                .collect(),
            columns: HashMap::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Result of executing a Cypher query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Graph nodes referenced anywhere in the result, deduplicated
    pub nodes: Vec<GraphNode>,
    /// Graph edges referenced anywhere in the result, deduplicated
    pub edges: Vec<GraphEdge>,
    /// Column names
    pub columns: Vec<String>,
    /// Tabular result rows
    pub records: Vec<Vec<serde_json::Value>>,
    /// Per-record graph elements, parallel to `records`
    #[serde(default)]
    pub graphs: Vec<RecordGraph>,
}

impl QueryResult {
    /// Number of result records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the result is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Append a record and fold its graph elements into `nodes`/`edges`
    pub fn push_record(&mut self, row: Vec<serde_json::Value>, graph: RecordGraph) {
        for node in &graph.nodes {
            if !self.nodes.iter().any(|n| n.id == node.id) {
                self.nodes.push(node.clone());
            }
        }
        for edge in &graph.edges {
            if !self.edges.iter().any(|e| e.id == edge.id) {
                self.edges.push(edge.clone());
            }
        }
        self.records.push(row);
        self.graphs.push(graph);
    }

    /// Records as column-name keyed objects
    pub fn to_maps(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.records
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

/// Write counters reported for a statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub nodes_created: u64,
    pub relationships_created: u64,
}

impl AddAssign for StatementSummary {
    fn add_assign(&mut self, other: Self) {
        self.nodes_created += other.nodes_created;
        self.relationships_created += other.relationships_created;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str, name: &str) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            labels: vec!["City".to_string()],
            properties: HashMap::from([("name".to_string(), json!(name))]),
        }
    }

    #[test]
    fn test_push_record_dedups_elements() {
        let mut result = QueryResult {
            columns: vec!["c".to_string()],
            ..Default::default()
        };
        let graph = RecordGraph {
            nodes: vec![node("1", "Testville")],
            ..Default::default()
        };
        result.push_record(vec![json!({"name": "Testville"})], graph.clone());
        result.push_record(vec![json!({"name": "Testville"})], graph);

        assert_eq!(result.len(), 2);
        assert_eq!(result.graphs.len(), 2);
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].property_str("name"), Some("Testville"));
    }

    #[test]
    fn test_to_maps() {
        let result = QueryResult {
            columns: vec!["c.name".to_string(), "currency.code".to_string()],
            records: vec![vec![json!("Testland"), json!("TST")]],
            ..Default::default()
        };
        let maps = result.to_maps();
        assert_eq!(maps[0]["c.name"], "Testland");
        assert_eq!(maps[0]["currency.code"], "TST");
        assert_eq!(result.column_index("currency.code"), Some(1));
    }

    #[test]
    fn test_summary_add_assign() {
        let mut total = StatementSummary::default();
        total += StatementSummary {
            nodes_created: 2,
            relationships_created: 1,
        };
        total += StatementSummary {
            nodes_created: 0,
            relationships_created: 3,
        };
        assert_eq!(total.nodes_created, 2);
        assert_eq!(total.relationships_created, 4);
    }

    #[test]
    fn test_edge_serializes_type() {
        let edge = GraphEdge {
            id: "7".to_string(),
            source: "1".to_string(),
            target: "2".to_string(),
            edge_type: "SPEAKS".to_string(),
            properties: HashMap::new(),
        };
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["type"], "SPEAKS");
    }

    #[test]
    fn test_for_column_keeps_only_that_column() {
        let graph = RecordGraph {
            nodes: vec![node("1", "Testland"), node("2", "Testville"), node("3", "Elsewhere")],
            edges: vec![GraphEdge {
                id: "1".to_string(),
                source: "1".to_string(),
                target: "2".to_string(),
                edge_type: "LOCATED_AT".to_string(),
                properties: HashMap::new(),
            }],
            columns: HashMap::from([
                (
                    "p".to_string(),
                    ElementIds {
                        nodes: vec!["1".to_string(), "2".to_string()],
                        edges: vec!["1".to_string()],
                    },
                ),
                (
                    "y".to_string(),
                    ElementIds {
                        nodes: vec!["3".to_string()],
                        edges: vec![],
                    },
                ),
            ]),
        };

        let p = graph.for_column("p");
        let names: Vec<_> = p.nodes.iter().filter_map(|n| n.property_str("name")).collect();
        assert_eq!(names, ["Testland", "Testville"]);
        assert_eq!(p.edges.len(), 1);

        let y = graph.for_column("y");
        assert_eq!(y.nodes.len(), 1);
        assert!(y.edges.is_empty());

        // No per-column IDs: the whole record
        let plain = RecordGraph {
            columns: HashMap::new(),
            ..graph
        };
        assert_eq!(plain.for_column("p").nodes.len(), 3);
    }
}
