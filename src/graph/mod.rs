//! Graph model for the country dataset
//!
//! Every node is identified by a single key property and every relationship
//! by its type plus endpoint keys, so all writes can be expressed as
//! merge-by-key statements:
//! - Country(name), City(name), Currency(code), Language(name)
//! - Country -[LOCATED_AT | LARGEST_CITY_IN]-> City
//! - Country -[HAS_CURRENCY]-> Currency, Country -[SPEAKS]-> Language

pub mod store;
pub mod types;

pub use store::{MemoryGraph, MergeOutcome, StoredEdge, StoredNode};
pub use types::{EdgeId, NodeId};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Language key used when the source row has none
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Currency key used when the source row has none
pub const UNKNOWN_CURRENCY: &str = "UNKNOWN";

/// Node labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum NodeLabel {
    Country,
    City,
    Currency,
    Language,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Country => "Country",
            NodeLabel::City => "City",
            NodeLabel::Currency => "Currency",
            NodeLabel::Language => "Language",
        }
    }

    /// Name of the identifying property
    pub fn key_property(&self) -> &'static str {
        match self {
            NodeLabel::Currency => "code",
            _ => "name",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum RelType {
    LocatedAt,
    LargestCityIn,
    HasCurrency,
    Speaks,
}

impl RelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelType::LocatedAt => "LOCATED_AT",
            RelType::LargestCityIn => "LARGEST_CITY_IN",
            RelType::HasCurrency => "HAS_CURRENCY",
            RelType::Speaks => "SPEAKS",
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a node: its label and key value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeKey {
    pub label: NodeLabel,
    pub key: String,
}

impl NodeKey {
    pub fn new(label: NodeLabel, key: impl Into<String>) -> Self {
        Self {
            label,
            key: key.into(),
        }
    }

    pub fn country(name: impl Into<String>) -> Self {
        Self::new(NodeLabel::Country, name)
    }

    pub fn city(name: impl Into<String>) -> Self {
        Self::new(NodeLabel::City, name)
    }

    pub fn currency(code: impl Into<String>) -> Self {
        Self::new(NodeLabel::Currency, code)
    }

    pub fn language(name: impl Into<String>) -> Self {
        Self::new(NodeLabel::Language, name)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{} {:?})", self.label, self.label.key_property(), self.key)
    }
}

/// A single idempotent write against the graph store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    /// Create the node if no node with this label and key exists
    MergeNode(NodeKey),
    /// Create the edge if both endpoints exist and are not yet linked by it
    MergeRelationship {
        from: NodeKey,
        rel_type: RelType,
        to: NodeKey,
    },
}

impl Statement {
    pub fn merge_node(key: NodeKey) -> Self {
        Statement::MergeNode(key)
    }

    pub fn merge_relationship(from: NodeKey, rel_type: RelType, to: NodeKey) -> Self {
        Statement::MergeRelationship { from, rel_type, to }
    }

    /// Render as parameterized Cypher
    ///
    /// Labels and relationship types come from closed enums, so only key
    /// values travel as parameters.
    pub fn to_cypher(&self) -> (String, Map<String, Value>) {
        match self {
            Statement::MergeNode(node) => {
                let prop = node.label.key_property();
                let cypher = format!("MERGE (n:{} {{{}: ${}}})", node.label, prop, prop);
                let mut params = Map::new();
                params.insert(prop.to_string(), json!(node.key));
                (cypher, params)
            }
            Statement::MergeRelationship { from, rel_type, to } => {
                let cypher = format!(
                    "MATCH (a:{} {{{}: $from}}), (b:{} {{{}: $to}}) MERGE (a)-[:{}]->(b)",
                    from.label,
                    from.label.key_property(),
                    to.label,
                    to.label.key_property(),
                    rel_type,
                );
                let mut params = Map::new();
                params.insert("from".to_string(), json!(from.key));
                params.insert("to".to_string(), json!(to.key));
                (cypher, params)
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::MergeNode(node) => write!(f, "MERGE {}", node),
            Statement::MergeRelationship { from, rel_type, to } => {
                write!(f, "MERGE {}-[:{}]->{}", from, rel_type, to)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_properties() {
        assert_eq!(NodeLabel::Country.key_property(), "name");
        assert_eq!(NodeLabel::City.key_property(), "name");
        assert_eq!(NodeLabel::Language.key_property(), "name");
        assert_eq!(NodeLabel::Currency.key_property(), "code");
    }

    #[test]
    fn test_merge_node_cypher() {
        let (cypher, params) = Statement::merge_node(NodeKey::currency("TST")).to_cypher();
        assert_eq!(cypher, "MERGE (n:Currency {code: $code})");
        assert_eq!(params.get("code"), Some(&json!("TST")));
        assert_eq!(params.len(), 1);

        let (cypher, params) = Statement::merge_node(NodeKey::country("Testland")).to_cypher();
        assert_eq!(cypher, "MERGE (n:Country {name: $name})");
        assert_eq!(params.get("name"), Some(&json!("Testland")));
    }

    #[test]
    fn test_merge_relationship_cypher() {
        let stmt = Statement::merge_relationship(
            NodeKey::country("Testland"),
            RelType::HasCurrency,
            NodeKey::currency("TST"),
        );
        let (cypher, params) = stmt.to_cypher();
        assert_eq!(
            cypher,
            "MATCH (a:Country {name: $from}), (b:Currency {code: $to}) MERGE (a)-[:HAS_CURRENCY]->(b)"
        );
        assert_eq!(params.get("from"), Some(&json!("Testland")));
        assert_eq!(params.get("to"), Some(&json!("TST")));
    }

    #[test]
    fn test_key_values_are_not_inlined() {
        let stmt = Statement::merge_node(NodeKey::city("O'Brien\"} DETACH DELETE n //"));
        let (cypher, _) = stmt.to_cypher();
        assert_eq!(cypher, "MERGE (n:City {name: $name})");
    }

    #[test]
    fn test_display() {
        let stmt = Statement::merge_relationship(
            NodeKey::country("Testland"),
            RelType::Speaks,
            NodeKey::language(UNKNOWN_LANGUAGE),
        );
        assert_eq!(
            stmt.to_string(),
            "MERGE (Country:name \"Testland\")-[:SPEAKS]->(Language:name \"Unknown\")"
        );
    }
}
