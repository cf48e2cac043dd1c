//! In-memory graph with merge-by-key writes
//!
//! Nodes live in an arena indexed by `NodeId`, with a key index
//! (`NodeKey -> NodeId`) for merges and a per-label index for lookups.
//! Edges are deduplicated on `(source, type, target)`.

use super::types::{EdgeId, NodeId};
use super::{NodeKey, NodeLabel, RelType, Statement};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A stored node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNode {
    pub id: NodeId,
    pub key: NodeKey,
}

/// A stored edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub rel_type: RelType,
}

/// Counters for one applied statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub nodes_created: u64,
    pub relationships_created: u64,
}

/// In-memory graph storage
#[derive(Debug, Default)]
pub struct MemoryGraph {
    /// Node storage (NodeId -> Node)
    nodes: Vec<StoredNode>,

    /// Edge storage (EdgeId -> Edge)
    edges: Vec<StoredEdge>,

    /// Merge index
    key_index: HashMap<NodeKey, NodeId>,

    /// Label index for fast lookups
    label_index: HashMap<NodeLabel, BTreeSet<NodeId>>,

    /// Edge identity index
    edge_index: HashMap<(NodeId, RelType, NodeId), EdgeId>,
}

impl MemoryGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a statement with merge semantics
    pub fn apply(&mut self, statement: &Statement) -> MergeOutcome {
        match statement {
            Statement::MergeNode(key) => {
                let (_, created) = self.merge_node(key.clone());
                MergeOutcome {
                    nodes_created: created as u64,
                    relationships_created: 0,
                }
            }
            Statement::MergeRelationship { from, rel_type, to } => {
                let created = match (self.find_node(from), self.find_node(to)) {
                    (Some(source), Some(target)) => self
                        .merge_edge(source, *rel_type, target)
                        .is_some_and(|(_, created)| created),
                    // MATCH found nothing: the MERGE is a no-op
                    _ => false,
                };
                MergeOutcome {
                    nodes_created: 0,
                    relationships_created: created as u64,
                }
            }
        }
    }

    /// Return the node for `key`, creating it if absent
    fn merge_node(&mut self, key: NodeKey) -> (NodeId, bool) {
        if let Some(&id) = self.key_index.get(&key) {
            return (id, false);
        }

        let id = NodeId::from_index(self.nodes.len());
        self.label_index.entry(key.label).or_default().insert(id);
        self.key_index.insert(key.clone(), id);
        self.nodes.push(StoredNode { id, key });
        (id, true)
    }

    /// Return the edge `source -[rel_type]-> target`, creating it if absent.
    /// `None` if either endpoint is not in this graph.
    fn merge_edge(&mut self, source: NodeId, rel_type: RelType, target: NodeId) -> Option<(EdgeId, bool)> {
        if self.get_node(source).is_none() || self.get_node(target).is_none() {
            return None;
        }
        if let Some(&id) = self.edge_index.get(&(source, rel_type, target)) {
            return Some((id, false));
        }

        let id = EdgeId::from_index(self.edges.len());
        self.edges.push(StoredEdge {
            id,
            source,
            target,
            rel_type,
        });
        self.edge_index.insert((source, rel_type, target), id);
        Some((id, true))
    }

    pub fn find_node(&self, key: &NodeKey) -> Option<NodeId> {
        self.key_index.get(key).copied()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&StoredNode> {
        self.nodes.get(id.index())
    }

    pub fn has_edge(&self, from: &NodeKey, rel_type: RelType, to: &NodeKey) -> bool {
        match (self.find_node(from), self.find_node(to)) {
            (Some(s), Some(t)) => self.edge_index.contains_key(&(s, rel_type, t)),
            _ => false,
        }
    }

    /// Get all nodes with a specific label, in creation order
    pub fn get_nodes_by_label(&self, label: NodeLabel) -> Vec<&StoredNode> {
        self.label_index
            .get(&label)
            .map(|ids| ids.iter().filter_map(|&id| self.get_node(id)).collect())
            .unwrap_or_default()
    }

    pub fn all_nodes(&self) -> &[StoredNode] {
        &self.nodes
    }

    pub fn all_edges(&self) -> &[StoredEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
