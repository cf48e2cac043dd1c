//! Arena positions for nodes and edges

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a node in the node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

/// Position of an edge in the edge arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(u64);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u64)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub(crate) fn from_index(index: usize) -> Self {
        EdgeId(index as u64)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// Rendered bare: this is the element id handed out in query records
impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
