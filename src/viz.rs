//! Path results to a renderable graph
//!
//! Only the elements of each record's `p` column are drawn; other returned
//! columns are ignored when the store reports per-column element IDs (Neo4j
//! `meta`, the embedded client). Without them the whole record is drawn.
//! Nodes are identified by their `name` property (falling
//! back to `code`, then the store ID), so the same city reached through
//! different paths is drawn once.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::client::{GraphNode, QueryResult};

/// Column expected to carry path values
pub const PATH_COLUMN: &str = "p";

#[derive(Error, Debug)]
pub enum VizError {
    #[error("No data available to visualize.")]
    Empty,

    #[error("Failed to write visualization: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode visualization: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisNode {
    pub id: String,
    pub label: String,
    /// First store label, used for colouring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VisEdge {
    pub from: String,
    pub to: String,
    pub label: String,
}

/// Node/edge graph ready for rendering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisGraph {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
}

fn display_name(node: &GraphNode) -> String {
    node.property_str("name")
        .or_else(|| node.property_str("code"))
        .unwrap_or(&node.id)
        .to_string()
}

impl VisGraph {
    /// Build from the path records of a query result
    pub fn from_query_result(result: &QueryResult) -> Result<Self, VizError> {
        if result.is_empty() {
            return Err(VizError::Empty);
        }
        if result.column_index(PATH_COLUMN).is_none() {
            debug!(columns = ?result.columns, "No path column in result");
            return Ok(Self::default());
        }

        let mut nodes: IndexMap<String, VisNode> = IndexMap::new();
        let mut edges: IndexSet<VisEdge> = IndexSet::new();

        for graph in result.graphs.iter().map(|g| g.for_column(PATH_COLUMN)) {
            for node in &graph.nodes {
                let name = display_name(node);
                nodes.entry(name.clone()).or_insert_with(|| VisNode {
                    id: name.clone(),
                    label: name,
                    group: node.labels.first().cloned(),
                });
            }

            for edge in &graph.edges {
                let (Some(start), Some(end)) = (graph.node(&edge.source), graph.node(&edge.target))
                else {
                    debug!(edge = %edge.id, "Relationship endpoint missing from record");
                    continue;
                };
                edges.insert(VisEdge {
                    from: display_name(start),
                    to: display_name(end),
                    label: edge.edge_type.clone(),
                });
            }
        }

        Ok(Self {
            nodes: nodes.into_values().collect(),
            edges: edges.into_iter().collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Standalone HTML page rendering the graph with vis-network
    pub fn to_html(&self) -> Result<String, VizError> {
        // "</" inside the inline script would end it early
        let nodes = serde_json::to_string(&self.nodes)?.replace("</", "<\\/");
        let edges = serde_json::to_string(&self.edges)?.replace("</", "<\\/");
        Ok(HTML_TEMPLATE
            .replace("__NODES__", &nodes)
            .replace("__EDGES__", &edges))
    }

    pub fn write_html(&self, path: impl AsRef<Path>) -> Result<(), VizError> {
        std::fs::write(path, self.to_html()?)?;
        Ok(())
    }
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Knowledge Graph</title>
<script src="https://unpkg.com/vis-network/standalone/umd/vis-network.min.js"></script>
<style>
  body { margin: 0; }
  #graph { width: 100%; height: 600px; background-color: #f7f9fa; }
</style>
</head>
<body>
<div id="graph"></div>
<script>
  var nodes = new vis.DataSet(__NODES__);
  var edges = new vis.DataSet(__EDGES__);
  new vis.Network(
    document.getElementById("graph"),
    { nodes: nodes, edges: edges },
    {
      nodes: { shape: "dot", size: 12, font: { color: "black" } },
      edges: { arrows: "to", font: { align: "middle" } },
      physics: { stabilization: true }
    }
  );
</script>
</body>
</html>
"#;
