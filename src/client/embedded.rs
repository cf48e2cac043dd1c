//! EmbeddedClient — in-process graph client
//!
//! Applies statements to a `MemoryGraph` directly, no network needed.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use super::models::{ElementIds, GraphEdge, GraphNode, QueryResult, RecordGraph, StatementSummary};
use super::{GraphClient, StoreError, StoreResult};
use crate::graph::{MemoryGraph, Statement, StoredEdge, StoredNode};
use crate::viz::PATH_COLUMN;

/// In-process client that wraps a `MemoryGraph`.
///
/// Does not evaluate Cypher; [`EmbeddedClient::paths`] exposes the loaded
/// graph in the same record shape a path query returns.
pub struct EmbeddedClient {
    store: RwLock<MemoryGraph>,
    closed: AtomicBool,
}

impl EmbeddedClient {
    /// Create a new EmbeddedClient with a fresh empty graph
    pub fn new() -> Self {
        Self {
            store: RwLock::new(MemoryGraph::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Acquire a read lock on the graph
    pub async fn store_read(&self) -> tokio::sync::RwLockReadGuard<'_, MemoryGraph> {
        self.store.read().await
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    /// Every relationship as a one-hop path record in column `p`
    pub async fn paths(&self) -> StoreResult<QueryResult> {
        self.ensure_open()?;
        let store = self.store.read().await;

        let mut result = QueryResult {
            columns: vec![PATH_COLUMN.to_string()],
            ..Default::default()
        };

        for edge in store.all_edges() {
            let (Some(source), Some(target)) = (store.get_node(edge.source), store.get_node(edge.target))
            else {
                continue;
            };
            let start = to_graph_node(source);
            let end = to_graph_node(target);
            let rel = to_graph_edge(edge);

            let row = vec![json!([
                Value::Object(start.properties.clone().into_iter().collect()),
                json!({}),
                Value::Object(end.properties.clone().into_iter().collect()),
            ])];
            let ids = ElementIds {
                nodes: vec![start.id.clone(), end.id.clone()],
                edges: vec![rel.id.clone()],
            };
            result.push_record(
                row,
                RecordGraph {
                    nodes: vec![start, end],
                    edges: vec![rel],
                    columns: HashMap::from([(PATH_COLUMN.to_string(), ids)]),
                },
            );
        }

        Ok(result)
    }
}

impl Default for EmbeddedClient {
    fn default() -> Self {
        Self::new()
    }
}

fn to_graph_node(node: &StoredNode) -> GraphNode {
    GraphNode {
        id: node.id.to_string(),
        labels: vec![node.key.label.as_str().to_string()],
        properties: HashMap::from([(
            node.key.label.key_property().to_string(),
            json!(node.key.key),
        )]),
    }
}

fn to_graph_edge(edge: &StoredEdge) -> GraphEdge {
    GraphEdge {
        id: edge.id.to_string(),
        source: edge.source.to_string(),
        target: edge.target.to_string(),
        edge_type: edge.rel_type.as_str().to_string(),
        properties: HashMap::new(),
    }
}

#[async_trait]
impl GraphClient for EmbeddedClient {
    async fn execute(&self, statement: &Statement) -> StoreResult<StatementSummary> {
        self.ensure_open()?;
        let outcome = self.store.write().await.apply(statement);
        debug!(%statement, nodes_created = outcome.nodes_created, "applied");
        Ok(StatementSummary {
            nodes_created: outcome.nodes_created,
            relationships_created: outcome.relationships_created,
        })
    }

    async fn query(&self, _cypher: &str) -> StoreResult<QueryResult> {
        self.ensure_open()?;
        Err(StoreError::Unsupported(
            "the embedded graph does not evaluate Cypher".to_string(),
        ))
    }

    async fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
