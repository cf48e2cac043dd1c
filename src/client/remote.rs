//! RemoteClient — network client for a Neo4j server
//!
//! Uses the HTTP transactional Cypher endpoint
//! (`POST /db/{database}/tx/commit`), one auto-committed request per
//! statement.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use super::models::{ElementIds, GraphEdge, GraphNode, QueryResult, RecordGraph, StatementSummary};
use super::{GraphClient, StoreError, StoreResult};
use crate::config::StoreConfig;
use crate::graph::Statement;

/// Network client for a running Neo4j server.
pub struct RemoteClient {
    http_base_url: String,
    database: String,
    user: String,
    password: String,
    http_client: Client,
    closed: AtomicBool,
}

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: Vec<TxStatement<'a>>,
}

#[derive(Serialize)]
struct TxStatement<'a> {
    statement: &'a str,
    parameters: &'a Map<String, Value>,
    #[serde(rename = "resultDataContents")]
    result_data_contents: [&'static str; 2],
    #[serde(rename = "includeStats")]
    include_stats: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TxResult {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
    stats: Option<TxStats>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    #[serde(default)]
    row: Vec<Value>,
    /// Parallel to `row`: element references per column
    #[serde(default)]
    meta: Vec<Value>,
    graph: Option<TxGraph>,
}

#[derive(Debug, Deserialize)]
struct TxGraph {
    #[serde(default)]
    nodes: Vec<TxNode>,
    #[serde(default)]
    relationships: Vec<TxRelationship>,
}

#[derive(Debug, Deserialize)]
struct TxNode {
    id: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    properties: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TxRelationship {
    id: String,
    #[serde(rename = "type")]
    rel_type: String,
    #[serde(rename = "startNode")]
    start_node: String,
    #[serde(rename = "endNode")]
    end_node: String,
    #[serde(default)]
    properties: HashMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct TxStats {
    #[serde(default)]
    nodes_created: u64,
    #[serde(default)]
    relationships_created: u64,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

impl RemoteClient {
    /// Create a client without contacting the server.
    ///
    /// # Example
    /// ```no_run
    /// # use kgbuilder::{RemoteClient, StoreConfig};
    /// let client = RemoteClient::new(&StoreConfig::default());
    /// ```
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            http_base_url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            http_client: Client::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a client and verify the server accepts queries
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let client = Self::new(config);
        client.ping().await?;
        info!(url = %client.http_base_url, database = %client.database, "Connected to graph store");
        Ok(client)
    }

    /// Run a trivial query against the server
    pub async fn ping(&self) -> StoreResult<()> {
        self.run("RETURN 1", &Map::new()).await.map(|_| ())
    }

    fn endpoint(&self) -> String {
        format!("{}/db/{}/tx/commit", self.http_base_url, self.database)
    }

    /// Execute a POST request to the commit endpoint
    async fn run(&self, cypher: &str, parameters: &Map<String, Value>) -> StoreResult<TxResult> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }

        let body = TxRequest {
            statements: vec![TxStatement {
                statement: cypher,
                parameters,
                result_data_contents: ["row", "graph"],
                include_stats: true,
            }],
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<TxResponse>(&text) {
            Ok(parsed) if status.is_success() || !parsed.errors.is_empty() => {
                first_result(parsed)
            }
            Err(e) if status.is_success() => Err(StoreError::SerializationError(e)),
            _ => Err(StoreError::StatusError {
                status: status.as_u16(),
                body: text,
            }),
        }
    }
}

/// Extract the single statement result, surfacing server-side errors
pub(crate) fn first_result(response: TxResponse) -> StoreResult<TxResult> {
    if let Some(error) = response.errors.into_iter().next() {
        return Err(StoreError::QueryError {
            code: error.code,
            message: error.message,
        });
    }
    Ok(response.results.into_iter().next().unwrap_or_default())
}

impl TxResult {
    fn summary(&self) -> StatementSummary {
        let stats = self.stats.as_ref();
        StatementSummary {
            nodes_created: stats.map(|s| s.nodes_created).unwrap_or(0),
            relationships_created: stats.map(|s| s.relationships_created).unwrap_or(0),
        }
    }

    pub(crate) fn into_query_result(self) -> QueryResult {
        let mut result = QueryResult {
            columns: self.columns,
            ..Default::default()
        };

        for row in self.data {
            let columns = result
                .columns
                .iter()
                .zip(&row.meta)
                .map(|(column, meta)| {
                    let mut ids = ElementIds::default();
                    collect_element_ids(meta, &mut ids);
                    (column.clone(), ids)
                })
                .collect();

            let graph = row
                .graph
                .map(|g| RecordGraph {
                    nodes: g
                        .nodes
                        .into_iter()
                        .map(|n| GraphNode {
                            id: n.id,
                            labels: n.labels,
                            properties: n.properties,
                        })
                        .collect(),
                    edges: g
                        .relationships
                        .into_iter()
                        .map(|r| GraphEdge {
                            id: r.id,
                            source: r.start_node,
                            target: r.end_node,
                            edge_type: r.rel_type,
                            properties: r.properties,
                        })
                        .collect(),
                    columns,
                })
                .unwrap_or_default();
            result.push_record(row.row, graph);
        }

        result
    }
}

/// Walk a `meta` entry (object, list of objects for paths, or null)
fn collect_element_ids(meta: &Value, ids: &mut ElementIds) {
    match meta {
        Value::Array(items) => items.iter().for_each(|item| collect_element_ids(item, ids)),
        Value::Object(obj) => {
            let id = match obj.get("id") {
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::String(s)) => s.clone(),
                _ => return,
            };
            match obj.get("type").and_then(Value::as_str) {
                Some("node") => ids.nodes.push(id),
                Some("relationship") => ids.edges.push(id),
                _ => {}
            }
        }
        _ => {}
    }
}

#[async_trait]
impl GraphClient for RemoteClient {
    async fn execute(&self, statement: &Statement) -> StoreResult<StatementSummary> {
        let (cypher, params) = statement.to_cypher();
        debug!(%cypher, "executing");
        let result = self.run(&cypher, &params).await?;
        Ok(result.summary())
    }

    async fn query(&self, cypher: &str) -> StoreResult<QueryResult> {
        let result = self.run(cypher, &Map::new()).await?;
        Ok(result.into_query_result())
    }

    async fn close(&self) -> StoreResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(url = %self.http_base_url, "Closed graph store connection");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> StoreResult<TxResult> {
        first_result(serde_json::from_str(text).unwrap())
    }

    #[test]
    fn test_endpoint() {
        let client = RemoteClient::new(&StoreConfig {
            url: "http://db.local:7474/".to_string(),
            database: "countries".to_string(),
            ..Default::default()
        });
        assert_eq!(client.endpoint(), "http://db.local:7474/db/countries/tx/commit");
    }

    #[test]
    fn test_request_body_shape() {
        let (cypher, params) =
            Statement::merge_node(crate::graph::NodeKey::country("Testland")).to_cypher();
        let body = TxRequest {
            statements: vec![TxStatement {
                statement: &cypher,
                parameters: &params,
                result_data_contents: ["row", "graph"],
                include_stats: true,
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        let stmt = &value["statements"][0];
        assert_eq!(stmt["statement"], "MERGE (n:Country {name: $name})");
        assert_eq!(stmt["parameters"]["name"], "Testland");
        assert_eq!(stmt["resultDataContents"][1], "graph");
        assert_eq!(stmt["includeStats"], true);
    }

    #[test]
    fn test_parse_stats() {
        let result = parse(
            r#"{"results":[{"columns":[],"data":[],"stats":{"contains_updates":true,"nodes_created":1,"relationships_created":0}}],"errors":[]}"#,
        )
        .unwrap();
        assert_eq!(
            result.summary(),
            StatementSummary {
                nodes_created: 1,
                relationships_created: 0
            }
        );
    }

    #[test]
    fn test_parse_server_error() {
        let err = parse(
            r#"{"results":[],"errors":[{"code":"Neo.ClientError.Statement.SyntaxError","message":"Invalid input 'MATC'"}]}"#,
        )
        .unwrap_err();
        match err {
            StoreError::QueryError { code, message } => {
                assert_eq!(code, "Neo.ClientError.Statement.SyntaxError");
                assert!(message.contains("MATC"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_path_result() {
        let text = r#"{
          "results": [{
            "columns": ["p"],
            "data": [{
              "row": [[{"name": "Testland"}, {}, {"name": "Testville"}]],
              "meta": [],
              "graph": {
                "nodes": [
                  {"id": "1", "labels": ["Country"], "properties": {"name": "Testland"}},
                  {"id": "2", "labels": ["City"], "properties": {"name": "Testville"}}
                ],
                "relationships": [
                  {"id": "10", "type": "LOCATED_AT", "startNode": "1", "endNode": "2", "properties": {}}
                ]
              }
            }]
          }],
          "errors": []
        }"#;
        let result = parse(text).unwrap().into_query_result();

        assert_eq!(result.columns, vec!["p".to_string()]);
        assert_eq!(result.len(), 1);
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.edges[0].edge_type, "LOCATED_AT");
        assert_eq!(result.graphs[0].edges[0].source, "1");
        assert_eq!(result.graphs[0].node("2").unwrap().property_str("name"), Some("Testville"));
    }

    #[test]
    fn test_parse_row_without_graph() {
        let text = r#"{"results":[{"columns":["c.name"],"data":[{"row":["Testland"]}]}],"errors":[]}"#;
        let result = parse(text).unwrap().into_query_result();
        assert_eq!(result.records, vec![vec![serde_json::json!("Testland")]]);
        assert!(result.graphs[0].is_empty());
    }

    #[tokio::test]
    async fn test_closed_client_rejects_work() {
        let client = RemoteClient::new(&StoreConfig::default());
        client.close().await.unwrap();
        assert!(matches!(client.query("RETURN 1").await, Err(StoreError::Closed)));
    }

    #[test]
    fn test_parse_meta_per_column() {
        let text = r#"{
          "results": [{
            "columns": ["p", "y"],
            "data": [{
              "row": [[{"name": "Testland"}, {}, {"name": "Testville"}], {"name": "Elsewhere"}],
              "meta": [
                [{"id": 1, "type": "node"}, {"id": 1, "type": "relationship"}, {"id": 2, "type": "node"}],
                {"id": 3, "type": "node"}
              ],
              "graph": {
                "nodes": [
                  {"id": "1", "labels": ["Country"], "properties": {"name": "Testland"}},
                  {"id": "2", "labels": ["City"], "properties": {"name": "Testville"}},
                  {"id": "3", "labels": ["City"], "properties": {"name": "Elsewhere"}}
                ],
                "relationships": [
                  {"id": "1", "type": "LOCATED_AT", "startNode": "1", "endNode": "2", "properties": {}}
                ]
              }
            }]
          }],
          "errors": []
        }"#;
        let result = parse(text).unwrap().into_query_result();
        let graph = &result.graphs[0];

        assert_eq!(graph.columns["p"].nodes, ["1", "2"]);
        assert_eq!(graph.columns["p"].edges, ["1"]);
        assert_eq!(graph.columns["y"].nodes, ["3"]);
        assert_eq!(graph.for_column("p").nodes.len(), 2);
    }
}
