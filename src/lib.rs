//! Knowledge Graph Builder
//!
//! Turns a tabular country dataset into a property graph:
//!
//! - [`dataset`]: CSV ingestion with missing-value detection
//! - [`schema`]: descriptive schema inference from column headers
//! - [`graph`]: the fixed node/relationship template and an in-memory store
//! - [`client`]: the store boundary (Neo4j over HTTP, or embedded)
//! - [`loader`]: per-row idempotent upserts
//! - [`query`]: predefined example queries
//! - [`refine`]: LLM-backed schema suggestions
//! - [`viz`]: path results to a renderable node/edge graph
//!
//! ## Example Usage
//!
//! ```rust
//! use kgbuilder::{Dataset, EmbeddedClient, GraphLoader};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let csv = "Country,Capital/Major City,Largest city,Official language,Currency-Code\n\
//!            Testland,Testville,Testville,,TST\n";
//! let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
//!
//! let client = EmbeddedClient::new();
//! let report = GraphLoader::new(&client).load(&dataset).await.unwrap();
//! assert_eq!(report.rows_loaded, 1);
//! # }
//! ```

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod dataset;
pub mod graph;
pub mod loader;
pub mod query;
pub mod refine;
pub mod schema;
pub mod viz;

pub use client::{
    EmbeddedClient, GraphClient, QueryResult, RemoteClient, StatementSummary, StoreError,
    StoreResult,
};
pub use config::{AppConfig, ConfigError, LLMProvider, RefineConfig, StoreConfig};
pub use dataset::{Dataset, DatasetError, DatasetResult, Row};
pub use graph::{MemoryGraph, NodeKey, NodeLabel, RelType, Statement, UNKNOWN_CURRENCY, UNKNOWN_LANGUAGE};
pub use loader::{GraphLoader, LoadError, LoadReport, RowPlan};
pub use query::PREDEFINED_QUERIES;
pub use refine::{RefineError, RefineResult, SchemaRefiner};
pub use schema::{infer_schema, normalize_column, InferredSchema, RelationshipDescriptor};
pub use viz::{VisGraph, VizError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert_eq!(version(), VERSION);
    }
}
