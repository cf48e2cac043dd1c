//! Graph store boundary
//!
//! Provides two client implementations:
//!
//! - **`RemoteClient`** — talks to a Neo4j server over its HTTP transactional
//!   Cypher endpoint. Used by the CLI.
//! - **`EmbeddedClient`** — in-process `MemoryGraph`, no network. Applies the
//!   same merge semantics; used for dry runs and tests.
//!
//! Both implement the `GraphClient` trait. A client is constructed
//! explicitly, passed by reference to whoever needs it and released with
//! [`GraphClient::close`]; any call after that fails with
//! [`StoreError::Closed`].

pub mod embedded;
pub mod models;
pub mod remote;

pub use embedded::EmbeddedClient;
pub use models::{ElementIds, GraphEdge, GraphNode, QueryResult, RecordGraph, StatementSummary};
pub use remote::RemoteClient;

use crate::graph::Statement;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by graph store clients
#[derive(Error, Debug)]
pub enum StoreError {
    /// Query rejected by the server
    #[error("Query error [{code}]: {message}")]
    QueryError { code: String, message: String },

    /// Unexpected HTTP status without a structured error body
    #[error("Server returned {status}: {body}")]
    StatusError { status: u16, body: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Connection is closed")]
    Closed,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Unified client interface for the graph store
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Apply one idempotent write as its own unit of work
    async fn execute(&self, statement: &Statement) -> StoreResult<StatementSummary>;

    /// Execute an arbitrary Cypher query
    async fn query(&self, cypher: &str) -> StoreResult<QueryResult>;

    /// Release the connection
    async fn close(&self) -> StoreResult<()>;
}
