//! Schema refinement
//!
//! Sends the inferred entities and relationships to a text-generation
//! service and hands back whatever it says. The answer is advisory: it is
//! never parsed and never applied to the schema or the store.

pub mod client;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::RefineConfig;
use crate::schema::{InferredSchema, RelationshipDescriptor};

#[derive(Error, Debug)]
pub enum RefineError {
    #[error("LLM API error: {0}")]
    ApiError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type RefineResult<T> = Result<T, RefineError>;

pub struct SchemaRefiner {
    client: client::LLMClient,
}

impl SchemaRefiner {
    pub fn new(config: &RefineConfig) -> RefineResult<Self> {
        let client = client::LLMClient::new(config)?;
        Ok(Self { client })
    }

    /// Ask for improvements to an inferred schema
    pub async fn suggest(&self, schema: &InferredSchema) -> RefineResult<String> {
        self.suggest_for(&schema.entities, &schema.relationships).await
    }

    /// Ask for improvements given entity and relationship lists
    pub async fn suggest_for(
        &self,
        entities: &[String],
        relationships: &[RelationshipDescriptor],
    ) -> RefineResult<String> {
        let prompt = build_prompt(entities, relationships)?;
        info!(
            provider = %self.client.provider(),
            entities = entities.len(),
            relationships = relationships.len(),
            "Requesting schema suggestions"
        );
        self.client.generate(&prompt).await
    }
}

/// Prompt listing the detected schema
pub fn build_prompt(
    entities: &[String],
    relationships: &[RelationshipDescriptor],
) -> RefineResult<String> {
    Ok(format!(
        "Detected Entities: {}\nDetected Relationships: {}\nPlease suggest improvements or additions to the schema.",
        to_json(entities)?,
        to_json(relationships)?,
    ))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> RefineResult<String> {
    serde_json::to_string(value).map_err(|e| RefineError::SerializationError(e.to_string()))
}
