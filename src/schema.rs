//! Descriptive schema inference
//!
//! Maps column headers onto a fixed Country-centric template. Only headers
//! are inspected; row values never influence the result.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Entity labels every inferred schema starts with
pub const SEED_ENTITIES: [&str; 5] = [
    "Country",
    "Capital/Major City",
    "Largest City",
    "Currency_Code",
    "Official Language",
];

/// Marker recorded in the property map for columns that were not promoted
pub const PROPERTY_MARKER: &str = "property";

const ROOT_ENTITY: &str = "Country";

/// A typed, directed edge template between two entity labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    #[serde(rename = "type")]
    pub rel_type: String,
    pub from: String,
    pub to: String,
}

impl RelationshipDescriptor {
    pub fn new(rel_type: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            rel_type: rel_type.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Result of [`infer_schema`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredSchema {
    pub entities: Vec<String>,
    pub relationships: Vec<RelationshipDescriptor>,
    /// Columns not promoted to entities, in header order
    pub properties: IndexMap<String, String>,
}

fn seed_relationships() -> Vec<RelationshipDescriptor> {
    vec![
        RelationshipDescriptor::new("located_at", ROOT_ENTITY, "Capital/Major City"),
        RelationshipDescriptor::new("largest_city_in", ROOT_ENTITY, "Largest City"),
        RelationshipDescriptor::new("uses_currency", ROOT_ENTITY, "Currency_Code"),
        RelationshipDescriptor::new("speaks_language", ROOT_ENTITY, "Official Language"),
    ]
}

/// Normalize a column name for use in a relationship type
///
/// Lower-cases, turns spaces into underscores and drops `:`, newlines and
/// parentheses. Other punctuation is kept as-is.
pub fn normalize_column(column: &str) -> String {
    column
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| !matches!(c, ':' | '\n' | '(' | ')'))
        .collect()
}

/// Infer entities, relationships and residual properties from column names
pub fn infer_schema<S: AsRef<str>>(columns: &[S]) -> InferredSchema {
    let mut entities: Vec<String> = SEED_ENTITIES.iter().map(|s| s.to_string()).collect();
    let mut relationships = seed_relationships();
    let mut properties = IndexMap::new();

    for column in columns.iter().map(AsRef::as_ref) {
        let is_entity = entities.iter().any(|e| e == column);
        let is_target = relationships.iter().any(|r| r.to == column);

        if !is_entity && !is_target {
            entities.push(column.to_string());
            relationships.push(RelationshipDescriptor::new(
                format!("has_{}", normalize_column(column)),
                ROOT_ENTITY,
                column,
            ));
        } else {
            properties.insert(column.to_string(), PROPERTY_MARKER.to_string());
        }
    }

    InferredSchema {
        entities,
        relationships,
        properties,
    }
}
