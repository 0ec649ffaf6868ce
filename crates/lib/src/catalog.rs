//! # Schema Catalog
//!
//! The static description of tables, columns and relationships that serves as
//! the source of truth for prompt context. It is loaded once per process from
//! a JSON document and is immutable afterwards.

use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The full catalog for one database schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub schema_name: String,
    pub tables: Vec<TableDescriptor>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDescriptor>,
}

/// One table with its free-text description and ordered columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub description: String,
    pub columns: Vec<ColumnDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub r#type: String,
    pub description: String,
}

/// A foreign-key style relationship between two tables. Informational only;
/// nothing in the pipeline enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    pub from: String,
    pub to: String,
    pub r#type: String,
}

impl SchemaDescriptor {
    /// Parses a catalog from its JSON representation.
    pub fn from_json(raw: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Loads a catalog from a JSON file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!(
                "failed to read schema file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&raw)
    }
}
