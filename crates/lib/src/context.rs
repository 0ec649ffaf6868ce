//! # Schema Context Rendering
//!
//! Renders either the full catalog or a retrieved subset of it into the text
//! block the completion backend sees. Rendering is deterministic: identical
//! input always yields byte-identical output, so prompts are reproducible.
//! There is deliberately no truncation here; callers that want a smaller
//! prompt bound the retrieval `k` upstream.

use crate::catalog::{RelationshipDescriptor, SchemaDescriptor, TableDescriptor};
use crate::types::{EmbeddingRecord, EntryMetadata};

/// Renders the entire catalog into one schema context string.
pub fn full_schema_context(schema: &SchemaDescriptor) -> String {
    let mut parts = vec![format!("Database Schema: {}\n", schema.schema_name)];

    for table in &schema.tables {
        push_table(&mut parts, table);
    }

    if !schema.relationships.is_empty() {
        push_relationships(&mut parts, &schema.relationships);
    }

    parts.join("\n")
}

/// Renders an ordered sequence of retrieved entries into one schema context
/// string. Entries appear in retrieval order.
pub fn retrieved_schema_context(records: &[EmbeddingRecord]) -> String {
    let mut parts =
        vec!["Database Schema (relevant tables retrieved via vector search):\n".to_string()];

    for record in records {
        match &record.metadata {
            EntryMetadata::Table(table) => push_table(&mut parts, table),
            EntryMetadata::Relationships(relationships) => {
                push_relationships(&mut parts, relationships)
            }
        }
    }

    parts.join("\n")
}

fn push_table(parts: &mut Vec<String>, table: &TableDescriptor) {
    parts.push(format!("\nTable: {}", table.name));
    parts.push(format!("Description: {}", table.description));
    parts.push("Columns:".to_string());
    for column in &table.columns {
        parts.push(format!(
            "  - {} ({}): {}",
            column.name, column.r#type, column.description
        ));
    }
}

fn push_relationships(parts: &mut Vec<String>, relationships: &[RelationshipDescriptor]) {
    parts.push("\nRelationships:".to_string());
    for relationship in relationships {
        parts.push(format!(
            "  - {} -> {} ({})",
            relationship.from, relationship.to, relationship.r#type
        ));
    }
}
