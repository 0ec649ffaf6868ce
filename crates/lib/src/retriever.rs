//! # Embedding-Based Schema Retrieval
//!
//! Instead of sending the entire catalog to the completion backend, the
//! retriever embeds the question and selects the most relevant schema
//! entries via server-side cosine distance. This keeps prompts small on
//! schemas with many tables.
//!
//! The store is populated by [`index_schema`], an offline step run whenever
//! the catalog changes. There is no incremental update: the store is
//! regenerated wholesale.

use crate::catalog::{SchemaDescriptor, TableDescriptor};
use crate::errors::PipelineError;
use crate::providers::ai::embedding::EmbeddingClient;
use crate::providers::db::storage::VectorStore;
use crate::types::{EmbeddingRecord, EntryMetadata, RELATIONSHIPS_ENTRY};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Retrieves the schema entries nearest to a question's embedding.
///
/// The question is embedded with the same model the store was built with;
/// a dimension mismatch between the two is a configuration error and is
/// reported before any similarity query runs.
pub struct VectorRetriever {
    store: Arc<dyn VectorStore>,
    embedder: EmbeddingClient,
    top_k: usize,
}

impl VectorRetriever {
    /// Creates a retriever over an existing embedding store.
    ///
    /// `top_k` must be positive; a retriever that can never return anything
    /// is a configuration error, not an empty result.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: EmbeddingClient,
        top_k: usize,
    ) -> Result<Self, PipelineError> {
        if top_k == 0 {
            return Err(PipelineError::Configuration(
                "retrieval top_k must be a positive integer".to_string(),
            ));
        }
        Ok(Self {
            store,
            embedder,
            top_k,
        })
    }

    /// Embeds the question and returns the `min(top_k, store size)` nearest
    /// entries, cosine distance ascending.
    ///
    /// Read-only: no store mutation, no fallback to the full schema. A
    /// caller that wants full-schema fallback on failure makes that choice
    /// itself.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<EmbeddingRecord>, PipelineError> {
        let question_vector = self.embedder.embed(question).await?;

        match self.store.dimension().await? {
            None => {
                return Err(PipelineError::Retrieval(
                    "schema embedding store is empty; run the indexing step first".to_string(),
                ))
            }
            Some(stored) if stored != question_vector.len() => {
                return Err(PipelineError::DimensionMismatch {
                    stored,
                    question: question_vector.len(),
                })
            }
            Some(_) => {}
        }

        let records = self.store.nearest(&question_vector, self.top_k).await?;
        info!(
            count = records.len(),
            "Retrieved schema entries via vector search"
        );
        Ok(records)
    }
}

impl fmt::Debug for VectorRetriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorRetriever")
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

/// Builds the rich text description embedded for one table.
fn table_entry_text(table: &TableDescriptor) -> String {
    let columns = table
        .columns
        .iter()
        .map(|c| format!("{} ({}): {}", c.name, c.r#type, c.description))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Table {}: {}. Columns: {}",
        table.name, table.description, columns
    )
}

/// Embeds every catalog entry and replaces the store contents: one record
/// per table plus, when the catalog declares relationships, one
/// [`RELATIONSHIPS_ENTRY`] record covering all of them.
///
/// Returns the number of records stored.
pub async fn index_schema(
    store: &dyn VectorStore,
    embedder: &EmbeddingClient,
    schema: &SchemaDescriptor,
) -> Result<usize, PipelineError> {
    let mut records = Vec::with_capacity(schema.tables.len() + 1);

    for table in &schema.tables {
        let description = table_entry_text(table);
        let embedding = embedder.embed(&description).await?;
        records.push(EmbeddingRecord {
            table_name: table.name.clone(),
            description,
            metadata: EntryMetadata::Table(table.clone()),
            embedding,
        });
    }

    if !schema.relationships.is_empty() {
        let rendered = schema
            .relationships
            .iter()
            .map(|r| format!("{} -> {} ({})", r.from, r.to, r.r#type))
            .collect::<Vec<_>>()
            .join("; ");
        let description = format!("Foreign key relationships: {rendered}");
        let embedding = embedder.embed(&description).await?;
        records.push(EmbeddingRecord {
            table_name: RELATIONSHIPS_ENTRY.to_string(),
            description,
            metadata: EntryMetadata::Relationships(schema.relationships.clone()),
            embedding,
        });
    }

    // Mixed dimensions would make every later similarity search meaningless,
    // so refuse to store them.
    if let Some(first) = records.first() {
        let dimension = first.embedding.len();
        if records.iter().any(|r| r.embedding.len() != dimension) {
            return Err(PipelineError::Configuration(
                "embedding model returned vectors of differing dimensions".to_string(),
            ));
        }
    }

    store.replace_embeddings(&records).await?;
    info!(count = records.len(), "Schema embedding index rebuilt");
    Ok(records.len())
}
