use crate::errors::PipelineError;
use crate::types::{EmbeddingRecord, ResultSet};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// Default cap on the number of rows a query may return.
pub const DEFAULT_MAX_ROWS: usize = 1000;

/// A trait for the SQL executor behind the pipeline.
///
/// Implementations open their own connection per operation and release it on
/// every exit path, so concurrent pipeline invocations never share a
/// session.
#[async_trait]
pub trait SqlExecutor: Send + Sync + Debug + DynClone {
    /// The name of the executor (e.g. "SQLite").
    fn name(&self) -> &str;

    /// Computes the execution plan for a statement without materializing any
    /// rows. Returns the rendered plan text. Must not wrap the statement in
    /// a transaction or mutate stored data.
    async fn explain(&self, sql: &str) -> Result<String, PipelineError>;

    /// Executes a statement and materializes every returned row, with column
    /// names taken verbatim from the result descriptor.
    async fn execute(&self, sql: &str) -> Result<ResultSet, PipelineError>;
}

dyn_clone::clone_trait_object!(SqlExecutor);

/// A trait for the schema embedding store.
///
/// The store is written once by the offline indexing step and read-only at
/// question time; a schema change means regenerating it wholesale.
#[async_trait]
pub trait VectorStore: Send + Sync + Debug {
    /// Replaces the store contents with the given records.
    async fn replace_embeddings(&self, records: &[EmbeddingRecord]) -> Result<(), PipelineError>;

    /// Vector dimension of the stored records, or `None` when the store is
    /// empty. All records share one dimension; similarity search requires
    /// commensurable vectors.
    async fn dimension(&self) -> Result<Option<usize>, PipelineError>;

    /// The `k` records nearest to the query vector, cosine distance
    /// ascending, ties broken by insertion order. Returns every record when
    /// `k` exceeds the store size.
    async fn nearest(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<EmbeddingRecord>, PipelineError>;
}

/// Appends a `LIMIT` clause bounding the result to `max_rows` when the
/// statement does not already carry one. The check is a case-insensitive
/// substring match on the limiting keyword.
pub fn bounded_statement(sql: &str, max_rows: usize) -> String {
    if sql.to_uppercase().contains("LIMIT") {
        sql.to_string()
    } else {
        format!("{sql} LIMIT {max_rows}")
    }
}
