use crate::catalog::{RelationshipDescriptor, SchemaDescriptor, TableDescriptor};
use crate::errors::PipelineError;
use crate::generator::SqlGenerator;
use crate::providers::ai::CompletionProvider;
use crate::providers::db::storage::{SqlExecutor, DEFAULT_MAX_ROWS};
use crate::retriever::VectorRetriever;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single result row: column name to value, in result-descriptor order.
///
/// `serde_json` is built with `preserve_order`, so the map keeps the column
/// order reported by the executor.
pub type SqlRow = serde_json::Map<String, Value>;

/// Columns and materialized rows returned by the executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<SqlRow>,
}

/// Sentinel name under which the relationship entry is stored in the
/// embedding store, alongside the per-table entries.
pub const RELATIONSHIPS_ENTRY: &str = "_RELATIONSHIPS";

/// One entry in the schema embedding store: a table (or the relationship
/// list), its embedded description text and the vector produced by the
/// offline indexing step.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub table_name: String,
    pub description: String,
    pub metadata: EntryMetadata,
    pub embedding: Vec<f32>,
}

/// The full metadata serialized alongside each embedding. A table entry
/// serializes to a JSON object, the relationship entry to a JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryMetadata {
    Table(TableDescriptor),
    Relationships(Vec<RelationshipDescriptor>),
}

/// Outcome of the plan-validation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// The statement never reached the validator (e.g. it was rejected as DDL).
    #[default]
    NotAttempted,
    Valid,
    Invalid,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationStatus::NotAttempted => "not_attempted",
            ValidationStatus::Valid => "valid",
            ValidationStatus::Invalid => "invalid",
        };
        write!(f, "{s}")
    }
}

/// The result envelope for one pipeline invocation.
///
/// Each stage adds to it and nothing is ever rolled back: when a stage
/// records an error, everything computed up to that point is still present.
/// `generated_sql` always holds the post-sanitization statement that was fed
/// to the validator and executor, never the raw model output.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub question: String,
    /// Identifier of the completion backend that produced the statement.
    pub backend: String,
    /// Table names selected by vector retrieval. Absent in full-schema mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieved_tables: Option<Vec<String>>,
    /// The exact prompt text sent to the backend.
    pub prompt: Option<String>,
    pub generated_sql: Option<String>,
    pub validation_status: ValidationStatus,
    pub results: Option<Vec<SqlRow>>,
    pub result_count: usize,
    pub error: Option<String>,
}

impl PipelineResult {
    pub(crate) fn new(question: &str, backend: &str) -> Self {
        Self {
            question: question.to_string(),
            backend: backend.to_string(),
            retrieved_tables: None,
            prompt: None,
            generated_sql: None,
            validation_status: ValidationStatus::default(),
            results: None,
            result_count: 0,
            error: None,
        }
    }
}

/// Where the schema context for the prompt comes from.
pub enum ContextSource {
    /// Render the entire catalog into the prompt.
    FullSchema(SchemaDescriptor),
    /// Narrow the context to the nearest schema entries via vector search.
    Retrieved(VectorRetriever),
}

impl fmt::Debug for ContextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextSource::FullSchema(schema) => f
                .debug_tuple("FullSchema")
                .field(&schema.schema_name)
                .finish(),
            ContextSource::Retrieved(retriever) => {
                f.debug_tuple("Retrieved").field(retriever).finish()
            }
        }
    }
}

/// One question-to-result pipeline: context building, SQL generation, the
/// DDL gate, plan validation and bounded execution.
///
/// All collaborators are injected at construction via
/// [`QueryPipelineBuilder`], which keeps the pipeline testable with fake
/// backends. A pipeline is built once per process and reused across
/// invocations; each invocation opens its own executor connections.
pub struct QueryPipeline {
    pub(crate) generator: SqlGenerator,
    pub(crate) executor: Box<dyn SqlExecutor>,
    pub(crate) context: ContextSource,
    pub(crate) max_rows: usize,
}

impl fmt::Debug for QueryPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryPipeline")
            .field("backend", &self.generator.backend())
            .field("context", &self.context)
            .field("max_rows", &self.max_rows)
            .finish_non_exhaustive()
    }
}

/// A builder for [`QueryPipeline`] instances.
#[derive(Default)]
pub struct QueryPipelineBuilder {
    completion: Option<Box<dyn CompletionProvider>>,
    executor: Option<Box<dyn SqlExecutor>>,
    context: Option<ContextSource>,
    max_rows: Option<usize>,
}

impl QueryPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the completion backend used for SQL generation.
    pub fn completion_provider(mut self, provider: Box<dyn CompletionProvider>) -> Self {
        self.completion = Some(provider);
        self
    }

    /// Sets the SQL executor used for plan validation and execution.
    pub fn executor(mut self, executor: Box<dyn SqlExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Prompts with the full catalog rendered as schema context.
    pub fn full_schema(mut self, schema: SchemaDescriptor) -> Self {
        self.context = Some(ContextSource::FullSchema(schema));
        self
    }

    /// Prompts with a retrieved subset of the catalog instead of the full
    /// schema.
    pub fn retriever(mut self, retriever: VectorRetriever) -> Self {
        self.context = Some(ContextSource::Retrieved(retriever));
        self
    }

    /// Caps the number of rows a query may return. Defaults to
    /// [`DEFAULT_MAX_ROWS`].
    pub fn max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Builds the pipeline, failing when a required collaborator is missing.
    pub fn build(self) -> Result<QueryPipeline, PipelineError> {
        let provider = self.completion.ok_or_else(|| {
            PipelineError::Configuration("a completion provider is required".to_string())
        })?;
        let executor = self.executor.ok_or_else(|| {
            PipelineError::Configuration("a SQL executor is required".to_string())
        })?;
        let context = self.context.ok_or_else(|| {
            PipelineError::Configuration(
                "a context source (full schema or retriever) is required".to_string(),
            )
        })?;

        Ok(QueryPipeline {
            generator: SqlGenerator::new(provider),
            executor,
            context,
            max_rows: self.max_rows.unwrap_or(DEFAULT_MAX_ROWS),
        })
    }
}
