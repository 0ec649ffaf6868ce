//! # Natural Language to Bounded SQL
//!
//! This crate converts a natural-language question into a safely-bounded,
//! validated SQL query against a fixed schema, executes it, and returns
//! tabular results. One pipeline covers three deployment variants:
//! full-schema prompting against a remote chat API, full-schema prompting
//! against a self-hosted backend, and a retrieval-augmented variant that
//! narrows the schema context to the most relevant tables via vector
//! similarity before prompting.
//!
//! Stages run strictly in order: context building, SQL generation, the DDL
//! safety gate, plan validation, bounded execution. Each stage either adds
//! its output to the [`PipelineResult`] envelope or records an error and
//! stops the pipeline.

pub mod catalog;
pub mod context;
pub mod errors;
pub mod generator;
pub mod guard;
pub mod prompts;
pub mod providers;
pub mod retriever;
pub mod types;

pub use errors::PipelineError;
pub use types::{PipelineResult, QueryPipeline, QueryPipelineBuilder, ValidationStatus};

use context::{full_schema_context, retrieved_schema_context};
use guard::{is_ddl, DDL_REJECTION_MESSAGE};
use providers::db::storage::bounded_statement;
use tracing::{debug, error, info};
use types::ContextSource;

impl QueryPipeline {
    /// Runs one question through the pipeline and returns the result
    /// envelope.
    ///
    /// This never returns an error: a stage failure is stringified into
    /// `PipelineResult.error` and everything computed up to that point stays
    /// in the envelope. Each stage runs at most once; once an error is
    /// recorded, no later stage runs.
    pub async fn ask(&self, question: &str) -> PipelineResult {
        let mut result = PipelineResult::new(question, self.generator.backend());
        if let Err(e) = self.run(question, &mut result).await {
            error!("[ask] pipeline error: {e}");
            result.error = Some(e.to_string());
        }
        result
    }

    async fn run(
        &self,
        question: &str,
        result: &mut PipelineResult,
    ) -> Result<(), PipelineError> {
        info!("[ask] received question: {question:?}");

        // --- Context: full catalog, or the nearest schema entries. ---
        let schema_context = match &self.context {
            ContextSource::FullSchema(schema) => full_schema_context(schema),
            ContextSource::Retrieved(retriever) => {
                let records = retriever.retrieve(question).await?;
                result.retrieved_tables =
                    Some(records.iter().map(|r| r.table_name.clone()).collect());
                retrieved_schema_context(&records)
            }
        };

        // --- Generation. The stored SQL is always the sanitized text. ---
        let generated = self.generator.generate(&schema_context, question).await?;
        result.generated_sql = Some(generated.sql.clone());
        result.prompt = Some(generated.prompt);

        // --- Safety gate: DDL never reaches the executor. ---
        if is_ddl(&generated.sql) {
            info!("[ask] rejected DDL statement: {}", generated.sql);
            result.error = Some(DDL_REJECTION_MESSAGE.to_string());
            return Ok(());
        }

        // --- Plan validation: any executor diagnostic means invalid. A
        // malformed query does not become valid on retry, so none happens. ---
        match self.executor.explain(&generated.sql).await {
            Ok(plan) => {
                debug!("[ask] execution plan:\n{plan}");
                result.validation_status = ValidationStatus::Valid;
            }
            Err(e) => {
                result.validation_status = ValidationStatus::Invalid;
                result.error = Some(format!("Validation failed: {e}"));
                return Ok(());
            }
        }

        // --- Bounded execution. ---
        let bounded = bounded_statement(&generated.sql, self.max_rows);
        let result_set = self.executor.execute(&bounded).await?;
        info!(rows = result_set.rows.len(), "[ask] query executed");
        result.result_count = result_set.rows.len();
        result.results = Some(result_set.rows);

        Ok(())
    }
}
