//! # SQL Generation
//!
//! Turns a schema context and a question into a single SQL statement by
//! prompting the configured completion backend, then sanitizing its raw
//! output. No parsing or validation of the statement happens here; that is
//! the job of the safety gate and the plan validator downstream.

use crate::errors::PipelineError;
use crate::prompts::SQL_SYSTEM_PROMPT;
use crate::providers::ai::CompletionProvider;
use regex::Regex;
use tracing::debug;

/// The sanitized statement together with the exact prompt that produced it,
/// retained for auditability.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSql {
    pub sql: String,
    pub prompt: String,
}

/// Generates SQL from natural language via a pluggable completion backend.
pub struct SqlGenerator {
    provider: Box<dyn CompletionProvider>,
}

impl SqlGenerator {
    pub fn new(provider: Box<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Identifier of the underlying backend, recorded in pipeline results.
    pub fn backend(&self) -> &str {
        self.provider.name()
    }

    /// Prompts the backend and returns the sanitized statement.
    ///
    /// The returned prompt is the full text sent to the backend: system
    /// instruction, schema context and question, each separated by a blank
    /// line.
    pub async fn generate(
        &self,
        schema_context: &str,
        question: &str,
    ) -> Result<GeneratedSql, PipelineError> {
        let user_prompt = format!("{schema_context}\n\nQuestion: {question}\n\nSQL:");
        let full_prompt = format!("{SQL_SYSTEM_PROMPT}\n\n{user_prompt}");

        debug!(backend = %self.provider.name(), "--> Sending prompt to completion backend");
        let raw = self
            .provider
            .complete(SQL_SYSTEM_PROMPT, &user_prompt)
            .await?;
        debug!("<-- Raw completion: {raw}");

        let sql = sanitize_sql(&raw, self.provider.appends_prose())?;
        Ok(GeneratedSql {
            sql,
            prompt: full_prompt,
        })
    }
}

impl std::fmt::Debug for SqlGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlGenerator")
            .field("backend", &self.provider.name())
            .finish_non_exhaustive()
    }
}

/// Sanitizes raw model output into a single bare statement.
///
/// In order: extract the body of a markdown code fence (or strip stray fence
/// markers), trim whitespace, strip a trailing statement terminator, and for
/// backends prone to appending prose, truncate at the first blank-line
/// boundary.
pub fn sanitize_sql(raw: &str, truncate_at_blank_line: bool) -> Result<String, PipelineError> {
    let fence = Regex::new(r"```(?:sql)?\n?([\s\S]*?)```")?;
    let mut sql = fence
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| raw.replace("```sql", "").replace("```", ""));

    sql = sql.trim().trim_end_matches(';').trim().to_string();

    if truncate_at_blank_line {
        if let Some((statement, _)) = sql.split_once("\n\n") {
            sql = statement.to_string();
        }
    }

    Ok(sql.trim().trim_end_matches(';').trim().to_string())
}
