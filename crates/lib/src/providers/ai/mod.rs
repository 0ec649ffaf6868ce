pub mod embedding;
pub mod gemini;
pub mod local;
pub mod ollama;

use crate::errors::PipelineError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;
use std::time::Duration;

/// Upper bound on any single completion or embedding request. A slow backend
/// surfaces as a descriptive request error, never as an indefinite hang.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Output-token ceiling requested for SQL generation.
pub(crate) const MAX_COMPLETION_TOKENS: u32 = 500;

/// A trait for interacting with a completion backend.
///
/// This defines a common interface for generating SQL from natural language
/// across remote chat APIs and self-hosted completion APIs. All
/// implementations request deterministic decoding (temperature 0) and a
/// fixed output-token ceiling.
#[async_trait]
pub trait CompletionProvider: Send + Sync + Debug + DynClone {
    /// A short identifier for the backend, recorded in the pipeline result.
    fn name(&self) -> &str;

    /// Sends the system instruction and user prompt, returns the raw model
    /// text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PipelineError>;

    /// Whether this backend tends to append prose after the statement.
    /// The generator truncates such output at the first blank line.
    fn appends_prose(&self) -> bool {
        false
    }
}

dyn_clone::clone_trait_object!(CompletionProvider);
