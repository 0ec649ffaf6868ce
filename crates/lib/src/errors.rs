use thiserror::Error;

/// Error types for the question-to-SQL pipeline.
///
/// Safety rejections and plan-validation failures are not represented here:
/// they are expected outcomes and are recorded directly in the
/// [`PipelineResult`](crate::types::PipelineResult) envelope.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClientBuild(reqwest::Error),
    #[error("Completion request failed: {0}")]
    CompletionRequest(reqwest::Error),
    #[error("Failed to deserialize completion response: {0}")]
    CompletionDeserialization(reqwest::Error),
    #[error("Completion backend returned an error: {0}")]
    CompletionApi(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Embedding dimension mismatch: store holds {stored}-dimensional vectors, question embedding has {question}")]
    DimensionMismatch { stored: usize, question: usize },
    #[error("Schema retrieval failed: {0}")]
    Retrieval(String),
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),
    #[error("Storage operation failed: {0}")]
    StorageOperationFailed(String),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
