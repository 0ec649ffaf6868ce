//! # Embeddings Provider
//!
//! Generates vector embeddings by calling an external, OpenAI-compatible
//! embeddings API. The same client is used by the offline indexing step and
//! by question embedding at retrieval time, which keeps the model and
//! dimension consistent on both sides of the similarity search.

use crate::errors::PipelineError;
use crate::providers::ai::REQUEST_TIMEOUT;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Serialize, Debug)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize, Debug)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize, Debug)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// A client for an OpenAI-compatible embeddings endpoint.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: ReqwestClient,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl EmbeddingClient {
    pub fn new(
        api_url: String,
        model: String,
        api_key: Option<String>,
    ) -> Result<Self, PipelineError> {
        let client = ReqwestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(PipelineError::HttpClientBuild)?;
        Ok(Self {
            client,
            api_url,
            model,
            api_key,
        })
    }

    /// Generates a vector embedding for the given text.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, PipelineError> {
        let request_body = EmbeddingRequest {
            model: &self.model,
            input,
        };
        debug!(model = %self.model, "--> Sending request to embeddings API");

        let mut request_builder = self.client.post(&self.api_url).json(&request_body);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .send()
            .await
            .map_err(PipelineError::CompletionRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::CompletionApi(error_text));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(PipelineError::CompletionDeserialization)?;

        embedding_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                PipelineError::CompletionApi("embeddings API returned no embeddings".to_string())
            })
    }
}

impl fmt::Debug for EmbeddingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingClient")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
