use crate::errors::PipelineError;
use crate::providers::ai::{CompletionProvider, MAX_COMPLETION_TOKENS, REQUEST_TIMEOUT};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

// --- Ollama request and response structures ---

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize, Debug)]
struct OllamaResponse {
    response: String,
}

// --- Ollama Provider implementation ---

/// A provider for a local Ollama instance via its raw completion API
/// (`/api/generate`).
///
/// Raw-completion models frequently keep writing after the statement, so
/// this backend opts in to blank-line truncation during sanitization.
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: ReqwestClient,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Creates a new `OllamaProvider` for the given base URL (without the
    /// `/api/generate` suffix) and model name.
    pub fn new(base_url: String, model: String) -> Result<Self, PipelineError> {
        let client = ReqwestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(PipelineError::HttpClientBuild)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PipelineError> {
        // The generate endpoint takes one flat prompt; fold the system
        // instruction in ahead of the user prompt.
        let request_body = OllamaRequest {
            model: &self.model,
            prompt: format!("{system_prompt}\n\n{user_prompt}"),
            stream: false,
            options: OllamaOptions {
                temperature: 0.0,
                num_predict: MAX_COMPLETION_TOKENS,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(PipelineError::CompletionRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::CompletionApi(error_text));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(PipelineError::CompletionDeserialization)?;

        Ok(ollama_response.response)
    }

    fn appends_prose(&self) -> bool {
        true
    }
}
