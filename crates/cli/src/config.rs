//! Environment-driven configuration for the `askdb` binary.
//!
//! Everything is read once at startup; `.env` files are honored via
//! `dotenvy`. Only the settings a chosen backend actually needs have to be
//! present, so a local-only setup never has to define a remote API key.

use anyhow::{Context, Result};
use askdb::providers::db::storage::DEFAULT_MAX_ROWS;
use std::env;

const DEFAULT_DB_PATH: &str = "db/askdb.db";
const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";
const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";
const DEFAULT_EMBEDDINGS_MODEL: &str = "all-minilm";
const DEFAULT_RAG_TOP_K: usize = 5;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the SQLite database holding both the demo data and the
    /// schema embedding store.
    pub db_path: String,
    /// Path of the schema catalog JSON. When unset, the bundled demo
    /// catalog is used.
    pub schema_path: Option<String>,
    pub gemini_api_url: String,
    pub gemini_api_key: Option<String>,
    pub local_ai_api_url: Option<String>,
    pub local_ai_api_key: Option<String>,
    pub local_ai_model: Option<String>,
    pub ollama_base_url: String,
    pub ollama_model: String,
    /// OpenAI-compatible embeddings endpoint, required for `index` and
    /// `ask --rag`.
    pub embeddings_api_url: Option<String>,
    pub embeddings_model: String,
    pub embeddings_api_key: Option<String>,
    pub rag_top_k: usize,
    pub max_rows: usize,
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn parsed_or(key: &str, default: usize) -> Result<usize> {
    match optional(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} must be a positive integer, got {raw:?}")),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            db_path: optional("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            schema_path: optional("SCHEMA_PATH"),
            gemini_api_url: optional("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
            gemini_api_key: optional("GEMINI_API_KEY"),
            local_ai_api_url: optional("LOCAL_AI_API_URL"),
            local_ai_api_key: optional("LOCAL_AI_API_KEY"),
            local_ai_model: optional("LOCAL_AI_MODEL"),
            ollama_base_url: optional("OLLAMA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string()),
            ollama_model: optional("OLLAMA_MODEL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            embeddings_api_url: optional("EMBEDDINGS_API_URL"),
            embeddings_model: optional("EMBEDDINGS_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDINGS_MODEL.to_string()),
            embeddings_api_key: optional("EMBEDDINGS_API_KEY"),
            rag_top_k: parsed_or("RAG_TOP_K", DEFAULT_RAG_TOP_K)?,
            max_rows: parsed_or("MAX_RESULT_ROWS", DEFAULT_MAX_ROWS)?,
        })
    }
}
