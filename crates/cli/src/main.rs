//! # askdb-cli: Ask a database questions in plain language
//!
//! Three subcommands cover the whole workflow: `init` seeds the bundled
//! demo database, `index` builds the schema embedding store, and `ask`
//! runs a question through the pipeline with the chosen completion
//! backend, optionally narrowing the prompt via vector retrieval.

mod config;

use anyhow::{anyhow, bail, Context, Result};
use askdb::catalog::SchemaDescriptor;
use askdb::providers::ai::embedding::EmbeddingClient;
use askdb::providers::ai::gemini::GeminiProvider;
use askdb::providers::ai::local::LocalAiProvider;
use askdb::providers::ai::ollama::OllamaProvider;
use askdb::providers::ai::CompletionProvider;
use askdb::providers::db::sqlite::SqliteExecutor;
use askdb::retriever::{index_schema, VectorRetriever};
use askdb::{PipelineResult, QueryPipelineBuilder};
use clap::{Parser, Subcommand, ValueEnum};
use config::AppConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_SEED_SQL: &str = include_str!("../data/seed.sql");
const DEMO_CATALOG_JSON: &str = include_str!("../data/schema.json");

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create and seed the demo database
    Init,
    /// Build the schema embedding store used by `ask --rag`
    Index,
    /// Answer a natural-language question with a validated, bounded query
    Ask(AskArgs),
}

#[derive(Parser, Debug)]
struct AskArgs {
    /// The question to answer
    #[arg(default_value = "Who are our top 5 customers by order count?")]
    question: String,
    /// Completion backend that generates the SQL
    #[arg(long, value_enum, default_value_t = Backend::Gemini)]
    backend: Backend,
    /// Narrow the schema context via vector retrieval instead of
    /// prompting with the full catalog (requires a built index)
    #[arg(long)]
    rag: bool,
    /// Print the full prompt sent to the backend
    #[arg(long)]
    show_prompt: bool,
    /// Override the row cap appended to unbounded queries
    #[arg(long)]
    max_rows: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Backend {
    /// Google Gemini over its REST API
    Gemini,
    /// Any OpenAI-compatible chat endpoint (vLLM, LM Studio, ...)
    Local,
    /// A local Ollama daemon
    Ollama,
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Init => init(&config).await,
        Commands::Index => index(&config).await,
        Commands::Ask(args) => ask(&config, args).await,
    }
}

async fn init(config: &AppConfig) -> Result<()> {
    if let Some(parent) = Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let executor = SqliteExecutor::new(&config.db_path).await?;
    executor.initialize_with_data(DEMO_SEED_SQL).await?;

    info!(db_path = %config.db_path, "demo database seeded");
    println!("Seeded demo database at {}", config.db_path);
    Ok(())
}

async fn index(config: &AppConfig) -> Result<()> {
    let schema = load_catalog(config)?;
    let store = SqliteExecutor::new(&config.db_path).await?;
    let embedder = embedding_client(config)?;

    let count = index_schema(&store, &embedder, &schema).await?;
    println!(
        "Indexed {count} schema entries into {} using {}",
        config.db_path, config.embeddings_model
    );
    Ok(())
}

async fn ask(config: &AppConfig, args: AskArgs) -> Result<()> {
    let provider = completion_provider(config, args.backend)?;
    let executor = SqliteExecutor::new(&config.db_path).await?;

    let mut builder = QueryPipelineBuilder::new()
        .completion_provider(provider)
        .executor(Box::new(executor.clone()))
        .max_rows(args.max_rows.unwrap_or(config.max_rows));

    builder = if args.rag {
        let retriever = VectorRetriever::new(
            Arc::new(executor),
            embedding_client(config)?,
            config.rag_top_k,
        )?;
        builder.retriever(retriever)
    } else {
        builder.full_schema(load_catalog(config)?)
    };

    let pipeline = builder.build()?;
    let result = pipeline.ask(&args.question).await;
    print_result(&result, args.show_prompt);

    match result.error {
        Some(error) => Err(anyhow!(error)),
        None => Ok(()),
    }
}

fn print_result(result: &PipelineResult, show_prompt: bool) {
    println!("Question:   {}", result.question);
    println!("Backend:    {}", result.backend);

    if let Some(tables) = &result.retrieved_tables {
        println!("Retrieved:  {}", tables.join(", "));
    }
    if show_prompt {
        if let Some(prompt) = &result.prompt {
            println!("{}", "-".repeat(60));
            println!("{prompt}");
            println!("{}", "-".repeat(60));
        }
    }
    if let Some(sql) = &result.generated_sql {
        println!("SQL:        {sql}");
    }
    println!("Validation: {}", result.validation_status);

    if let Some(rows) = &result.results {
        println!("Rows:       {}", result.result_count);
        for row in rows {
            match serde_json::to_string(row) {
                Ok(line) => println!("  {line}"),
                Err(e) => println!("  <unprintable row: {e}>"),
            }
        }
    }
    if let Some(error) = &result.error {
        println!("Error:      {error}");
    }
}

fn load_catalog(config: &AppConfig) -> Result<SchemaDescriptor> {
    match &config.schema_path {
        Some(path) => Ok(SchemaDescriptor::from_file(path)?),
        None => Ok(SchemaDescriptor::from_json(DEMO_CATALOG_JSON)?),
    }
}

fn completion_provider(
    config: &AppConfig,
    backend: Backend,
) -> Result<Box<dyn CompletionProvider>> {
    let provider: Box<dyn CompletionProvider> = match backend {
        Backend::Gemini => {
            let Some(api_key) = config.gemini_api_key.clone() else {
                bail!("GEMINI_API_KEY must be set to use the gemini backend");
            };
            Box::new(GeminiProvider::new(config.gemini_api_url.clone(), api_key)?)
        }
        Backend::Local => {
            let Some(api_url) = config.local_ai_api_url.clone() else {
                bail!("LOCAL_AI_API_URL must be set to use the local backend");
            };
            Box::new(LocalAiProvider::new(
                api_url,
                config.local_ai_api_key.clone(),
                config.local_ai_model.clone(),
            )?)
        }
        Backend::Ollama => Box::new(OllamaProvider::new(
            config.ollama_base_url.clone(),
            config.ollama_model.clone(),
        )?),
    };
    Ok(provider)
}

fn embedding_client(config: &AppConfig) -> Result<EmbeddingClient> {
    let Some(api_url) = config.embeddings_api_url.clone() else {
        bail!("EMBEDDINGS_API_URL must be set for indexing and retrieval");
    };
    Ok(EmbeddingClient::new(
        api_url,
        config.embeddings_model.clone(),
        config.embeddings_api_key.clone(),
    )?)
}
