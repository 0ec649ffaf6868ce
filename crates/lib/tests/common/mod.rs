#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared helpers for the integration tests: a mock completion provider
//! with call history, an executor wrapper that counts calls, and the seeded
//! demo dataset.

use askdb::catalog::{ColumnDescriptor, RelationshipDescriptor, SchemaDescriptor, TableDescriptor};
use askdb::errors::PipelineError;
use askdb::providers::ai::CompletionProvider;
use askdb::providers::db::sqlite::SqliteExecutor;
use askdb::providers::db::storage::SqlExecutor;
use askdb::types::ResultSet;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
        tracing_subscriber::fmt::init();
    });
}

// --- Mock Completion Provider ---

/// A completion backend that replays queued responses and records every
/// prompt it receives. With an empty queue it fails the way an unreachable
/// backend would.
#[derive(Clone, Debug)]
pub struct MockCompletionProvider {
    pub call_history: Arc<Mutex<Vec<(String, String)>>>,
    pub responses: Arc<Mutex<Vec<String>>>,
    pub prose_prone: bool,
}

impl MockCompletionProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            call_history: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(responses.into_iter().rev().collect())),
            prose_prone: false,
        }
    }

    pub fn prose_prone(mut self) -> Self {
        self.prose_prone = true;
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.call_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PipelineError> {
        self.call_history
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| PipelineError::CompletionApi("mock: no response queued".to_string()))
    }

    fn appends_prose(&self) -> bool {
        self.prose_prone
    }
}

// --- Recording Executor ---

/// Wraps a real [`SqliteExecutor`] and counts how often each operation is
/// invoked, so tests can assert that rejected statements never reach the
/// engine.
#[derive(Clone, Debug)]
pub struct RecordingExecutor {
    inner: SqliteExecutor,
    pub explain_calls: Arc<Mutex<u32>>,
    pub execute_calls: Arc<Mutex<u32>>,
}

impl RecordingExecutor {
    pub fn new(inner: SqliteExecutor) -> Self {
        Self {
            inner,
            explain_calls: Arc::new(Mutex::new(0)),
            execute_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn explain_count(&self) -> u32 {
        *self.explain_calls.lock().unwrap()
    }

    pub fn execute_count(&self) -> u32 {
        *self.execute_calls.lock().unwrap()
    }
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn explain(&self, sql: &str) -> Result<String, PipelineError> {
        *self.explain_calls.lock().unwrap() += 1;
        self.inner.explain(sql).await
    }

    async fn execute(&self, sql: &str) -> Result<ResultSet, PipelineError> {
        *self.execute_calls.lock().unwrap() += 1;
        self.inner.execute(sql).await
    }
}

// --- Demo Dataset ---

/// The SALES demo dataset: 5 customers and 8 orders placed in 2024.
pub const DEMO_SEED: &str = "
    CREATE TABLE customers (
        customer_id   INTEGER PRIMARY KEY,
        customer_name TEXT NOT NULL,
        country       TEXT,
        created_date  TEXT
    );
    CREATE TABLE orders (
        order_id    INTEGER PRIMARY KEY,
        customer_id INTEGER NOT NULL,
        order_date  TEXT
    );
    INSERT INTO customers (customer_name, country, created_date) VALUES ('Acme GmbH', 'DE', '2023-01-15');
    INSERT INTO customers (customer_name, country, created_date) VALUES ('Globex Corp', 'US', '2023-03-22');
    INSERT INTO customers (customer_name, country, created_date) VALUES ('Initech AG', 'DE', '2023-06-10');
    INSERT INTO customers (customer_name, country, created_date) VALUES ('Umbrella Ltd', 'GB', '2024-01-05');
    INSERT INTO customers (customer_name, country, created_date) VALUES ('Stark Industries', 'US', '2024-02-14');
    INSERT INTO orders (customer_id, order_date) VALUES (1, '2024-01-10');
    INSERT INTO orders (customer_id, order_date) VALUES (2, '2024-02-15');
    INSERT INTO orders (customer_id, order_date) VALUES (1, '2024-03-20');
    INSERT INTO orders (customer_id, order_date) VALUES (3, '2024-04-05');
    INSERT INTO orders (customer_id, order_date) VALUES (4, '2024-05-12');
    INSERT INTO orders (customer_id, order_date) VALUES (5, '2024-06-18');
    INSERT INTO orders (customer_id, order_date) VALUES (2, '2024-07-22');
    INSERT INTO orders (customer_id, order_date) VALUES (1, '2024-08-30');
";

/// Creates a fresh in-memory executor seeded with the demo dataset.
pub async fn seeded_executor() -> SqliteExecutor {
    let executor = SqliteExecutor::new(":memory:")
        .await
        .expect("failed to create in-memory executor");
    executor
        .initialize_with_data(DEMO_SEED)
        .await
        .expect("failed to seed demo data");
    executor
}

/// The catalog matching [`DEMO_SEED`].
pub fn demo_schema() -> SchemaDescriptor {
    SchemaDescriptor {
        schema_name: "SALES".to_string(),
        tables: vec![
            TableDescriptor {
                name: "customers".to_string(),
                description: "Registered customers".to_string(),
                columns: vec![
                    column("customer_id", "INTEGER", "Primary key"),
                    column("customer_name", "TEXT", "Legal company name"),
                    column("country", "TEXT", "ISO country code"),
                    column("created_date", "TEXT", "Date the customer signed up"),
                ],
            },
            TableDescriptor {
                name: "orders".to_string(),
                description: "Orders placed by customers".to_string(),
                columns: vec![
                    column("order_id", "INTEGER", "Primary key"),
                    column("customer_id", "INTEGER", "Ordering customer"),
                    column("order_date", "TEXT", "Date the order was placed"),
                ],
            },
        ],
        relationships: vec![RelationshipDescriptor {
            from: "orders".to_string(),
            to: "customers".to_string(),
            r#type: "many-to-one".to_string(),
        }],
    }
}

fn column(name: &str, r#type: &str, description: &str) -> ColumnDescriptor {
    ColumnDescriptor {
        name: name.to_string(),
        r#type: r#type.to_string(),
        description: description.to_string(),
    }
}
