//! # Pipeline Tests
//!
//! End-to-end tests for the question-to-result pipeline over an in-memory
//! database, with the completion backend mocked out. These cover the happy
//! path, the DDL safety gate, plan-validation failures, row bounding and
//! the error invariants of the result envelope.

mod common;

use common::{
    demo_schema, seeded_executor, setup_tracing, MockCompletionProvider, RecordingExecutor,
};

use askdb::{QueryPipelineBuilder, ValidationStatus};

const TOP_CUSTOMERS_SQL: &str = "```sql
SELECT c.customer_name, COUNT(o.order_id) AS order_count
FROM customers c
JOIN orders o ON o.customer_id = c.customer_id
WHERE o.order_date LIKE '2024%'
GROUP BY c.customer_name
ORDER BY order_count DESC, c.customer_name ASC
LIMIT 5
```";

#[tokio::test]
async fn test_top_customers_by_order_count() {
    setup_tracing();

    let provider = MockCompletionProvider::new(vec![TOP_CUSTOMERS_SQL.to_string()]);
    let pipeline = QueryPipelineBuilder::new()
        .completion_provider(Box::new(provider.clone()))
        .executor(Box::new(seeded_executor().await))
        .full_schema(demo_schema())
        .build()
        .expect("pipeline should build");

    let result = pipeline
        .ask("Show me the top 5 customers by order count in 2024")
        .await;

    assert_eq!(result.error, None, "unexpected error: {:?}", result.error);
    assert_eq!(result.validation_status, ValidationStatus::Valid);

    let rows = result.results.as_ref().expect("results must be present");
    assert_eq!(result.result_count, rows.len());
    assert!(rows.len() <= 5);

    // All 8 seeded orders are from 2024; the per-customer counts must not
    // exceed that total.
    let total: i64 = rows
        .iter()
        .map(|row| row["order_count"].as_i64().expect("count must be integer"))
        .sum();
    assert!(total <= 8, "counts sum to {total}, more than the seeded orders");

    // Acme placed 3 orders, more than anyone else.
    assert_eq!(rows[0]["customer_name"].as_str(), Some("Acme GmbH"));
    assert_eq!(rows[0]["order_count"].as_i64(), Some(3));

    // The stored SQL is the sanitized statement, not the fenced output.
    let sql = result.generated_sql.expect("generated SQL must be present");
    assert!(!sql.contains("```"));
    assert!(sql.starts_with("SELECT"));
}

#[tokio::test]
async fn test_ddl_is_rejected_before_the_executor_runs() {
    setup_tracing();

    let provider = MockCompletionProvider::new(vec!["DROP TABLE customers".to_string()]);
    let executor = RecordingExecutor::new(seeded_executor().await);
    let pipeline = QueryPipelineBuilder::new()
        .completion_provider(Box::new(provider))
        .executor(Box::new(executor.clone()))
        .full_schema(demo_schema())
        .build()
        .expect("pipeline should build");

    let result = pipeline.ask("Please remove the customers table").await;

    assert_eq!(result.error.as_deref(), Some("DDL statements are not permitted."));
    assert_eq!(result.validation_status, ValidationStatus::NotAttempted);
    assert!(result.results.is_none());
    assert_eq!(executor.explain_count(), 0, "validator must not run after a rejection");
    assert_eq!(executor.execute_count(), 0, "executor must never see DDL");

    // The envelope still reflects the stages that did run.
    assert_eq!(result.generated_sql.as_deref(), Some("DROP TABLE customers"));
    assert!(result.prompt.is_some());
}

#[tokio::test]
async fn test_invalid_statement_surfaces_a_diagnostic() {
    setup_tracing();

    let provider = MockCompletionProvider::new(vec![
        "SELECT no_such_column FROM customers".to_string(),
    ]);
    let pipeline = QueryPipelineBuilder::new()
        .completion_provider(Box::new(provider))
        .executor(Box::new(seeded_executor().await))
        .full_schema(demo_schema())
        .build()
        .expect("pipeline should build");

    let result = pipeline.ask("What is in the nonexistent column?").await;

    assert_eq!(result.validation_status, ValidationStatus::Invalid);
    assert!(result.results.is_none());
    let error = result.error.expect("a diagnostic must be recorded");
    assert!(
        error.starts_with("Validation failed:"),
        "unexpected diagnostic: {error}"
    );
    assert!(error.len() > "Validation failed:".len());
}

#[tokio::test]
async fn test_execution_is_bounded_to_max_rows() {
    setup_tracing();

    let provider = MockCompletionProvider::new(vec![
        "SELECT customer_id, customer_name FROM customers ORDER BY customer_id".to_string(),
    ]);
    let pipeline = QueryPipelineBuilder::new()
        .completion_provider(Box::new(provider))
        .executor(Box::new(seeded_executor().await))
        .full_schema(demo_schema())
        .max_rows(2)
        .build()
        .expect("pipeline should build");

    let result = pipeline.ask("List all customers").await;

    assert_eq!(result.error, None);
    let rows = result.results.expect("results must be present");
    assert_eq!(rows.len(), 2, "bounding must cap the result set");
    assert_eq!(rows[0]["customer_id"].as_i64(), Some(1));
    assert_eq!(rows[1]["customer_id"].as_i64(), Some(2));
}

#[tokio::test]
async fn test_default_bound_returns_all_small_results() {
    setup_tracing();

    let provider = MockCompletionProvider::new(vec![
        "SELECT customer_id FROM customers ORDER BY customer_id".to_string(),
    ]);
    let pipeline = QueryPipelineBuilder::new()
        .completion_provider(Box::new(provider))
        .executor(Box::new(seeded_executor().await))
        .full_schema(demo_schema())
        .build()
        .expect("pipeline should build");

    let result = pipeline.ask("List all customer ids").await;

    assert_eq!(result.error, None);
    assert_eq!(result.result_count, 5, "all 5 seeded customers fit under the default cap");
}

#[tokio::test]
async fn test_generation_failure_is_a_terminal_error() {
    setup_tracing();

    // An empty response queue behaves like an unreachable backend.
    let provider = MockCompletionProvider::new(vec![]);
    let executor = RecordingExecutor::new(seeded_executor().await);
    let pipeline = QueryPipelineBuilder::new()
        .completion_provider(Box::new(provider))
        .executor(Box::new(executor.clone()))
        .full_schema(demo_schema())
        .build()
        .expect("pipeline should build");

    let result = pipeline.ask("Anything").await;

    let error = result.error.expect("generation failure must be recorded");
    assert!(error.contains("mock: no response queued"));
    assert_eq!(result.validation_status, ValidationStatus::NotAttempted);
    assert!(result.results.is_none());
    assert!(result.generated_sql.is_none());
    assert_eq!(executor.explain_count(), 0);
    assert_eq!(executor.execute_count(), 0);
}

#[tokio::test]
async fn test_plan_validation_does_not_mutate_data() {
    setup_tracing();

    use askdb::providers::db::storage::SqlExecutor;

    let executor = seeded_executor().await;
    let query = "SELECT customer_id, customer_name FROM customers ORDER BY customer_id";

    let before = executor.execute(query).await.expect("query should run");
    executor
        .explain(query)
        .await
        .expect("plan computation should succeed");
    let after = executor.execute(query).await.expect("query should run");

    assert_eq!(before, after, "validation must leave the data untouched");
}

#[tokio::test]
async fn test_prompt_contains_full_schema_context() {
    setup_tracing();

    let provider = MockCompletionProvider::new(vec![
        "SELECT customer_id FROM customers".to_string(),
    ]);
    let pipeline = QueryPipelineBuilder::new()
        .completion_provider(Box::new(provider.clone()))
        .executor(Box::new(seeded_executor().await))
        .full_schema(demo_schema())
        .build()
        .expect("pipeline should build");

    let result = pipeline.ask("How many customers are there?").await;

    let prompt = result.prompt.expect("prompt must be retained for auditing");
    assert!(prompt.contains("Database Schema: SALES"));
    assert!(prompt.contains("Table: customers"));
    assert!(prompt.contains("Table: orders"));
    assert!(prompt.contains("  - orders -> customers (many-to-one)"));
    assert!(prompt.contains("Question: How many customers are there?"));

    // The backend saw the same context that the prompt records.
    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert!(prompt.ends_with(&calls[0].1));
}
