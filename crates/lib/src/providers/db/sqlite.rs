//! # SQLite Executor
//!
//! The storage provider behind the pipeline, backed by Turso. One
//! `SqliteExecutor` doubles as the schema embedding store: the
//! `schema_embeddings` table lives in the same database and cosine distance
//! is computed server-side via `vector_distance_cos`.

use crate::errors::PipelineError;
use crate::providers::db::storage::{SqlExecutor, VectorStore};
use crate::types::{EmbeddingRecord, EntryMetadata, ResultSet, SqlRow};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::{self, Debug};
use tracing::{debug, info};
use turso::{params, Database, Value as TursoValue};

const EMBEDDINGS_TABLE: &str = "schema_embeddings";

/// A provider for a local SQLite database using Turso.
///
/// Holds a `Database` instance, which manages a connection pool. When
/// cloned, it shares the same underlying database. Every operation opens its
/// own connection, which is released when it drops, on success and on error
/// alike.
#[derive(Clone)]
pub struct SqliteExecutor {
    /// The Turso database instance. Cloneable and thread-safe.
    pub db: Database,
}

impl SqliteExecutor {
    /// Creates a new `SqliteExecutor` from a file path or in-memory.
    ///
    /// Use ":memory:" for a unique, isolated in-memory database. To share an
    /// in-memory database across instances (e.g. in tests), create one
    /// executor and `.clone()` it.
    pub async fn new(db_path: &str) -> Result<Self, PipelineError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| PipelineError::StorageConnection(e.to_string()))?;

        // WAL improves concurrency for file-based databases and is harmless
        // for in-memory ones.
        let conn = db
            .connect()
            .map_err(|e| PipelineError::StorageConnection(e.to_string()))?;
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| PipelineError::StorageConnection(e.to_string()))?;

        Ok(Self { db })
    }

    /// Executes multiple semicolon-separated statements, e.g. to seed a
    /// database for tests or demos.
    pub async fn initialize_with_data(&self, init_sql: &str) -> Result<(), PipelineError> {
        let conn = self.connect()?;
        for statement in init_sql.split(';').filter(|s| !s.trim().is_empty()) {
            conn.execute(statement, ())
                .await
                .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn connect(&self) -> Result<turso::Connection, PipelineError> {
        self.db
            .connect()
            .map_err(|e| PipelineError::StorageConnection(e.to_string()))
    }
}

impl Debug for SqliteExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteExecutor").finish_non_exhaustive()
    }
}

/// Converts a Turso value to a serde_json::Value.
fn turso_value_to_json(v: TursoValue) -> Value {
    match v {
        TursoValue::Null => Value::Null,
        TursoValue::Integer(i) => Value::Number(i.into()),
        TursoValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        TursoValue::Text(s) => Value::String(s),
        TursoValue::Blob(_) => Value::String("<blob>".to_string()),
    }
}

fn embedding_to_bytes(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for component in vector {
        bytes.extend_from_slice(&component.to_le_bytes());
    }
    bytes
}

fn bytes_to_embedding(raw: &[u8]) -> Vec<f32> {
    raw.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Renders a vector as a `vector('[...]')` SQL literal.
fn vector_literal(vector: &[f32]) -> String {
    let components = vector
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("vector('[{components}]')")
}

#[async_trait]
impl SqlExecutor for SqliteExecutor {
    fn name(&self) -> &str {
        "SQLite"
    }

    /// Computes the execution plan via `EXPLAIN QUERY PLAN` on a plain
    /// connection. No transaction is opened, so plan computation cannot have
    /// side effects. Any engine diagnostic propagates as the error.
    async fn explain(&self, sql: &str) -> Result<String, PipelineError> {
        debug!(sql = %sql, "--> Computing execution plan");
        let conn = self.connect()?;

        let statement = format!("EXPLAIN QUERY PLAN {sql}");
        let mut stmt = conn
            .prepare(&statement)
            .await
            .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?;
        let width = stmt.columns().len();

        let mut rows = stmt
            .query(())
            .await
            .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?;

        let mut lines = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?
        {
            let mut fields = Vec::new();
            for i in 0..width {
                let value = row
                    .get_value(i)
                    .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?;
                match value {
                    TursoValue::Text(text) => fields.push(text),
                    TursoValue::Integer(n) => fields.push(n.to_string()),
                    _ => {}
                }
            }
            lines.push(fields.join(" "));
        }

        Ok(lines.join("\n"))
    }

    /// Executes a query and materializes all rows as ordered column-to-value
    /// maps.
    async fn execute(&self, sql: &str) -> Result<ResultSet, PipelineError> {
        debug!(sql = %sql, "--> Executing SQLite query");
        let conn = self.connect()?;

        let mut stmt = conn
            .prepare(sql)
            .await
            .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?;

        let columns: Vec<String> = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut rows = stmt
            .query(())
            .await
            .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?;

        let mut materialized: Vec<SqlRow> = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?
        {
            let mut row_map = SqlRow::new();
            for (i, name) in columns.iter().enumerate() {
                let value = row
                    .get_value(i)
                    .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?;
                row_map.insert(name.clone(), turso_value_to_json(value));
            }
            materialized.push(row_map);
        }

        Ok(ResultSet {
            columns,
            rows: materialized,
        })
    }
}

#[async_trait]
impl VectorStore for SqliteExecutor {
    /// Drops and recreates the embedding table, then inserts every record.
    /// Insertion order is preserved through the rowid, which later breaks
    /// distance ties.
    async fn replace_embeddings(&self, records: &[EmbeddingRecord]) -> Result<(), PipelineError> {
        let conn = self.connect()?;

        conn.execute(&format!("DROP TABLE IF EXISTS {EMBEDDINGS_TABLE}"), ())
            .await
            .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?;
        conn.execute(
            &format!(
                "CREATE TABLE {EMBEDDINGS_TABLE} (
                    id          INTEGER PRIMARY KEY,
                    table_name  TEXT NOT NULL,
                    description TEXT NOT NULL,
                    metadata    TEXT NOT NULL,
                    embedding   BLOB NOT NULL
                )"
            ),
            (),
        )
        .await
        .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?;

        for record in records {
            let metadata = serde_json::to_string(&record.metadata)?;
            let blob = embedding_to_bytes(&record.embedding);
            conn.execute(
                &format!(
                    "INSERT INTO {EMBEDDINGS_TABLE}
                     (table_name, description, metadata, embedding)
                     VALUES (?, ?, ?, ?)"
                ),
                params![
                    record.table_name.as_str(),
                    record.description.as_str(),
                    metadata,
                    blob
                ],
            )
            .await
            .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?;
        }

        info!(count = records.len(), "Stored schema embeddings");
        Ok(())
    }

    async fn dimension(&self) -> Result<Option<usize>, PipelineError> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                &format!("SELECT length(embedding) FROM {EMBEDDINGS_TABLE} ORDER BY id LIMIT 1"),
                (),
            )
            .await
            .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?;

        match rows
            .next()
            .await
            .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?
        {
            Some(row) => match row.get_value(0) {
                Ok(TursoValue::Integer(bytes)) => Ok(Some(bytes as usize / 4)),
                _ => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Ranks stored entries by `vector_distance_cos` ascending, rowid
    /// breaking ties.
    async fn nearest(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<EmbeddingRecord>, PipelineError> {
        info!(k, "Executing schema embedding similarity search");
        let conn = self.connect()?;

        let sql = format!(
            "SELECT table_name, description, metadata, embedding,
                    vector_distance_cos(embedding, {query_vector}) AS distance
             FROM {EMBEDDINGS_TABLE}
             ORDER BY distance ASC, id ASC
             LIMIT {k}",
            query_vector = vector_literal(vector),
        );

        let mut rows = conn
            .query(&sql, ())
            .await
            .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| PipelineError::StorageOperationFailed(e.to_string()))?
        {
            let table_name = match row.get_value(0) {
                Ok(TursoValue::Text(s)) => s,
                _ => String::new(),
            };
            let description = match row.get_value(1) {
                Ok(TursoValue::Text(s)) => s,
                _ => String::new(),
            };
            let metadata_json = match row.get_value(2) {
                Ok(TursoValue::Text(s)) => s,
                _ => String::new(),
            };
            let embedding = match row.get_value(3) {
                Ok(TursoValue::Blob(raw)) => bytes_to_embedding(&raw),
                _ => Vec::new(),
            };

            let metadata: EntryMetadata = serde_json::from_str(&metadata_json)?;
            records.push(EmbeddingRecord {
                table_name,
                description,
                metadata,
                embedding,
            });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_bytes_round_trip() {
        let vector = vec![0.5f32, -1.25, 3.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&vector)), vector);
    }

    #[test]
    fn test_vector_literal_format() {
        assert_eq!(vector_literal(&[0.0, 1.5]), "vector('[0, 1.5]')");
    }
}
