//! SQLite product catalogue

use crate::error::ChatbotError;
use crate::sql::{ensure_read_only, SqlExecutor, SqlRow};
use crate::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};

/// Read-only handle on the `product` table
pub struct SqliteProductStore {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl SqliteProductStore {
    /// Open the database read-only. Connections are made on first query, so
    /// a missing file surfaces as a query failure rather than at startup.
    ///
    /// `query_timeout` bounds both waiting for a connection and running a
    /// query.
    pub fn open(url: &str, query_timeout: Duration) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(query_timeout)
            .connect_lazy_with(options);

        info!("Product database configured: {}", url);
        Ok(Self::from_pool(pool, query_timeout))
    }

    pub fn from_pool(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Stream rows until `limit` is reached; the rest are never decoded
    async fn fetch_limited(&self, statement: &str, limit: usize) -> Result<Vec<SqlRow>> {
        let mut stream = sqlx::query(statement).fetch(&self.pool);
        let mut records = Vec::with_capacity(limit.min(64));

        while records.len() < limit {
            match stream.try_next().await {
                Ok(Some(row)) => records.push(row_to_json(&row)?),
                Ok(None) => break,
                Err(e) => {
                    error!("Product query failed: {}", e);
                    return Err(ChatbotError::SqlExecution(e.to_string()));
                }
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl SqlExecutor for SqliteProductStore {
    async fn execute(&self, query: &str, limit: usize) -> Result<Vec<SqlRow>> {
        let statement = ensure_read_only(query)?;

        match tokio::time::timeout(self.query_timeout, self.fetch_limited(statement, limit)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.query_timeout, "Product query timed out");
                Err(ChatbotError::SqlExecution(format!(
                    "query exceeded {:?}",
                    self.query_timeout
                )))
            }
        }
    }
}

fn row_to_json(row: &SqliteRow) -> Result<SqlRow> {
    let mut record = SqlRow::new();

    for column in row.columns() {
        let index = column.ordinal();
        let raw = row
            .try_get_raw(index)
            .map_err(|e| ChatbotError::SqlExecution(e.to_string()))?;

        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            decode_value(row, index, &type_name)?
        };

        record.insert(column.name().to_string(), value);
    }

    Ok(record)
}

fn decode_value(row: &SqliteRow, index: usize, type_name: &str) -> Result<Value> {
    let decoded = match type_name {
        "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(index).map(Value::from),
        "REAL" => row.try_get::<f64, _>(index).map(Value::from),
        "TEXT" => row.try_get::<String, _>(index).map(Value::from),
        // Blobs have no useful text form for the answer prompt
        _ => return Ok(Value::Null),
    };

    decoded.map_err(|e| ChatbotError::SqlExecution(e.to_string()))
}
