use crate::db::{DbError, QueryExecutor, ResultSet, Row, unique_column_names};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use tracing::{error, info};

/// Embedded DuckDB backend, for local demos without a MySQL server.
pub struct DuckDbDatabase {
    path: String,
}

impl DuckDbDatabase {
    pub fn new(path: String) -> Self {
        Self { path }
    }

    pub fn connect(&self) -> Result<Connection, DbError> {
        Connection::open(&self.path).map_err(|e| DbError::ConnectionError(e.to_string()))
    }
}

#[async_trait]
impl QueryExecutor for DuckDbDatabase {
    fn backend(&self) -> &'static str {
        "duckdb"
    }

    async fn execute(&self, sql: &str) -> Result<ResultSet, DbError> {
        info!("Executing query: {}", sql);

        let path = self.path.clone();
        let sql = sql.to_string();

        // The connection lives only inside the blocking task and is closed on drop
        tokio::task::spawn_blocking(move || -> Result<ResultSet, DbError> {
            let conn = Connection::open(&path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
            fetch_all(&conn, &sql).map_err(|e| DbError::DriverError(e.to_string()))
        })
        .await
        .map_err(|e| {
            error!("Task join error: {}", e);
            DbError::Other(e.to_string())
        })?
        .inspect_err(|e| error!("DuckDB error: {}", e))
    }

    async fn test_connection(&self) -> bool {
        let path = self.path.clone();

        let outcome = tokio::task::spawn_blocking(move || -> Result<i32, duckdb::Error> {
            let conn = Connection::open(&path)?;
            conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))
        })
        .await;

        match outcome {
            Ok(Ok(_)) => {
                info!("Database connection successful!");
                true
            }
            Ok(Err(e)) => {
                error!("Database connection failed: {}", e);
                false
            }
            Err(e) => {
                error!("Database connection failed: {}", e);
                false
            }
        }
    }
}

fn fetch_all(conn: &Connection, sql: &str) -> duckdb::Result<ResultSet> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;

    // Column names are only known once the statement has run
    let columns = unique_column_names(
        rows.as_ref()
            .map(|stmt| stmt.column_names())
            .unwrap_or_default(),
    );

    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            let value: Value = row.get(i)?;
            record.insert(name.clone(), to_json(value));
        }
        records.push(record);
    }

    Ok(ResultSet::new(columns, records))
}

fn to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(v) => serde_json::Value::Bool(v),
        Value::TinyInt(v) => serde_json::Value::from(v),
        Value::SmallInt(v) => serde_json::Value::from(v),
        Value::Int(v) => serde_json::Value::from(v),
        Value::BigInt(v) => serde_json::Value::from(v),
        Value::UTinyInt(v) => serde_json::Value::from(v),
        Value::USmallInt(v) => serde_json::Value::from(v),
        Value::UInt(v) => serde_json::Value::from(v),
        Value::UBigInt(v) => serde_json::Value::from(v),
        Value::Float(v) => serde_json::Value::from(v),
        Value::Double(v) => serde_json::Value::from(v),
        Value::HugeInt(v) => serde_json::Value::String(v.to_string()),
        Value::Decimal(v) => serde_json::Value::String(v.to_string()),
        Value::Text(v) => serde_json::Value::String(v),
        Value::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.saturating_mul(1_000_000),
                TimeUnit::Millisecond => v.saturating_mul(1_000),
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            match DateTime::from_timestamp_micros(micros) {
                Some(dt) => serde_json::Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
                None => serde_json::Value::String(v.to_string()),
            }
        }
        Value::Date32(days) => {
            // Days since 1970-01-01; 719_163 is that date's day number from CE
            match NaiveDate::from_num_days_from_ce_opt(days + 719_163) {
                Some(date) => serde_json::Value::String(date.format("%Y-%m-%d").to_string()),
                None => serde_json::Value::String(days.to_string()),
            }
        }
        Value::Blob(bytes) => serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        other => serde_json::Value::String(format!("{:?}", other)),
    }
}
