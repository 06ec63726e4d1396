pub mod duckdb_db;
pub mod mysql_db;

use crate::config::DatabaseConfig;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// One result row, keyed by column name in select-list order.
pub type Row = IndexMap<String, serde_json::Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Renames repeated column labels so every row key stays distinct: a second
/// `name` becomes `name_2`, a third `name_3`, skipping labels already taken.
pub fn unique_column_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(names.len());
    let mut unique = Vec::with_capacity(names.len());

    for name in names {
        let mut candidate = name.clone();
        let mut n = 2;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", name, n);
            n += 1;
        }
        seen.insert(candidate.clone());
        unique.push(candidate);
    }

    unique
}

#[derive(Debug, Clone, PartialEq)]
pub enum DbError {
    ConnectionError(String),
    DriverError(String),
    ConfigError(String),
    Other(String),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::ConnectionError(msg) => write!(f, "Database error: {}", msg),
            DbError::DriverError(msg) => write!(f, "Database error: {}", msg),
            DbError::ConfigError(msg) => write!(f, "Database configuration error: {}", msg),
            DbError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl Error for DbError {}

/// Runs query text against the relational store.
///
/// Implementations open a fresh connection for every call and close it before
/// returning, whether or not the query succeeded. The text is executed exactly
/// as given: nothing here checks that it is read-only.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Short backend name, shown on the status endpoint.
    fn backend(&self) -> &'static str;

    async fn execute(&self, sql: &str) -> Result<ResultSet, DbError>;

    /// Opens a connection, runs `SELECT 1` and closes it again.
    async fn test_connection(&self) -> bool;
}

pub fn connect_backend(config: &DatabaseConfig) -> Result<Arc<dyn QueryExecutor>, DbError> {
    let executor: Arc<dyn QueryExecutor> = match config.backend.as_str() {
        "mysql" => Arc::new(mysql_db::MySqlDatabase::new(config)),
        "duckdb" => {
            let path = config.path.clone().ok_or_else(|| {
                DbError::ConfigError("database.path is required for the duckdb backend".to_string())
            })?;
            Arc::new(duckdb_db::DuckDbDatabase::new(path))
        }
        _ => {
            return Err(DbError::ConfigError(format!(
                "Unsupported database backend: {}",
                config.backend
            )))
        }
    };

    Ok(executor)
}
