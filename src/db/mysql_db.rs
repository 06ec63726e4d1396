use crate::config::DatabaseConfig;
use crate::db::{DbError, QueryExecutor, ResultSet, Row, unique_column_names};
use async_trait::async_trait;
use mysql_async::consts::ColumnType;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, OptsBuilder, Value};
use tracing::{error, info, warn};

/// MySQL backend. Holds connection options only; every operation dials a new
/// connection and disconnects when it is done.
pub struct MySqlDatabase {
    opts: Opts,
}

impl MySqlDatabase {
    pub fn new(config: &DatabaseConfig) -> Self {
        let mut builder = OptsBuilder::default()
            .user(config.user.clone())
            .pass(config.password.clone())
            .db_name(config.database.clone());

        if let Some(host) = &config.host {
            builder = builder.ip_or_hostname(host.clone());
        }
        if let Some(port) = config.port {
            builder = builder.tcp_port(port);
        }

        Self {
            opts: builder.into(),
        }
    }

    pub async fn connect(&self) -> Result<Conn, DbError> {
        Conn::new(self.opts.clone())
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))
    }
}

#[async_trait]
impl QueryExecutor for MySqlDatabase {
    fn backend(&self) -> &'static str {
        "mysql"
    }

    async fn execute(&self, sql: &str) -> Result<ResultSet, DbError> {
        let mut conn = self.connect().await.inspect_err(|e| {
            error!("MySQL connection failed: {}", e);
        })?;

        info!("Executing query: {}", sql);
        let result = fetch_all(&mut conn, sql).await;

        if let Err(e) = conn.disconnect().await {
            warn!("Failed to close MySQL connection: {}", e);
        }

        result.map_err(|e| {
            error!("MySQL error: {}", e);
            DbError::DriverError(e.to_string())
        })
    }

    async fn test_connection(&self) -> bool {
        let mut conn = match self.connect().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Database connection failed: {}", e);
                return false;
            }
        };

        let outcome = conn.query_drop("SELECT 1").await;
        if let Err(e) = conn.disconnect().await {
            warn!("Failed to close MySQL connection: {}", e);
        }

        match outcome {
            Ok(()) => {
                info!("Database connection successful!");
                true
            }
            Err(e) => {
                error!("Database connection failed: {}", e);
                false
            }
        }
    }
}

/// Runs `sql` over the text protocol and collects the first result set.
async fn fetch_all(conn: &mut Conn, sql: &str) -> Result<ResultSet, mysql_async::Error> {
    let mut result = conn.query_iter(sql).await?;

    let (names, types): (Vec<String>, Vec<ColumnType>) = result
        .columns_ref()
        .iter()
        .map(|column| (column.name_str().into_owned(), column.column_type()))
        .unzip();
    let columns: Vec<(String, ColumnType)> =
        unique_column_names(names).into_iter().zip(types).collect();

    let raw_rows: Vec<mysql_async::Row> = result.collect().await?;
    result.drop_result().await?;

    let rows = raw_rows
        .iter()
        .map(|raw| {
            columns
                .iter()
                .enumerate()
                .map(|(i, (name, column_type))| {
                    let value = raw
                        .as_ref(i)
                        .map(|value| to_json(value, *column_type))
                        .unwrap_or(serde_json::Value::Null);
                    (name.clone(), value)
                })
                .collect::<Row>()
        })
        .collect();

    Ok(ResultSet::new(
        columns.into_iter().map(|(name, _)| name).collect(),
        rows,
    ))
}

fn to_json(value: &Value, column_type: ColumnType) -> serde_json::Value {
    match value {
        Value::NULL => serde_json::Value::Null,
        Value::Bytes(bytes) => text_to_json(&String::from_utf8_lossy(bytes), column_type),
        Value::Int(v) => serde_json::Value::from(*v),
        Value::UInt(v) => serde_json::Value::from(*v),
        Value::Float(v) => serde_json::Value::from(*v),
        Value::Double(v) => serde_json::Value::from(*v),
        // Only the binary protocol yields these; render them as MySQL prints them
        temporal => serde_json::Value::String(temporal.as_sql(true).trim_matches('\'').to_string()),
    }
}

/// The text protocol sends every value as bytes; numeric columns are turned
/// back into JSON numbers. DECIMAL stays text so no precision is lost.
fn text_to_json(text: &str, column_type: ColumnType) -> serde_json::Value {
    match column_type {
        ColumnType::MYSQL_TYPE_TINY
        | ColumnType::MYSQL_TYPE_SHORT
        | ColumnType::MYSQL_TYPE_INT24
        | ColumnType::MYSQL_TYPE_LONG
        | ColumnType::MYSQL_TYPE_LONGLONG
        | ColumnType::MYSQL_TYPE_YEAR => {
            if let Ok(v) = text.parse::<i64>() {
                return serde_json::Value::from(v);
            }
            if let Ok(v) = text.parse::<u64>() {
                return serde_json::Value::from(v);
            }
        }
        ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
            if let Ok(v) = text.parse::<f64>() {
                return serde_json::Value::from(v);
            }
        }
        _ => {}
    }
    serde_json::Value::String(text.to_string())
}
