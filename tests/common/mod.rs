#![allow(dead_code)]

use async_trait::async_trait;
use nl_sql::config::AppConfig;
use nl_sql::db::{DbError, QueryExecutor, ResultSet, Row};
use nl_sql::llm::{LlmError, SqlGenerator, Translator};
use nl_sql::pipeline::QueryPipeline;
use nl_sql::web::{self, state::AppState};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Stands in for the text-generation service.
pub struct FakeModel {
    pub reply: Result<String, String>,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SqlGenerator for FakeModel {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(LlmError::ConnectionError)
    }
}

/// Stands in for the database; records every query it is given.
pub struct FakeDatabase {
    pub reply: Result<ResultSet, DbError>,
    pub queries: Mutex<Vec<String>>,
}

#[async_trait]
impl QueryExecutor for FakeDatabase {
    fn backend(&self) -> &'static str {
        "fake"
    }

    async fn execute(&self, sql: &str) -> Result<ResultSet, DbError> {
        self.queries.lock().unwrap().push(sql.to_string());
        self.reply.clone()
    }

    async fn test_connection(&self) -> bool {
        true
    }
}

pub struct TestApp {
    pub router: axum::Router,
    pub model_calls: Arc<AtomicUsize>,
    pub database: Arc<FakeDatabase>,
}

impl TestApp {
    pub fn new(model_reply: Result<&str, &str>, db_reply: Result<ResultSet, DbError>) -> Self {
        let model_calls = Arc::new(AtomicUsize::new(0));
        let model = FakeModel {
            reply: model_reply.map(str::to_string).map_err(str::to_string),
            calls: Arc::clone(&model_calls),
        };
        let database = Arc::new(FakeDatabase {
            reply: db_reply,
            queries: Mutex::new(Vec::new()),
        });

        let translator = Translator::with_generator(Box::new(model));
        let pipeline = QueryPipeline::new(translator, database.clone());
        let state = AppState::new(AppConfig::default(), pipeline).unwrap();

        Self {
            router: web::app(Arc::new(state)),
            model_calls,
            database,
        }
    }

    /// Same wiring, but with a real executor behind the pipeline.
    pub fn with_executor(model_reply: Result<&str, &str>, executor: Arc<dyn QueryExecutor>) -> Self {
        let model_calls = Arc::new(AtomicUsize::new(0));
        let model = FakeModel {
            reply: model_reply.map(str::to_string).map_err(str::to_string),
            calls: Arc::clone(&model_calls),
        };

        let translator = Translator::with_generator(Box::new(model));
        let pipeline = QueryPipeline::new(translator, executor);
        let state = AppState::new(AppConfig::default(), pipeline).unwrap();

        Self {
            router: web::app(Arc::new(state)),
            model_calls,
            database: Arc::new(FakeDatabase {
                reply: Ok(ResultSet::default()),
                queries: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn model_call_count(&self) -> usize {
        self.model_calls.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<String> {
        self.database.queries.lock().unwrap().clone()
    }
}

pub fn italian_restaurants() -> ResultSet {
    let rows = [
        (1, "Trattoria Roma", "Cacio e Pepe", 4.5, "Downtown"),
        (3, "Nonna's Kitchen", "Lasagna", 4.2, "Harbor"),
    ]
    .into_iter()
    .map(|(id, name, dish, rating, location)| {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(id));
        row.insert("name".to_string(), json!(name));
        row.insert("special_dish".to_string(), json!(dish));
        row.insert("rating".to_string(), json!(rating));
        row.insert("location".to_string(), json!(location));
        row.insert("cuisine".to_string(), json!("Italian"));
        row.insert("contact_number".to_string(), serde_json::Value::Null);
        row
    })
    .collect();

    ResultSet::new(
        [
            "id",
            "name",
            "special_dish",
            "rating",
            "location",
            "cuisine",
            "contact_number",
        ]
        .into_iter()
        .map(str::to_string)
        .collect(),
        rows,
    )
}
