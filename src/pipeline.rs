//! The per-request flow: question in, query text and rows (or a message) out.

use crate::db::{QueryExecutor, ResultSet};
use crate::llm::Translator;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

pub const EMPTY_QUESTION: &str = "Please enter a query";
pub const EMPTY_SQL: &str = "Failed to generate SQL query";
pub const NO_RESULTS: &str = "No results found for your query";

/// Everything the result page shows. `error` also carries the soft messages
/// for an empty question or an empty result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub question: String,
    pub sql: String,
    pub results: ResultSet,
    pub error: Option<String>,
}

impl QueryOutcome {
    fn failed(mut self, message: impl Into<String>) -> Self {
        self.results = ResultSet::default();
        self.error = Some(message.into());
        self
    }
}

/// Translator feeding executor. Model output goes to the database unchecked;
/// a validation step would sit between the two calls in [`QueryPipeline::run`].
pub struct QueryPipeline {
    translator: Translator,
    executor: Arc<dyn QueryExecutor>,
}

impl QueryPipeline {
    pub fn new(translator: Translator, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            translator,
            executor,
        }
    }

    pub fn executor(&self) -> &dyn QueryExecutor {
        self.executor.as_ref()
    }

    /// Never fails: every error ends up as the outcome's message.
    pub async fn run(&self, question: &str) -> QueryOutcome {
        let outcome = QueryOutcome {
            question: question.trim().to_string(),
            ..QueryOutcome::default()
        };

        if outcome.question.is_empty() {
            return outcome.failed(EMPTY_QUESTION);
        }

        let sql = match self.translator.translate(&outcome.question).await {
            Ok(sql) => sql,
            Err(e) => return outcome.failed(e.to_string()),
        };

        if sql.is_empty() {
            return outcome.failed(EMPTY_SQL);
        }

        let outcome = QueryOutcome { sql, ..outcome };

        match self.executor.execute(&outcome.sql).await {
            Ok(results) if results.is_empty() => {
                debug!("Query returned no rows");
                QueryOutcome {
                    results,
                    error: Some(NO_RESULTS.to_string()),
                    ..outcome
                }
            }
            Ok(results) => QueryOutcome { results, ..outcome },
            Err(e) => {
                warn!("Query execution failed: {}", e);
                outcome.failed(e.to_string())
            }
        }
    }
}
