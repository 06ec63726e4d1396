use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::pipeline::QueryOutcome;
use crate::web::state::AppState;

#[derive(Debug, Deserialize, Clone)]
pub struct NlQueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub name: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub llm_backend: String,
    pub llm_model: String,
    pub database_backend: String,
}

// Same flow as the form; per-request failures are in `error`, not the status code
pub async fn nl_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NlQueryRequest>,
) -> Json<QueryOutcome> {
    debug!("NL-query: {}", payload.question);
    Json(state.pipeline.run(&payload.question).await)
}

pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    Json(SystemStatus {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        llm_backend: state.config.llm.backend.clone(),
        llm_model: state.config.llm.model.clone(),
        database_backend: state.pipeline.executor().backend().to_string(),
    })
}
