use axum::{
    extract::{Form, State},
    response::Html,
};
use minijinja::context;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::pipeline::QueryOutcome;
use crate::web::state::AppState;
use crate::web::templates::render_template;

#[derive(Debug, Deserialize)]
pub struct QueryForm {
    pub natural_query: String,
}

// Empty form
pub async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    render_page(&state, &QueryOutcome::default())
}

// Form submission: run the pipeline and show whatever it produced
pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<QueryForm>,
) -> Html<String> {
    info!("Natural language query submitted: {}", form.natural_query.trim());
    let outcome = state.pipeline.run(&form.natural_query).await;
    render_page(&state, &outcome)
}

fn render_page(state: &AppState, outcome: &QueryOutcome) -> Html<String> {
    // Cells are looked up by header so each one lands under its own column
    let columns = &outcome.results.columns;
    let null = serde_json::Value::Null;
    let rows: Vec<Vec<&serde_json::Value>> = outcome
        .results
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(column).unwrap_or(&null))
                .collect()
        })
        .collect();

    let ctx = context! {
        natural_query => &outcome.question,
        sql_query => &outcome.sql,
        columns => columns,
        rows => rows,
        error => &outcome.error,
    };

    Html(render_template(&state.template_env, "index.html", ctx))
}
