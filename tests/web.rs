mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use common::{italian_restaurants, TestApp};
use nl_sql::db::duckdb_db::DuckDbDatabase;
use nl_sql::db::{DbError, ResultSet};
use std::sync::Arc;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

const ITALIAN_SQL: &str = "SELECT * FROM restaurants WHERE cuisine = 'Italian';";

fn form_post(question: &str) -> Request<Body> {
    let body = serde_urlencoded::to_string([("natural_query", question)]).unwrap();
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn get_renders_empty_form() {
    let app = TestApp::new(Ok(ITALIAN_SQL), Ok(italian_restaurants()));

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"name="natural_query""#));
    assert!(!html.contains("Generated SQL"));
    assert!(!html.contains(r#"role="alert""#));
    assert_eq!(app.model_call_count(), 0);
}

#[tokio::test]
async fn blank_question_asks_for_input() {
    let app = TestApp::new(Ok(ITALIAN_SQL), Ok(italian_restaurants()));

    let response = app.router.clone().oneshot(form_post("   ")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Please enter a query"));
    assert_eq!(app.model_call_count(), 0);
    assert!(app.executed().is_empty());
}

#[tokio::test]
async fn italian_restaurants_are_rendered() {
    let app = TestApp::new(
        Ok("```sql\nSELECT * FROM restaurants WHERE cuisine = 'Italian';\n```"),
        Ok(italian_restaurants()),
    );

    let response = app
        .router
        .clone()
        .oneshot(form_post("show me all Italian restaurants"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;

    assert!(html.contains("show me all Italian restaurants"));
    assert!(html.contains("SELECT * FROM restaurants WHERE cuisine = "));
    assert!(html.contains("<th>special_dish</th>"));
    assert!(html.contains("<td>Trattoria Roma</td>"));
    assert!(html.contains("<td>Lasagna</td>"));
    assert!(html.contains("<td>NULL</td>"));
    assert!(!html.contains(r#"role="alert""#));

    assert_eq!(app.executed(), vec![ITALIAN_SQL.to_string()]);
}

#[tokio::test]
async fn empty_result_is_informational() {
    let app = TestApp::new(Ok(ITALIAN_SQL), Ok(ResultSet::default()));

    let response = app
        .router
        .clone()
        .oneshot(form_post("italian places on the moon"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("No results found for your query"));
    assert!(!html.contains("<table>"));
}

#[tokio::test]
async fn database_error_is_shown_not_raised() {
    let app = TestApp::new(
        Ok("SELEC * FROM restaurants"),
        Err(DbError::DriverError(
            "1064 (42000): You have an error in your SQL syntax".to_string(),
        )),
    );

    let response = app
        .router
        .clone()
        .oneshot(form_post("everything"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Database error: 1064 (42000): You have an error in your SQL syntax"));
    assert!(html.contains("SELEC * FROM restaurants"));
}

#[tokio::test]
async fn translation_error_is_shown_not_raised() {
    let app = TestApp::new(Err("503 Service Unavailable"), Ok(italian_restaurants()));

    let response = app
        .router
        .clone()
        .oneshot(form_post("everything"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Failed to convert natural language to SQL query"));
    assert!(app.executed().is_empty());
}

#[tokio::test]
async fn json_api_returns_outcome() {
    let app = TestApp::new(Ok(ITALIAN_SQL), Ok(italian_restaurants()));

    let request = Request::post("/api/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"question": "show me all Italian restaurants"}).to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();

    assert_eq!(body["question"], json!("show me all Italian restaurants"));
    assert_eq!(body["sql"], json!(ITALIAN_SQL));
    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["results"]["columns"][0], json!("id"));
    assert_eq!(body["results"]["rows"][0]["name"], json!("Trattoria Roma"));
    assert_eq!(body["results"]["rows"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn status_reports_backends() {
    let app = TestApp::new(Ok(ITALIAN_SQL), Ok(italian_restaurants()));

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["name"], json!("nl-sql"));
    assert_eq!(body["llm_backend"], json!("remote"));
    assert_eq!(body["llm_model"], json!("llama-3.1-8b-instant"));
    assert_eq!(body["database_backend"], json!("fake"));
}

#[tokio::test]
async fn stylesheet_is_served() {
    let app = TestApp::new(Ok(ITALIAN_SQL), Ok(italian_restaurants()));

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/static/style.css").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
}

#[tokio::test]
async fn repeated_column_names_stay_aligned() {
    let path = std::env::temp_dir().join(format!("nl-sql-web-join-{}.duckdb", std::process::id()));
    let _ = std::fs::remove_file(&path);
    {
        let conn = duckdb::Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE restaurants (id INTEGER, name VARCHAR, cuisine VARCHAR, location VARCHAR);
            INSERT INTO restaurants VALUES
                (1, 'Trattoria Roma', 'Italian', 'Downtown'),
                (3, 'Osteria Blu', 'Italian', 'Harbor');
            "#,
        )
        .unwrap();
    }

    let sql = "SELECT a.name, b.name, a.location FROM restaurants a \
               JOIN restaurants b ON a.cuisine = b.cuisine AND a.id < b.id";
    let executor = Arc::new(DuckDbDatabase::new(path.to_string_lossy().into_owned()));
    let app = TestApp::with_executor(Ok(sql), executor);

    let response = app
        .router
        .clone()
        .oneshot(form_post("pairs of Italian restaurants"))
        .await
        .unwrap();
    let html = body_text(response).await;
    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(path.with_extension("duckdb.wal"));

    let headers: Vec<&str> = html
        .split("<th>")
        .skip(1)
        .filter_map(|cell| cell.split("</th>").next())
        .map(str::trim)
        .collect();
    let cells: Vec<&str> = html
        .split("<td>")
        .skip(1)
        .filter_map(|cell| cell.split("</td>").next())
        .map(str::trim)
        .collect();

    assert_eq!(headers, vec!["name", "name_2", "location"]);
    assert_eq!(cells, vec!["Trattoria Roma", "Osteria Blu", "Downtown"]);
}
