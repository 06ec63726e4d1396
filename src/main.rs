use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use nl_sql::config::{AppConfig, CliArgs};
use nl_sql::db::connect_backend;
use nl_sql::llm::Translator;
use nl_sql::pipeline::QueryPipeline;
use nl_sql::util::logging::init_tracing;
use nl_sql::web::{self, state::AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = CliArgs::parse();

    // Initialize logging
    init_tracing(args.log_json);

    // A missing .env is fine; credentials may come from the real environment
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => {
            error!("Error loading .env file: {}", e);
            error!("Please ensure .env file exists and is properly formatted");
        }
    }

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!("Using {} database backend", config.database.backend);
    let executor = connect_backend(&config.database)?;

    if !executor.test_connection().await {
        error!("Please check your database configuration.");
        return Err("database liveness check failed".into());
    }

    info!("Initializing translator with backend: {}", config.llm.backend);
    let translator = Translator::new(&config.llm)?;

    let pipeline = QueryPipeline::new(translator, executor);
    let app_state = Arc::new(AppState::new(config.clone(), pipeline)?);

    info!("Starting server on {}:{}", config.web.host, config.web.port);
    match web::run_server(config.web, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
