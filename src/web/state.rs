use crate::config::AppConfig;
use crate::pipeline::QueryPipeline;
use crate::web::templates::init_templates;
use minijinja::Environment;

/// Shared application state for the web server. Built once in `main` and
/// never mutated; request handlers only read from it.
pub struct AppState {
    pub config: AppConfig,
    pub template_env: Environment<'static>,
    pub pipeline: QueryPipeline,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: QueryPipeline) -> Result<Self, minijinja::Error> {
        Ok(Self {
            config,
            template_env: init_templates()?,
            pipeline,
            startup_time: chrono::Utc::now(),
        })
    }

    pub fn uptime_seconds(&self) -> i64 {
        (chrono::Utc::now() - self.startup_time).num_seconds()
    }
}
