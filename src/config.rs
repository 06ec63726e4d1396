use clap::Parser;
use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Environment variables read on top of the config file, and the keys they set.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("DB_HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("DB_USER", "database.user"),
    ("DB_PASSWORD", "database.password"),
    ("DB_DATABASE", "database.database"),
    ("GROQ_API_KEY", "llm.api_key"),
];

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub backend: String, // "mysql" or "duckdb"
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    /// DuckDB database file, only read by the duckdb backend
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub backend: String, // "remote" or "ollama"
    pub model: String,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub temperature: f32,
    pub timeout_secs: Option<u64>,
}

impl LlmConfig {
    /// The API key, treating a blank value the same as a missing one.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub llm: LlmConfig,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        Self::load(args, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from defaults, an optional TOML file, the
    /// environment (looked up through `env`) and finally the command line.
    pub fn load<F>(args: &CliArgs, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config_builder = Config::builder()
            .set_default("database.backend", "mysql")?
            .set_default("web.host", "127.0.0.1")?
            .set_default("web.port", 5000_i64)?
            .set_default("llm.backend", "remote")?
            .set_default("llm.model", DEFAULT_MODEL)?
            .set_default("llm.temperature", 0.5_f64)?;

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            let default_locations = [
                "nl-sql.toml",
                "config/nl-sql.toml",
                "/etc/nl-sql/nl-sql.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    debug!("Using configuration file {}", location);
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        // Empty values count as unset
        for (var, key) in ENV_OVERRIDES {
            let value = env(*var).filter(|v| !v.is_empty());
            config_builder = config_builder.set_override_option(*key, value)?;
        }

        // Command line wins over everything else
        config_builder = config_builder
            .set_override_option("web.host", args.host.clone())?
            .set_override_option("web.port", args.port.map(i64::from))?;

        let config: AppConfig = config_builder.build()?.try_deserialize()?;
        config.warn_missing_credentials();

        Ok(config)
    }

    fn warn_missing_credentials(&self) {
        if self.llm.backend == "remote" && self.llm.api_key().is_none() {
            warn!("GROQ_API_KEY not found in environment; translation requests will fail");
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                backend: "mysql".to_string(),
                host: None,
                port: None,
                user: None,
                password: None,
                database: None,
                path: None,
            },
            web: WebConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            llm: LlmConfig {
                backend: "remote".to_string(),
                model: DEFAULT_MODEL.to_string(),
                api_key: None,
                api_url: None,
                temperature: 0.5,
                timeout_secs: None,
            },
        }
    }
}
