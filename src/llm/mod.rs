pub mod prompt;
pub mod providers;

use crate::config::LlmConfig;
use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use tracing::{debug, error, info};

#[derive(Debug)]
pub enum LlmError {
    ConnectionError(String),
    ResponseError(String),
    ConfigError(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ConnectionError(msg) => write!(f, "LLM connection error: {}", msg),
            LlmError::ResponseError(msg) => write!(f, "LLM response error: {}", msg),
            LlmError::ConfigError(msg) => write!(f, "LLM configuration error: {}", msg),
        }
    }
}

impl Error for LlmError {}

/// A failed translation. The message shown to users is fixed; the provider
/// error is kept as the source.
#[derive(Debug)]
pub struct TranslationError(pub LlmError);

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Failed to convert natural language to SQL query")
    }
}

impl Error for TranslationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

/// A text-generation backend: sends a prompt, returns the model's raw reply.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

pub struct Translator {
    generator: Box<dyn SqlGenerator + Send + Sync>,
}

impl Translator {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let generator: Box<dyn SqlGenerator + Send + Sync> = match config.backend.as_str() {
            "remote" => Box::new(providers::remote::RemoteLlmProvider::new(config)?),
            "ollama" => Box::new(providers::ollama::OllamaProvider::new(config)?),
            _ => {
                return Err(LlmError::ConfigError(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )))
            }
        };

        Ok(Self { generator })
    }

    pub fn with_generator(generator: Box<dyn SqlGenerator + Send + Sync>) -> Self {
        Self { generator }
    }

    /// Turns a question into query text. The result is whatever the model
    /// produced after [`clean_sql`]; it is not parsed or checked.
    pub async fn translate(&self, question: &str) -> Result<String, TranslationError> {
        let prompt = prompt::prepare_prompt(question);

        let raw = self.generator.complete(&prompt).await.map_err(|e| {
            error!("Error in natural language translation: {}", e);
            TranslationError(e)
        })?;
        debug!("Raw model response: {}", raw);

        let sql = clean_sql(&raw);
        info!("Generated SQL: {}", sql);
        Ok(sql)
    }
}

/// Strips formatting the model tends to add around a query.
///
/// In order: a code fence tagged `sql` wrapping the whole reply is removed,
/// the markdown escapes `\_` and `\*` become `_` and `*`, and any backslash
/// left over is dropped.
pub fn clean_sql(raw: &str) -> String {
    let mut sql = raw.trim();

    if let Some(inner) = sql
        .strip_prefix("```sql")
        .and_then(|rest| rest.strip_suffix("```"))
    {
        sql = inner.trim();
    }

    sql.replace("\\_", "_").replace("\\*", "*").replace('\\', "")
}
