//! Content generation backends
//!
//! A [`ContentGenerator`] turns a composed prompt into raw article text. The
//! pipeline never inspects the backend; it only retries errors the backend
//! marks as transient.

use async_trait::async_trait;

use crate::config::GeneratorConfig;
use crate::error::{BlogcastError, GenerationError, Result};

pub mod gemini;

// Available outside tests so integration tests and dry runs can script output
pub mod mock;

pub use gemini::GeminiGenerator;
pub use mock::MockGenerator;

/// A generative model that answers one prompt with one block of text
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Send `prompt` and return the model's raw text.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::EmptyResponse` when the model answered with
    /// no text; other `GenerationError` variants for transport and API
    /// failures.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Build the generator named by `config.provider`
pub fn create_generator(config: &GeneratorConfig) -> Result<Box<dyn ContentGenerator>> {
    match config.provider.trim().to_ascii_lowercase().as_str() {
        "gemini" => Ok(Box::new(GeminiGenerator::from_config(config)?)),
        other => Err(GenerationError::UnsupportedProvider(other.to_string()).into()),
    }
}

/// Retry classifier for generation calls
pub fn is_transient(error: &BlogcastError) -> bool {
    matches!(error, BlogcastError::Generation(e) if e.is_transient())
}
