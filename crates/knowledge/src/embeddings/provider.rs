//! Embedding provider trait and factory.

use crate::embeddings::shape::{flatten_embedding, EmbeddingOutput};
use ragscope_core::config::EmbeddingSettings;
use ragscope_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// Ingestion and querying must use the same provider and model; vectors from
/// different models are not comparable and nothing downstream can tell.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Embed one text, returning whatever shape the model produced.
    async fn embed_raw(&self, text: &str) -> AppResult<EmbeddingOutput>;

    /// Embed one text as a flat vector of `dimensions()` components.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let vector = flatten_embedding(self.embed_raw(text).await?)?;
        check_dimensions(self.dimensions(), &vector)?;
        Ok(vector)
    }

    /// Embed several texts, preserving order.
    ///
    /// The first failure fails the whole batch. Callers wanting per-text
    /// isolation retry the batch one text at a time.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Ensure a vector has the provider's declared dimension.
pub fn check_dimensions(expected: usize, vector: &[f32]) -> AppResult<()> {
    if vector.len() != expected {
        return Err(AppError::EmbeddingShape(format!(
            "Dimension mismatch: expected {}, got {}",
            expected,
            vector.len()
        )));
    }
    Ok(())
}

/// Create an embedding provider based on configuration.
pub fn create_provider(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    if settings.dimensions == 0 {
        return Err(AppError::Config(
            "Embedding dimensions must be greater than zero".to_string(),
        ));
    }

    match settings.provider.as_str() {
        "trigram" => Ok(Arc::new(super::providers::trigram::TrigramProvider::new(
            settings.dimensions,
        ))),

        "ollama" => Ok(Arc::new(super::providers::ollama::OllamaProvider::new(
            settings,
        ))),

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
            settings.provider
        ))),
    }
}
