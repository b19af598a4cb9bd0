//! Ollama Embedding Provider
//!
//! Semantic embeddings from a local Ollama server (`POST /api/embed`), e.g.
//! `all-minilm` (384 dimensions) or `nomic-embed-text` (768 dimensions).
//!
//! The endpoint always answers with a batch (`{"embeddings": [[..], ..]}`),
//! so single-text calls go through shape normalisation and batch calls are
//! checked row by row.

use crate::embeddings::provider::{check_dimensions, EmbeddingProvider};
use crate::embeddings::shape::{flatten_embedding, EmbeddingOutput};
use ragscope_core::config::EmbeddingSettings;
use ragscope_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBED_ENDPOINT: &str = "/api/embed";

/// Ollama embedding provider using the local HTTP API.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a, I: Serialize> {
    model: &'a str,
    input: I,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: EmbeddingOutput,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    pub fn new(settings: &EmbeddingSettings) -> Self {
        let base_url = settings
            .endpoint
            .clone()
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
        }
    }

    async fn post_embed<I: Serialize + Send>(&self, input: I) -> AppResult<EmbeddingOutput> {
        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);
        let request = EmbedRequest {
            model: &self.model,
            input,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to reach Ollama at {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(AppError::Knowledge(format!(
                "Ollama embedding error ({}): {}",
                status, message
            )));
        }

        let body: EmbedResponse = response.json().await.map_err(|e| {
            AppError::EmbeddingShape(format!("Unexpected Ollama embedding payload: {}", e))
        })?;

        Ok(body.embeddings)
    }
}

/// Split a batch response into one vector per input text.
fn split_batch(output: EmbeddingOutput, expected: usize, dimensions: usize) -> AppResult<Vec<Vec<f32>>> {
    let rows = match output {
        EmbeddingOutput::Matrix(rows) => rows,
        EmbeddingOutput::Vector(v) if expected == 1 => vec![v],
        other => {
            return Err(AppError::EmbeddingShape(format!(
                "expected {} embeddings, got shape {:?}",
                expected,
                other.shape()
            )))
        }
    };

    if rows.len() != expected {
        return Err(AppError::EmbeddingShape(format!(
            "expected {} embeddings, got {}",
            expected,
            rows.len()
        )));
    }

    rows.into_iter()
        .map(|row| {
            let vector = flatten_embedding(EmbeddingOutput::Vector(row))?;
            check_dimensions(dimensions, &vector)?;
            Ok(vector)
        })
        .collect()
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_raw(&self, text: &str) -> AppResult<EmbeddingOutput> {
        self.post_embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("Embedding batch of {} texts with {}", texts.len(), self.model);
        let output = self.post_embed(texts).await?;
        split_batch(output, texts.len(), self.dimensions)
    }
}
