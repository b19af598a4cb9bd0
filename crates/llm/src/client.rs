//! LLM client abstraction and request/response types.

use ragscope_core::AppResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// LLM completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The prompt text to send to the LLM
    pub prompt: String,

    /// Model identifier (e.g., "llama3.2")
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            system: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// LLM completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    #[serde(default)]
    pub usage: LlmUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LlmUsage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for LLM providers.
///
/// Calls are synchronous from the caller's point of view: one request, one
/// awaited response, no retry. A failure aborts the calling job.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}

/// A client bound to one model: `generate(prompt) -> text`.
#[derive(Clone)]
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    system: Option<String>,
}

impl AnswerGenerator {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            system: None,
        }
    }

    /// Attach a system prompt sent with every request.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Generate an answer for a fully rendered prompt.
    pub async fn generate(&self, prompt: &str) -> AppResult<String> {
        let mut request = LlmRequest::new(prompt, self.model.clone());
        if let Some(system) = &self.system {
            request = request.with_system(system.clone());
        }

        tracing::debug!(
            "Generating answer with {} ({} prompt chars)",
            self.client.provider_name(),
            prompt.len()
        );

        let response = self.client.complete(&request).await?;
        tracing::debug!(
            "Answer generated: {} completion tokens",
            response.usage.completion_tokens
        );

        Ok(response.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the last request and answers with a canned reply.
    struct CannedClient {
        reply: String,
        seen: Mutex<Option<LlmRequest>>,
    }

    #[async_trait::async_trait]
    impl LlmClient for CannedClient {
        fn provider_name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            *self.seen.lock().unwrap() = Some(request.clone());
            Ok(LlmResponse {
                content: self.reply.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(10, 5),
            })
        }
    }

    #[test]
    fn test_usage_totals() {
        let usage = LlmUsage::new(12, 30);
        assert_eq!(usage.total_tokens, 42);
    }

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::new("hi", "llama3.2")
            .with_temperature(0.2)
            .with_max_tokens(64)
            .with_system("be brief");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(64));
        assert_eq!(request.system.as_deref(), Some("be brief"));
    }

    #[tokio::test]
    async fn test_generator_trims_and_forwards_model() {
        let client = Arc::new(CannedClient {
            reply: "  Breakfast was often cold.\n".to_string(),
            seen: Mutex::new(None),
        });
        let generator =
            AnswerGenerator::new(client.clone(), "llama3.2").with_system("hotel analyst");

        let answer = generator.generate("What about breakfast?").await.unwrap();
        assert_eq!(answer, "Breakfast was often cold.");

        let seen = client.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.model, "llama3.2");
        assert_eq!(seen.prompt, "What about breakfast?");
        assert_eq!(seen.system.as_deref(), Some("hotel analyst"));
    }
}
