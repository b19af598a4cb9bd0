//! Answer generation for Ragscope.
//!
//! The retrieval pipeline never calls a generative model itself; it scores
//! logged `(query, response)` pairs. This crate is what produces those pairs:
//! a provider-agnostic [`LlmClient`], an [`AnswerGenerator`] that binds a client
//! to a model, and the prompt template that grounds a question in retrieved
//! reviews.
//!
//! # Example
//! ```no_run
//! use ragscope_llm::{AnswerGenerator, providers::OllamaClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let generator = AnswerGenerator::new(Arc::new(OllamaClient::new()), "llama3.2");
//! let answer = generator.generate("What do guests say about breakfast?").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod prompt;
pub mod providers;

// Re-export main types
pub use client::{AnswerGenerator, LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use prompt::build_grounded_prompt;
pub use providers::OllamaClient;
