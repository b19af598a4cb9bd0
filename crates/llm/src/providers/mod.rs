//! Answer generator backends.

pub mod ollama;

pub use ollama::OllamaClient;
