//! Embedding generation.
//!
//! Providers turn text into vectors; [`shape`] reduces whatever a provider
//! returns to one flat vector per text.

pub mod provider;
pub mod providers;
pub mod shape;

pub use provider::{create_provider, EmbeddingProvider};
pub use shape::{flatten_embedding, EmbeddingOutput};
