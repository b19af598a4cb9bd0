//! Error types for Ragscope.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! answer generation, the retrieval pipeline and serialization failures.

use thiserror::Error;

/// Unified error type for Ragscope.
///
/// All fallible functions return `Result<T, AppError>`. Pipeline failures that
/// the user can act on (missing text column, missing session log, empty store)
/// get their own variant so the CLI can report them precisely.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Answer generator (LLM provider) errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding, store and evaluation errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Dataset has no recognisable free-text column
    #[error("Schema error: {0}")]
    Schema(String),

    /// A required input artifact (e.g. the session log) does not exist
    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    /// Embedding output could not be reduced to one flat vector
    #[error("Embedding shape error: {0}")]
    EmbeddingShape(String),

    /// Vector store count or query could not be obtained
    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    /// Scoring was requested against an empty retrieved context
    #[error("Empty context: {0}")]
    EmptyContext(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            if let csv::ErrorKind::Io(io) = err.into_kind() {
                return AppError::Io(io);
            }
            return AppError::Serialization("CSV I/O failure".to_string());
        }
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
