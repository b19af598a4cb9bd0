//! Retrieval evaluation pipeline over customer reviews.
//!
//! Embeds a review dataset into a vector store (reusing an on-disk embedding
//! cache), retrieves similar reviews, and reports on embedding health,
//! retrieval similarity and answer quality.

pub mod cache;
pub mod dataset;
pub mod embeddings;
pub mod evaluation;
pub mod health;
pub mod jobs;
pub mod quality;
pub mod report;
pub mod retriever;
pub mod session;
pub mod similarity;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use cache::{cache_path_for, EmbeddedDataset, EmbeddingCacheManager, Ingestion};
pub use dataset::Dataset;
pub use embeddings::{create_provider, EmbeddingProvider};
pub use evaluation::RetrievalEvaluator;
pub use health::HealthAnalyzer;
pub use quality::{LexiconAnalyzer, PolarityAnalyzer, QualityScorer};
pub use report::{CsvRow, ReportWriter, WriteMode};
pub use retriever::{Retriever, DEFAULT_TOP_K};
pub use session::{SessionLog, SessionLogEntry};
pub use store::{InMemoryVectorStore, SqliteVectorStore, VectorStore};
pub use types::{
    Document, HealthReport, IngestStats, QualityRecord, QualityScore, RecallScore,
    RetrievalEvaluation, ScoredDocument, StoreCount,
};
