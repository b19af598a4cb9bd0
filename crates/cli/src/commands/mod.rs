//! Command handlers for the Ragscope CLI.

pub mod ask;
pub mod eval_quality;
pub mod eval_retrieval;
pub mod ingest;
pub mod retrieve;
pub mod stats;

pub use ask::AskCommand;
pub use eval_quality::EvalQualityCommand;
pub use eval_retrieval::EvalRetrievalCommand;
pub use ingest::IngestCommand;
pub use retrieve::RetrieveCommand;
pub use stats::StatsCommand;

use ragscope_core::{config::AppConfig, AppError, AppResult};
use ragscope_knowledge::{create_provider, EmbeddingProvider, SqliteVectorStore};
use std::sync::Arc;

/// Embedding provider and vector store for the configured workspace.
///
/// Every command uses the same pair so query and document embeddings agree.
pub(crate) fn open_pipeline(
    config: &AppConfig,
) -> AppResult<(Arc<dyn EmbeddingProvider>, SqliteVectorStore)> {
    let provider = create_provider(&config.embedding)?;
    let store = SqliteVectorStore::open(&config.store_path())?;
    Ok((provider, store))
}

/// Result count from `-k`, falling back to `evaluation.topK`. Zero is rejected.
pub(crate) fn resolve_top_k(flag: Option<usize>, config: &AppConfig) -> AppResult<usize> {
    match flag.unwrap_or(config.evaluation.top_k) {
        0 => Err(AppError::Config("-k must be at least 1".to_string())),
        k => Ok(k),
    }
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json(value: &serde_json::Value) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Shorten text for one-line display.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_top_k() {
        let config = AppConfig::default();
        assert_eq!(resolve_top_k(None, &config).unwrap(), config.evaluation.top_k);
        assert_eq!(resolve_top_k(Some(3), &config).unwrap(), 3);
        assert!(matches!(resolve_top_k(Some(0), &config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_preview_truncates_long_text() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
    }
}
