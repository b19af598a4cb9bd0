//! Ingest command handler.

use super::{open_pipeline, print_json};
use clap::Args;
use ragscope_core::{config::AppConfig, AppResult};
use ragscope_knowledge::{cache_path_for, jobs, VectorStore};

/// Embed the dataset into the vector store
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Delete the cache artifact, re-embed every row and refill the store
    #[arg(long)]
    pub rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let (provider, mut store) = open_pipeline(config)?;

        if self.rebuild {
            let cache_path = cache_path_for(&config.dataset_path());
            if cache_path.exists() {
                tracing::info!("Removing embedding cache {:?}", cache_path);
                std::fs::remove_file(&cache_path)?;
            }
        }

        let ingestion = jobs::ingest(config, provider.as_ref(), &mut store).await?;
        let stats = &ingestion.stats;
        let count = store.count()?;

        if self.json {
            print_json(&serde_json::json!({
                "dataset": config.dataset_path(),
                "textColumn": ingestion.dataset.text_column,
                "stats": stats,
                "storeCount": count,
            }))?;
        } else {
            println!("Dataset: {}", config.dataset_path().display());
            println!("  Text column: {}", ingestion.dataset.text_column);
            println!("  Rows: {}", stats.rows);
            if stats.cache_hit {
                println!("  Embeddings: reused from cache");
            } else {
                println!("  Embedded: {}", stats.embedded);
            }
            if !stats.skipped.is_empty() {
                println!("  Skipped: {} ({})", stats.skipped.len(), stats.skipped.join(", "));
            }
            println!("  Store documents: {}", count);
            println!("  Duration: {:.2}s", stats.duration_secs);
        }

        Ok(())
    }
}
