//! Retrieve command handler.

use super::{open_pipeline, preview, print_json, resolve_top_k};
use clap::Args;
use ragscope_core::{config::AppConfig, AppResult};
use ragscope_knowledge::Retriever;

/// Show the reviews most similar to a query
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Query text
    pub query: String,

    /// Number of results (default: evaluation.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command");

        let (provider, store) = open_pipeline(config)?;
        let k = resolve_top_k(self.top_k, config)?;

        let results = Retriever::new(provider.as_ref(), &store)
            .retrieve_scored(&self.query, k)
            .await?;

        if self.json {
            print_json(&serde_json::to_value(&results)?)?;
        } else if results.is_empty() {
            println!("No documents in the store. Run 'ragscope ingest' first.");
        } else {
            for (i, doc) in results.iter().enumerate() {
                println!("{}. [{:.3}] {}", i + 1, doc.score, preview(&doc.text, 150));
            }
        }

        Ok(())
    }
}
