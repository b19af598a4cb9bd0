//! Stats command handler.
//!
//! Vector health: pairwise similarity spread of a random sample and the
//! substring recall proxy for the canonical queries.

use super::{open_pipeline, print_json};
use clap::Args;
use ragscope_core::{config::AppConfig, AppResult};
use ragscope_knowledge::jobs;

/// Report vector health
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Documents to sample (default: evaluation.sampleSize)
    #[arg(long)]
    pub sample_size: Option<usize>,

    /// Seed for a reproducible sample (default: evaluation.sampleSeed)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let (provider, mut store) = open_pipeline(config)?;
        let sample_size = self.sample_size.unwrap_or(config.evaluation.sample_size);
        let seed = self.seed.or(config.evaluation.sample_seed);

        let outcome =
            jobs::health_report(config, provider.as_ref(), &mut store, sample_size, seed).await?;
        let report = &outcome.report;

        if self.json {
            print_json(&serde_json::to_value(report)?)?;
        } else {
            println!("Summary Report:");
            println!("  timestamp: {}", report.timestamp);
            println!("  collection_count: {}", report.collection_count);
            println!("  embedding_dimension: {}", report.embedding_dimension);
            match (report.avg_pairwise_similarity, report.std_pairwise_similarity) {
                (Some(avg), Some(std)) => println!(
                    "  avg_similarity: {:.3} ± {:.3} (n={})",
                    avg, std, report.sample_size
                ),
                _ => println!(
                    "  avg_similarity: unavailable (n={}, need at least 2)",
                    report.sample_size
                ),
            }
            println!("  avg_recall: {:.3}", report.avg_recall);
            println!();
            println!("Recall proxy by query:");
            for recall in &report.recall_by_query {
                println!("  {}: {:.2}", recall.query, recall.recall_score);
            }
            println!();
            println!("Saved:");
            println!("  - {}", outcome.summary_path.display());
            println!("  - {}", outcome.recall_path.display());
        }

        Ok(())
    }
}
