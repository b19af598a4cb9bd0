//! Retrieval evaluation command handler.

use super::{open_pipeline, preview, print_json, resolve_top_k};
use clap::Args;
use ragscope_core::{config::AppConfig, AppResult};
use ragscope_knowledge::jobs;

/// Score retrieval similarity for the configured topic queries
#[derive(Args, Debug)]
pub struct EvalRetrievalCommand {
    /// Results per topic (default: evaluation.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EvalRetrievalCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing eval-retrieval command");

        let (provider, mut store) = open_pipeline(config)?;
        let k = resolve_top_k(self.top_k, config)?;

        let outcome = jobs::retrieval_evaluation(config, provider.as_ref(), &mut store, k).await?;

        if self.json {
            print_json(&serde_json::to_value(&outcome.evaluations)?)?;
            return Ok(());
        }

        println!("Retrieval Evaluation Summary:");
        println!("  {:<24} {:>8} {:>8}", "query", "avg", "top");
        for eval in &outcome.evaluations {
            println!(
                "  {:<24} {:>8.3} {:>8.3}",
                eval.query, eval.avg_similarity, eval.top_similarity
            );
        }

        println!();
        println!("Example retrieved texts:");
        for eval in &outcome.evaluations {
            println!("  {}", eval.query);
            for example in &eval.examples {
                println!("    - {}", preview(example, 150));
            }
        }

        println!();
        println!("Saved metrics to {}", outcome.path.display());
        Ok(())
    }
}
