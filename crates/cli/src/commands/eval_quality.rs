//! Quality evaluation command handler.

use super::{open_pipeline, print_json, resolve_top_k};
use clap::Args;
use ragscope_core::{config::AppConfig, AppResult};
use ragscope_knowledge::jobs;

/// Score logged answers against retrieved reviews
#[derive(Args, Debug)]
pub struct EvalQualityCommand {
    /// Reviews retrieved per logged query (default: evaluation.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EvalQualityCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing eval-quality command");

        let (provider, store) = open_pipeline(config)?;
        let k = resolve_top_k(self.top_k, config)?;

        let outcome = jobs::quality_evaluation(config, provider.as_ref(), &store, k).await?;

        if self.json {
            print_json(&serde_json::json!({
                "records": outcome.records,
                "skipped": outcome.skipped,
                "mean": outcome.summary,
                "path": outcome.path,
            }))?;
            return Ok(());
        }

        println!("Quality Evaluation Complete: {} scored", outcome.records.len());
        if outcome.skipped > 0 {
            println!("  ({} sessions could not be scored, see log)", outcome.skipped);
        }
        if let Some(mean) = outcome.summary {
            println!("  relevance:           {:.3}", mean.relevance);
            println!("  faithfulness:        {:.3}", mean.faithfulness);
            println!("  sentiment_alignment: {:.3}", mean.sentiment_alignment);
            println!("  overall_quality:     {:.3}", mean.overall_quality);
        }
        println!();
        println!("Saved metrics to {}", outcome.path.display());

        Ok(())
    }
}
