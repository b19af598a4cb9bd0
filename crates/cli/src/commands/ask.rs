//! Ask command handler.
//!
//! Answers a question from retrieved reviews and appends the exchange to the
//! session log that `eval-quality` scores.

use super::{open_pipeline, print_json, resolve_top_k};
use clap::Args;
use ragscope_core::{config::AppConfig, AppError, AppResult};
use ragscope_knowledge::{Retriever, SessionLog, SessionLogEntry};
use ragscope_llm::{build_grounded_prompt, create_client, AnswerGenerator};

/// Answer a question from retrieved reviews
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of reviews to ground the answer in (default: evaluation.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Do not append to the session log
    #[arg(long)]
    pub no_log: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let (provider, store) = open_pipeline(config)?;
        let k = resolve_top_k(self.top_k, config)?;

        let reviews = Retriever::new(provider.as_ref(), &store)
            .retrieve(&self.question, k)
            .await?;
        if reviews.is_empty() {
            return Err(AppError::StoreUnavailable(
                "No reviews to ground the answer in. Run 'ragscope ingest' first.".to_string(),
            ));
        }
        tracing::debug!("Grounding answer in {} reviews", reviews.len());

        let prompt = build_grounded_prompt(&self.question, &reviews)?;
        let client = create_client(&config.llm.provider, config.llm.endpoint.as_deref())?;
        let mut generator = AnswerGenerator::new(client, config.llm.model.clone());
        if let Some(system) = &config.llm.system_prompt {
            generator = generator.with_system(system.clone());
        }
        let answer = generator.generate(&prompt).await?;

        if !self.no_log {
            let log = SessionLog::new(config.session_log_path());
            log.append(&SessionLogEntry::now(self.question.clone(), answer.clone()))?;
            tracing::info!("Logged session to {:?}", log.path());
        }

        if self.json {
            print_json(&serde_json::json!({
                "question": self.question,
                "answer": answer,
                "reviews": reviews,
            }))?;
        } else {
            println!("{}", answer);
        }

        Ok(())
    }
}
