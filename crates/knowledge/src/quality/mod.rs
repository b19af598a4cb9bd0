//! Answer quality scoring.
//!
//! Three independent heuristics, each rounded to three decimals:
//!
//! - relevance: mean cosine similarity between the response embedding and
//!   each retrieved document's embedding
//! - faithfulness: share of the response's distinct lowercase words that
//!   also appear somewhere in the retrieved documents
//! - sentiment alignment: `1 - |response polarity - mean document polarity|`
//!
//! None of these is checked against labelled ground truth. Faithfulness is
//! lexical overlap, not entailment.

pub mod sentiment;

pub use sentiment::{LexiconAnalyzer, PolarityAnalyzer};

use crate::embeddings::EmbeddingProvider;
use crate::similarity::{cosine_similarity, mean, round3};
use crate::types::QualityScore;
use ragscope_core::{AppError, AppResult};
use std::collections::HashSet;

/// Scores `(query, response)` pairs against their retrieved context.
pub struct QualityScorer<'a> {
    provider: &'a dyn EmbeddingProvider,
    sentiment: Box<dyn PolarityAnalyzer + 'a>,
}

impl<'a> QualityScorer<'a> {
    pub fn new(provider: &'a dyn EmbeddingProvider) -> Self {
        Self {
            provider,
            sentiment: Box::new(LexiconAnalyzer::new()),
        }
    }

    pub fn with_analyzer(mut self, analyzer: impl PolarityAnalyzer + 'a) -> Self {
        self.sentiment = Box::new(analyzer);
        self
    }

    /// Score `response` to `query` against `retrieved_docs`.
    ///
    /// Fails with [`AppError::EmptyContext`] when there are no documents.
    pub async fn score(
        &self,
        query: &str,
        response: &str,
        retrieved_docs: &[String],
    ) -> AppResult<QualityScore> {
        let relevance = round3(self.relevance(response, retrieved_docs).await?);
        let faithfulness = round3(faithfulness(response, retrieved_docs));
        let sentiment_alignment = round3(self.sentiment_alignment(response, retrieved_docs)?);
        let overall_quality = round3((relevance + faithfulness + sentiment_alignment) / 3.0);

        tracing::debug!(
            "Scored {:?}: relevance {}, faithfulness {}, sentiment {}",
            query,
            relevance,
            faithfulness,
            sentiment_alignment
        );

        Ok(QualityScore {
            relevance,
            faithfulness,
            sentiment_alignment,
            overall_quality,
        })
    }

    /// Mean cosine similarity between the response and each document, in [-1, 1].
    pub async fn relevance(&self, response: &str, retrieved_docs: &[String]) -> AppResult<f64> {
        require_context(retrieved_docs)?;

        let response_vec = self.provider.embed(response).await?;
        let doc_vecs = self.provider.embed_batch(retrieved_docs).await?;
        let sims: Vec<f64> = doc_vecs
            .iter()
            .map(|v| cosine_similarity(&response_vec, v) as f64)
            .collect();

        mean(&sims).ok_or_else(|| AppError::EmptyContext("no document embeddings".to_string()))
    }

    /// `1 - |response polarity - mean document polarity|`, unclamped.
    pub fn sentiment_alignment(&self, response: &str, retrieved_docs: &[String]) -> AppResult<f64> {
        require_context(retrieved_docs)?;

        let response_polarity = self.sentiment.polarity(response);
        let context: Vec<f64> = retrieved_docs
            .iter()
            .map(|d| self.sentiment.polarity(d))
            .collect();
        let context_polarity = mean(&context).unwrap_or_default();

        Ok(1.0 - (response_polarity - context_polarity).abs())
    }
}

/// `|response words ∩ context words| / max(1, |response words|)`.
///
/// Words are whitespace-delimited and lowercased; punctuation stays attached.
pub fn faithfulness(response: &str, retrieved_docs: &[String]) -> f64 {
    let response_words: HashSet<String> = words(response);
    let context_words: HashSet<String> = words(&retrieved_docs.join(" "));

    let overlap = response_words.intersection(&context_words).count();
    overlap as f64 / response_words.len().max(1) as f64
}

fn words(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

fn require_context(retrieved_docs: &[String]) -> AppResult<()> {
    if retrieved_docs.is_empty() {
        return Err(AppError::EmptyContext(
            "cannot score a response without retrieved documents".to_string(),
        ));
    }
    Ok(())
}
