//! Vector health analysis: how spread out the embeddings are and how well
//! canonical queries are served.

use crate::retriever::{Retriever, DEFAULT_TOP_K};
use crate::similarity::{mean, round3, std_dev, upper_triangle_similarities};
use crate::types::{HealthReport, RecallScore, StoreCount};
use chrono::Local;
use rand::seq::SliceRandom;
use rand::Rng;
use ragscope_core::AppResult;

/// Canonical queries for the recall proxy.
pub const DEFAULT_RECALL_QUERIES: [&str; 3] =
    ["room cleanliness", "breakfast quality", "customer service"];

pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Computes [`HealthReport`]s for an embedded corpus.
pub struct HealthAnalyzer<'a> {
    retriever: Retriever<'a>,
    recall_queries: Vec<String>,
    recall_k: usize,
}

impl<'a> HealthAnalyzer<'a> {
    pub fn new(retriever: Retriever<'a>) -> Self {
        Self {
            retriever,
            recall_queries: DEFAULT_RECALL_QUERIES.iter().map(|q| q.to_string()).collect(),
            recall_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_recall_queries(mut self, queries: Vec<String>) -> Self {
        self.recall_queries = queries;
        self
    }

    /// Sample up to `sample_size` of `texts` without replacement, embed them
    /// and summarise their pairwise similarities, then score the recall proxy.
    ///
    /// An unreadable store count is reported as [`StoreCount::Unavailable`],
    /// and a sample of fewer than two documents leaves the pairwise
    /// statistics `None`.
    pub async fn analyze<R: Rng + ?Sized>(
        &self,
        texts: &[String],
        sample_size: usize,
        rng: &mut R,
    ) -> AppResult<HealthReport> {
        let collection_count = match self.retriever.store().count() {
            Ok(n) => StoreCount::Available(n),
            Err(e) => {
                tracing::warn!("Vector store count unavailable: {}", e);
                StoreCount::Unavailable
            }
        };

        let sample: Vec<String> = texts.choose_multiple(rng, sample_size).cloned().collect();
        let vectors = if sample.is_empty() {
            Vec::new()
        } else {
            self.retriever.provider().embed_batch(&sample).await?
        };
        let embedding_dimension = vectors
            .first()
            .map(Vec::len)
            .unwrap_or_else(|| self.retriever.provider().dimensions());

        let similarities = upper_triangle_similarities(&vectors);
        let (avg, std) = if sample.len() < 2 {
            tracing::warn!(
                "Pairwise statistics unavailable: need at least 2 documents, sampled {}",
                sample.len()
            );
            (None, None)
        } else {
            (mean(&similarities), std_dev(&similarities))
        };

        tracing::debug!(
            "Sampled {} documents, {} pairs, mean similarity {:?}",
            sample.len(),
            similarities.len(),
            avg
        );

        let mut recall_by_query = Vec::with_capacity(self.recall_queries.len());
        for query in &self.recall_queries {
            let retrieved = self.retriever.retrieve(query, self.recall_k).await?;
            recall_by_query.push(RecallScore {
                query: query.clone(),
                recall_score: recall_proxy(query, &retrieved, self.recall_k),
            });
        }

        let recalls: Vec<f64> = recall_by_query.iter().map(|r| r.recall_score).collect();

        Ok(HealthReport {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            collection_count,
            embedding_dimension,
            sample_size: sample.len(),
            avg_pairwise_similarity: avg.map(round3),
            std_pairwise_similarity: std.map(round3),
            avg_recall: round3(mean(&recalls).unwrap_or_default()),
            recall_by_query,
        })
    }
}

/// Share of the `k` requested results containing the query's first word,
/// case-insensitively. Missing results count as misses.
pub fn recall_proxy(query: &str, retrieved: &[String], k: usize) -> f64 {
    let Some(first_word) = query.split_whitespace().next().map(str::to_lowercase) else {
        return 0.0;
    };
    if k == 0 {
        return 0.0;
    }

    let hits = retrieved
        .iter()
        .take(k)
        .filter(|text| text.to_lowercase().contains(&first_word))
        .count();

    hits as f64 / k as f64
}
