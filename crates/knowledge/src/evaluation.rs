//! Retrieval evaluation: how close retrieved reviews are to their topic.

use crate::retriever::Retriever;
use crate::similarity::{cosine_similarity, mean, round3};
use crate::types::RetrievalEvaluation;
use ragscope_core::config::TopicQuery;
use ragscope_core::{AppError, AppResult};

/// Retrieved texts kept per topic as examples.
const EXAMPLES_PER_TOPIC: usize = 2;

pub struct RetrievalEvaluator<'a> {
    retriever: Retriever<'a>,
}

impl<'a> RetrievalEvaluator<'a> {
    pub fn new(retriever: Retriever<'a>) -> Self {
        Self { retriever }
    }

    /// Score each topic's top-`k` retrieval by embedding similarity to the
    /// topic itself.
    pub async fn evaluate(&self, queries: &[TopicQuery], k: usize) -> AppResult<Vec<RetrievalEvaluation>> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            results.push(self.evaluate_topic(&query.topic, k).await?);
        }
        Ok(results)
    }

    async fn evaluate_topic(&self, topic: &str, k: usize) -> AppResult<RetrievalEvaluation> {
        let retrieved = self.retriever.retrieve(topic, k).await?;
        if retrieved.is_empty() {
            return Err(AppError::StoreUnavailable(format!(
                "No documents retrieved for '{}'; has the dataset been ingested?",
                topic
            )));
        }

        let provider = self.retriever.provider();
        let topic_vec = provider.embed(topic).await?;
        let doc_vecs = provider.embed_batch(&retrieved).await?;

        let sims: Vec<f64> = doc_vecs
            .iter()
            .map(|v| cosine_similarity(&topic_vec, v) as f64)
            .collect();
        let avg = mean(&sims).unwrap_or_default();
        let top = sims.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        tracing::debug!("Topic {:?}: avg {:.3}, top {:.3}", topic, avg, top);

        Ok(RetrievalEvaluation {
            query: topic.to_string(),
            avg_similarity: round3(avg),
            top_similarity: round3(top),
            examples: retrieved.into_iter().take(EXAMPLES_PER_TOPIC).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use crate::embeddings::EmbeddingProvider;
    use crate::store::{InMemoryVectorStore, VectorStore};

    #[tokio::test]
    async fn test_empty_store_is_store_unavailable() {
        let provider = TrigramProvider::new(32);
        let store = InMemoryVectorStore::new();
        let evaluator = RetrievalEvaluator::new(Retriever::new(&provider, &store));

        let result = evaluator
            .evaluate(&[TopicQuery::new("room cleanliness", "dirty rooms")], 5)
            .await;
        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_evaluate_keeps_two_examples() {
        let provider = TrigramProvider::new(64);
        let mut store = InMemoryVectorStore::new();
        let texts: Vec<String> = ["Clean room", "Room was dusty", "Room smelled", "Late checkout"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let ids: Vec<String> = (0..texts.len()).map(|i| i.to_string()).collect();
        let embeddings = provider.embed_batch(&texts).await.unwrap();
        store.add(&ids, &texts, &embeddings).unwrap();

        let evaluator = RetrievalEvaluator::new(Retriever::new(&provider, &store));
        let results = evaluator
            .evaluate(&[TopicQuery::new("room", "room condition")], 3)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].examples.len(), 2);
        assert!(results[0].top_similarity >= results[0].avg_similarity);
        assert!(results[0].top_similarity <= 1.0);
    }
}
