//! Similarity retrieval over the vector store.

use crate::embeddings::EmbeddingProvider;
use crate::store::VectorStore;
use crate::types::ScoredDocument;
use ragscope_core::AppResult;

/// Number of documents returned when the caller does not say.
pub const DEFAULT_TOP_K: usize = 5;

/// Embeds queries and looks up their nearest stored documents.
///
/// The provider must be the one the store was filled with.
pub struct Retriever<'a> {
    provider: &'a dyn EmbeddingProvider,
    store: &'a dyn VectorStore,
}

impl<'a> Retriever<'a> {
    pub fn new(provider: &'a dyn EmbeddingProvider, store: &'a dyn VectorStore) -> Self {
        Self { provider, store }
    }

    pub fn provider(&self) -> &'a dyn EmbeddingProvider {
        self.provider
    }

    pub fn store(&self) -> &'a dyn VectorStore {
        self.store
    }

    /// Texts of the `k` most similar documents, most similar first.
    ///
    /// An empty store yields an empty vector.
    pub async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<String>> {
        Ok(self
            .retrieve_scored(query, k)
            .await?
            .into_iter()
            .map(|d| d.text)
            .collect())
    }

    /// Like [`Retriever::retrieve`], keeping ids and similarity scores.
    pub async fn retrieve_scored(&self, query: &str, k: usize) -> AppResult<Vec<ScoredDocument>> {
        let embedding = self.provider.embed(query).await?;
        let results = self.store.query(&embedding, k)?;

        tracing::debug!("Query {:?} matched {} documents", query, results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use crate::store::InMemoryVectorStore;

    #[tokio::test]
    async fn test_retrieve_from_empty_store() {
        let provider = TrigramProvider::new(32);
        let store = InMemoryVectorStore::new();
        let retriever = Retriever::new(&provider, &store);

        assert!(retriever.retrieve("breakfast", DEFAULT_TOP_K).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_returns_at_most_store_size() {
        let provider = TrigramProvider::new(32);
        let mut store = InMemoryVectorStore::new();
        let texts = vec!["Quiet room".to_string(), "Noisy street".to_string()];
        let embeddings = provider.embed_batch(&texts).await.unwrap();
        store
            .add(&["a".to_string(), "b".to_string()], &texts, &embeddings)
            .unwrap();

        let retriever = Retriever::new(&provider, &store);
        let results = retriever.retrieve("quiet room", 5).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], "Quiet room");
    }
}
