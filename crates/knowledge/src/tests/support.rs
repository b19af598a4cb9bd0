//! Deterministic stand-ins for the embedding model and the vector store.

use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::{EmbeddingOutput, EmbeddingProvider};
use crate::store::{InMemoryVectorStore, VectorStore};
use crate::types::ScoredDocument;
use ragscope_core::{AppConfig, AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const REVIEWS_CSV: &str = "review_id,rating,review_text\n\
r1,5,Great breakfast\n\
r2,1,Rude staff\n\
r3,2,Breakfast was cold\n";

/// Embeds with hand-crafted vectors where given, trigram hashing otherwise.
/// Counts every text it embeds and fails on texts containing `FAIL`.
#[derive(Debug)]
pub struct StubProvider {
    fallback: TrigramProvider,
    fixed: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
    model: String,
}

impl StubProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            fallback: TrigramProvider::new(dimensions),
            fixed: HashMap::new(),
            calls: AtomicUsize::new(0),
            model: "stub-v1".to_string(),
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.fixed.insert(text.to_string(), vector);
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for StubProvider {
    fn provider_name(&self) -> &str {
        "stub"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.fallback.dimensions()
    }

    async fn embed_raw(&self, text: &str) -> AppResult<EmbeddingOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if text.contains("FAIL") {
            return Err(AppError::Knowledge(format!("cannot embed {:?}", text)));
        }

        match self.fixed.get(text) {
            // Batched shape, as some model interfaces return for one input
            Some(vector) => Ok(EmbeddingOutput::Matrix(vec![vector.clone()])),
            None => self.fallback.embed_raw(text).await,
        }
    }
}

/// A store whose count always fails; queries still work.
#[derive(Debug, Default)]
pub struct UncountableStore {
    inner: InMemoryVectorStore,
}

impl VectorStore for UncountableStore {
    fn add(
        &mut self,
        ids: &[String],
        documents: &[String],
        embeddings: &[Vec<f32>],
    ) -> AppResult<()> {
        self.inner.add(ids, documents, embeddings)
    }

    fn query(&self, embedding: &[f32], k: usize) -> AppResult<Vec<ScoredDocument>> {
        self.inner.query(embedding, k)
    }

    fn count(&self) -> AppResult<usize> {
        Err(AppError::StoreUnavailable("count not supported".to_string()))
    }

    fn ids(&self) -> AppResult<Vec<String>> {
        Err(AppError::StoreUnavailable("listing not supported".to_string()))
    }

    fn reset(&mut self) -> AppResult<()> {
        self.inner.reset()
    }
}

/// Config rooted at `workspace` with the dataset at `reviews.csv`.
pub fn workspace_config(workspace: &Path, csv: &str) -> AppConfig {
    std::fs::write(workspace.join("reviews.csv"), csv).unwrap();

    let mut config = AppConfig {
        workspace: workspace.to_path_buf(),
        ..AppConfig::default()
    };
    config.dataset.path = "reviews.csv".into();
    config.embedding.dimensions = 384;
    config
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
