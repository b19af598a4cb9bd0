//! Vector store abstraction.
//!
//! The store holds `(id, text, embedding)` triples and answers nearest-neighbour
//! queries by cosine similarity. Re-adding an id replaces the stored entry;
//! entries with different ids are never merged, even if their text is equal.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::similarity::cosine_similarity;
use crate::types::ScoredDocument;
use ragscope_core::{AppError, AppResult};
use std::cmp::Ordering;

/// Trait for vector store backends.
pub trait VectorStore: Send {
    /// Insert or replace documents. The three slices are parallel.
    fn add(&mut self, ids: &[String], documents: &[String], embeddings: &[Vec<f32>])
        -> AppResult<()>;

    /// The `k` documents most similar to `embedding`, most similar first.
    ///
    /// Returns fewer than `k` when the store holds fewer documents and an
    /// empty vector when it is empty.
    fn query(&self, embedding: &[f32], k: usize) -> AppResult<Vec<ScoredDocument>>;

    /// Number of stored documents.
    fn count(&self) -> AppResult<usize>;

    /// Ids of every stored document, in no particular order.
    fn ids(&self) -> AppResult<Vec<String>>;

    /// Remove every document.
    fn reset(&mut self) -> AppResult<()>;
}

/// Reject `add` calls whose slices disagree in length.
pub(crate) fn check_parallel(
    ids: &[String],
    documents: &[String],
    embeddings: &[Vec<f32>],
) -> AppResult<()> {
    if ids.len() != documents.len() || ids.len() != embeddings.len() {
        return Err(AppError::Knowledge(format!(
            "add() needs parallel slices, got {} ids, {} documents, {} embeddings",
            ids.len(),
            documents.len(),
            embeddings.len()
        )));
    }
    Ok(())
}

/// Score one stored document against the query.
///
/// A dimension mismatch means the store was filled by a different embedding
/// model than the one used for the query.
pub(crate) fn score_document(
    query: &[f32],
    id: &str,
    text: &str,
    embedding: &[f32],
) -> AppResult<ScoredDocument> {
    if embedding.len() != query.len() {
        return Err(AppError::Knowledge(format!(
            "Embedding dimension mismatch: query has {}, document '{}' has {}. \
             Was the store built with a different embedding model?",
            query.len(),
            id,
            embedding.len()
        )));
    }

    Ok(ScoredDocument {
        id: id.to_string(),
        text: text.to_string(),
        score: cosine_similarity(query, embedding),
    })
}

/// Sort by descending score (ties by id) and keep the first `k`.
pub(crate) fn top_k(mut scored: Vec<ScoredDocument>, k: usize) -> Vec<ScoredDocument> {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    scored.truncate(k);
    scored
}
