//! In-process vector store.

use super::{check_parallel, score_document, top_k, VectorStore};
use crate::types::{Document, ScoredDocument};
use ragscope_core::AppResult;
use std::collections::HashMap;

/// Vector store kept in memory, for tests and one-off runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVectorStore {
    documents: Vec<Document>,
    positions: HashMap<String, usize>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored documents in insertion order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

impl VectorStore for InMemoryVectorStore {
    fn add(
        &mut self,
        ids: &[String],
        documents: &[String],
        embeddings: &[Vec<f32>],
    ) -> AppResult<()> {
        check_parallel(ids, documents, embeddings)?;

        for ((id, text), embedding) in ids.iter().zip(documents).zip(embeddings) {
            let document = Document {
                id: id.clone(),
                text: text.clone(),
                embedding: embedding.clone(),
            };
            match self.positions.get(id) {
                Some(&pos) => self.documents[pos] = document,
                None => {
                    self.positions.insert(id.clone(), self.documents.len());
                    self.documents.push(document);
                }
            }
        }

        Ok(())
    }

    fn query(&self, embedding: &[f32], k: usize) -> AppResult<Vec<ScoredDocument>> {
        let scored = self
            .documents
            .iter()
            .map(|d| score_document(embedding, &d.id, &d.text, &d.embedding))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(top_k(scored, k))
    }

    fn count(&self) -> AppResult<usize> {
        Ok(self.documents.len())
    }

    fn ids(&self) -> AppResult<Vec<String>> {
        Ok(self.documents.iter().map(|d| d.id.clone()).collect())
    }

    fn reset(&mut self) -> AppResult<()> {
        self.documents.clear();
        self.positions.clear();
        Ok(())
    }
}
