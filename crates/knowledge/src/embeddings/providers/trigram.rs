//! Trigram embedding provider: content-aware hashed embeddings, no model needed.

use crate::embeddings::provider::EmbeddingProvider;
use crate::embeddings::shape::EmbeddingOutput;
use ragscope_core::{AppError, AppResult};
use std::collections::HashMap;

/// Words too common in reviews to discriminate between them.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "we", "our", "very", "there", "been",
];

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic, offline embedding provider.
///
/// Each token contributes its character trigrams and the whole word to hashed
/// buckets; the result is scaled to unit length. Texts sharing words or word
/// fragments end up close together. There is no notion of synonyms.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> AppResult<Vec<f32>> {
        if self.dimensions == 0 {
            return Err(AppError::EmbeddingShape(
                "trigram provider configured with zero dimensions".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimensions];

        let mut word_freq: HashMap<String, u32> = HashMap::new();
        for word in tokenize(text) {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let bucket = self.bucket(b't', &trigram);
                embedding[bucket] += (*freq as f32).sqrt();
            }

            let bucket = self.bucket(b'w', word);
            embedding[bucket] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        Ok(embedding)
    }

    /// FNV-1a over a one-byte namespace and the feature text.
    fn bucket(&self, namespace: u8, feature: &str) -> usize {
        let hash = std::iter::once(namespace)
            .chain(feature.bytes())
            .fold(FNV_OFFSET, |acc, b| (acc ^ b as u64).wrapping_mul(FNV_PRIME));
        (hash % self.dimensions as u64) as usize
    }
}

/// Lowercased alphanumeric words longer than two characters, minus stop words.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_raw(&self, text: &str) -> AppResult<EmbeddingOutput> {
        self.embed_text(text).map(EmbeddingOutput::Vector)
    }
}
