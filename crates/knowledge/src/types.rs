//! Pipeline type definitions.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A dataset row's text and its embedding.
///
/// `id` is the dataset's identity column when present, else the row's ordinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A stored document ranked against a query embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: String,
    pub text: String,

    /// Cosine similarity to the query, in [-1, 1]
    pub score: f32,
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Rows read from the dataset
    pub rows: usize,

    /// Rows embedded in this run (0 on a cache hit)
    pub embedded: usize,

    /// Ids of rows dropped because their embedding failed
    pub skipped: Vec<String>,

    /// Whether the cache artifact was reused
    pub cache_hit: bool,

    pub duration_secs: f64,
}

/// Vector store size, or a placeholder when the store cannot report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCount {
    Available(usize),
    Unavailable,
}

impl fmt::Display for StoreCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreCount::Available(n) => write!(f, "{}", n),
            StoreCount::Unavailable => f.write_str("unavailable"),
        }
    }
}

impl Serialize for StoreCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StoreCount::Available(n) => serializer.serialize_u64(*n as u64),
            StoreCount::Unavailable => serializer.serialize_str("unavailable"),
        }
    }
}

fn or_unavailable<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_str("unavailable"),
    }
}

/// Recall proxy for one canonical query.
///
/// A hit is a retrieved text containing the query's first word; the score is
/// hits divided by the number of results requested. This is a substring
/// heuristic, not recall against labelled relevance judgements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecallScore {
    pub query: String,
    pub recall_score: f64,
}

/// Embedding health of the stored corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub timestamp: String,
    pub collection_count: StoreCount,
    pub embedding_dimension: usize,
    pub sample_size: usize,

    /// Mean cosine similarity over distinct sample pairs, `None` with fewer
    /// than two samples
    #[serde(serialize_with = "or_unavailable")]
    pub avg_pairwise_similarity: Option<f64>,

    /// Population standard deviation over the same pairs
    #[serde(serialize_with = "or_unavailable")]
    pub std_pairwise_similarity: Option<f64>,

    /// Mean of the per-query recall proxy
    pub avg_recall: f64,

    pub recall_by_query: Vec<RecallScore>,
}

/// One-line tabular form of a [`HealthReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthSummaryRow {
    pub timestamp: String,
    pub collection_count: StoreCount,
    pub embedding_dimension: usize,
    #[serde(serialize_with = "or_unavailable")]
    pub avg_similarity: Option<f64>,
    #[serde(serialize_with = "or_unavailable")]
    pub std_similarity: Option<f64>,
    pub avg_recall: f64,
}

impl HealthReport {
    pub fn summary_row(&self) -> HealthSummaryRow {
        HealthSummaryRow {
            timestamp: self.timestamp.clone(),
            collection_count: self.collection_count,
            embedding_dimension: self.embedding_dimension,
            avg_similarity: self.avg_pairwise_similarity,
            std_similarity: self.std_pairwise_similarity,
            avg_recall: self.avg_recall,
        }
    }
}

/// Similarity of a topic query to what the store returns for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalEvaluation {
    pub query: String,
    pub avg_similarity: f64,
    pub top_similarity: f64,

    /// First retrieved texts, for eyeballing
    #[serde(serialize_with = "join_examples")]
    pub examples: Vec<String>,
}

fn join_examples<S: Serializer>(examples: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&examples.join(" | "))
}

/// Answer-quality sub-scores for one `(query, response)` pair.
///
/// Every field is rounded to three decimals. `sentiment_alignment` is
/// `1 - |polarity difference|` and ranges over [-1, 1]; it is never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Mean cosine similarity between response and retrieved documents
    pub relevance: f64,

    /// Share of response words that also occur in the retrieved documents
    pub faithfulness: f64,

    pub sentiment_alignment: f64,

    /// Unweighted mean of the three sub-scores
    pub overall_quality: f64,
}

/// A scored session log entry, as written to the quality report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityRecord {
    pub timestamp: String,
    pub query: String,
    pub relevance: f64,
    pub faithfulness: f64,
    pub sentiment_alignment: f64,
    pub overall_quality: f64,
}

impl QualityRecord {
    pub fn new(timestamp: &str, query: &str, score: QualityScore) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            query: query.to_string(),
            relevance: score.relevance,
            faithfulness: score.faithfulness,
            sentiment_alignment: score.sentiment_alignment,
            overall_quality: score.overall_quality,
        }
    }
}
