//! Batch jobs: each loads what it needs, runs to completion, and writes its
//! report under the configured output directory.

use crate::cache::{EmbeddingCacheManager, Ingestion};
use crate::embeddings::EmbeddingProvider;
use crate::evaluation::RetrievalEvaluator;
use crate::health::HealthAnalyzer;
use crate::quality::QualityScorer;
use crate::report::ReportWriter;
use crate::retriever::Retriever;
use crate::session::SessionLog;
use crate::similarity::{mean, round3};
use crate::store::VectorStore;
use crate::types::{HealthReport, QualityRecord, QualityScore, RetrievalEvaluation};
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ragscope_core::{AppConfig, AppError, AppResult};
use std::path::PathBuf;

pub const HEALTH_SUMMARY_FILE: &str = "vector_health_summary.csv";
pub const RECALL_SCORES_FILE: &str = "recall_scores.csv";
pub const RETRIEVAL_EVALUATION_FILE: &str = "retrieval_evaluation.csv";
pub const METRICS_DIR: &str = "metrics";

/// Embed the configured dataset into `store`, reusing the cache when valid.
pub async fn ingest(
    config: &AppConfig,
    provider: &dyn EmbeddingProvider,
    store: &mut dyn VectorStore,
) -> AppResult<Ingestion> {
    let dataset_path = config.dataset_path();
    tracing::info!("Ingesting {:?}", dataset_path);

    EmbeddingCacheManager::new(provider, store)
        .with_settings(config.cache.clone())
        .with_id_column(config.dataset.id_column.clone())
        .with_batch_size(config.embedding.batch_size)
        .load_and_embed(&dataset_path)
        .await
}

#[derive(Debug, Clone)]
pub struct HealthOutcome {
    pub report: HealthReport,
    pub summary_path: PathBuf,
    pub recall_path: PathBuf,
}

/// Ingest, sample the dataset, and write the health summary and per-query
/// recall reports.
///
/// `seed` fixes the sample; without one the sample differs per run.
pub async fn health_report(
    config: &AppConfig,
    provider: &dyn EmbeddingProvider,
    store: &mut dyn VectorStore,
    sample_size: usize,
    seed: Option<u64>,
) -> AppResult<HealthOutcome> {
    let ingestion = ingest(config, provider, store).await?;
    let texts = ingestion.dataset.texts();

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let analyzer = HealthAnalyzer::new(Retriever::new(provider, &*store))
        .with_recall_queries(config.evaluation.recall_queries.clone());
    let report = analyzer.analyze(&texts, sample_size, &mut rng).await?;

    let writer = ReportWriter::new(config.output_dir());
    let summary_path = writer.write(HEALTH_SUMMARY_FILE, &[report.summary_row()])?;
    let recall_path = writer.write(RECALL_SCORES_FILE, &report.recall_by_query)?;

    Ok(HealthOutcome {
        report,
        summary_path,
        recall_path,
    })
}

#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub evaluations: Vec<RetrievalEvaluation>,
    pub path: PathBuf,
}

/// Ingest, then score retrieval for each configured topic query.
pub async fn retrieval_evaluation(
    config: &AppConfig,
    provider: &dyn EmbeddingProvider,
    store: &mut dyn VectorStore,
    k: usize,
) -> AppResult<RetrievalOutcome> {
    let ingestion = ingest(config, provider, store).await?;
    tracing::info!(
        "{} reviews embedded from column: {}",
        ingestion.dataset.len(),
        ingestion.dataset.text_column
    );

    let evaluator = RetrievalEvaluator::new(Retriever::new(provider, &*store));
    let evaluations = evaluator
        .evaluate(&config.evaluation.retrieval_queries, k)
        .await?;

    let path = ReportWriter::new(config.output_dir()).write(RETRIEVAL_EVALUATION_FILE, &evaluations)?;

    Ok(RetrievalOutcome { evaluations, path })
}

#[derive(Debug, Clone)]
pub struct QualityOutcome {
    pub records: Vec<QualityRecord>,

    /// Log entries that could not be scored
    pub skipped: usize,

    /// Per-column mean of the scored records
    pub summary: Option<QualityScore>,

    pub path: PathBuf,
}

/// Score every logged session against freshly retrieved context and write a
/// timestamped `metrics/quality_scores_*.csv`.
///
/// Does not ingest: the store must already hold documents.
pub async fn quality_evaluation(
    config: &AppConfig,
    provider: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
    k: usize,
) -> AppResult<QualityOutcome> {
    let entries = SessionLog::new(config.session_log_path()).read_all()?;
    tracing::info!("Loaded {} logged sessions for evaluation", entries.len());

    if store.count()? == 0 {
        return Err(AppError::StoreUnavailable(
            "Vector store is empty; run `ragscope ingest` first".to_string(),
        ));
    }

    let retriever = Retriever::new(provider, store);
    let scorer = QualityScorer::new(provider);

    let mut records = Vec::with_capacity(entries.len());
    let mut skipped = 0;
    for entry in &entries {
        let scored = async {
            let context = retriever.retrieve(&entry.query, k).await?;
            scorer.score(&entry.query, &entry.response, &context).await
        }
        .await;

        match scored {
            Ok(score) => records.push(QualityRecord::new(&entry.timestamp, &entry.query, score)),
            Err(e @ AppError::StoreUnavailable(_)) => return Err(e),
            Err(e) => {
                tracing::warn!("Skipping session {:?}: {}", entry.query, e);
                skipped += 1;
            }
        }
    }

    if records.is_empty() {
        tracing::warn!(
            "No sessions could be scored ({} skipped); writing an empty report",
            skipped
        );
    }

    let file_name = format!(
        "{}/quality_scores_{}.csv",
        METRICS_DIR,
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let path = ReportWriter::new(config.output_dir()).write(&file_name, &records)?;

    Ok(QualityOutcome {
        summary: summarize(&records),
        records,
        skipped,
        path,
    })
}

/// Column means over scored records, rounded to three decimals.
pub fn summarize(records: &[QualityRecord]) -> Option<QualityScore> {
    let column = |f: fn(&QualityRecord) -> f64| {
        let values: Vec<f64> = records.iter().map(f).collect();
        mean(&values).map(round3)
    };

    Some(QualityScore {
        relevance: column(|r| r.relevance)?,
        faithfulness: column(|r| r.faithfulness)?,
        sentiment_alignment: column(|r| r.sentiment_alignment)?,
        overall_quality: column(|r| r.overall_quality)?,
    })
}
