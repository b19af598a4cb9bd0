//! End-to-end tests: dataset to store to reports.

use super::support::{strings, workspace_config, StubProvider, UncountableStore, REVIEWS_CSV};
use crate::cache::{cache_path_for, EmbeddingCacheManager};
use crate::embeddings::providers::TrigramProvider;
use crate::health::HealthAnalyzer;
use crate::jobs;
use crate::retriever::Retriever;
use crate::session::{SessionLog, SessionLogEntry};
use crate::store::{InMemoryVectorStore, SqliteVectorStore, VectorStore};
use crate::types::StoreCount;
use ragscope_core::config::{CacheSettings, RowErrorPolicy};
use ragscope_core::AppError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

#[tokio::test]
async fn test_breakfast_query_returns_only_breakfast_reviews() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);
    let provider = TrigramProvider::new(384);
    let mut store = SqliteVectorStore::open(&config.store_path()).unwrap();

    jobs::ingest(&config, &provider, &mut store).await.unwrap();

    let mut results = Retriever::new(&provider, &store)
        .retrieve("breakfast", 2)
        .await
        .unwrap();
    results.sort();
    assert_eq!(results, vec!["Breakfast was cold", "Great breakfast"]);
}

#[tokio::test]
async fn test_second_ingest_reuses_cache() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);
    let provider = StubProvider::new(64);
    let mut store = InMemoryVectorStore::new();

    let first = jobs::ingest(&config, &provider, &mut store).await.unwrap();
    let calls_after_first = provider.calls();
    let second = jobs::ingest(&config, &provider, &mut store).await.unwrap();

    assert!(!first.stats.cache_hit);
    assert_eq!(first.stats.embedded, 3);
    assert!(second.stats.cache_hit);
    assert_eq!(second.stats.embedded, 0);
    assert_eq!(provider.calls(), calls_after_first);
    assert_eq!(first.dataset.rows, second.dataset.rows);
    assert_eq!(store.count().unwrap(), 3);
}

#[tokio::test]
async fn test_changed_dataset_rebuilds_cache() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);
    let provider = StubProvider::new(64);
    let mut store = InMemoryVectorStore::new();

    jobs::ingest(&config, &provider, &mut store).await.unwrap();
    std::fs::write(
        config.dataset_path(),
        format!("{}r4,4,Lovely pool\n", REVIEWS_CSV),
    )
    .unwrap();

    let rebuilt = jobs::ingest(&config, &provider, &mut store).await.unwrap();
    assert!(!rebuilt.stats.cache_hit);
    assert_eq!(rebuilt.dataset.len(), 4);
    assert_eq!(store.count().unwrap(), 4);
}

#[tokio::test]
async fn test_changed_model_rebuilds_cache() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);
    let mut store = InMemoryVectorStore::new();

    jobs::ingest(&config, &StubProvider::new(64), &mut store)
        .await
        .unwrap();
    let rebuilt = jobs::ingest(&config, &StubProvider::new(64).with_model("stub-v2"), &mut store)
        .await
        .unwrap();

    assert!(!rebuilt.stats.cache_hit);
    assert_eq!(rebuilt.dataset.model, "stub-v2");
}

#[tokio::test]
async fn test_unvalidated_cache_is_reused_even_when_stale() {
    let temp = TempDir::new().unwrap();
    let mut config = workspace_config(temp.path(), REVIEWS_CSV);
    config.cache.validate = false;
    let provider = StubProvider::new(64);
    let mut store = InMemoryVectorStore::new();

    jobs::ingest(&config, &provider, &mut store).await.unwrap();
    std::fs::write(config.dataset_path(), format!("{}r4,4,Lovely pool\n", REVIEWS_CSV)).unwrap();

    let reused = jobs::ingest(&config, &provider, &mut store).await.unwrap();
    assert!(reused.stats.cache_hit);
    assert_eq!(reused.dataset.len(), 3);
}

#[tokio::test]
async fn test_cache_hit_refills_empty_store() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);
    let provider = StubProvider::new(64);

    jobs::ingest(&config, &provider, &mut InMemoryVectorStore::new())
        .await
        .unwrap();
    let calls = provider.calls();

    let mut fresh = InMemoryVectorStore::new();
    let reused = jobs::ingest(&config, &provider, &mut fresh).await.unwrap();

    assert!(reused.stats.cache_hit);
    assert_eq!(provider.calls(), calls);
    assert_eq!(fresh.count().unwrap(), 3);
}

#[tokio::test]
async fn test_rebuild_drops_reviews_removed_from_dataset() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);
    let provider = TrigramProvider::new(384);
    let mut store = SqliteVectorStore::open(&config.store_path()).unwrap();

    jobs::ingest(&config, &provider, &mut store).await.unwrap();
    std::fs::write(
        config.dataset_path(),
        "review_id,rating,review_text\nr1,5,Great breakfast\nr3,2,Breakfast was cold\n",
    )
    .unwrap();

    let rebuilt = jobs::ingest(&config, &provider, &mut store).await.unwrap();
    assert!(!rebuilt.stats.cache_hit);
    assert_eq!(store.count().unwrap(), rebuilt.dataset.len());

    let results = Retriever::new(&provider, &store)
        .retrieve("Rude staff", 3)
        .await
        .unwrap();
    assert!(!results.contains(&"Rude staff".to_string()));
}

#[tokio::test]
async fn test_cache_hit_replaces_foreign_documents() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);
    let provider = StubProvider::new(64);

    jobs::ingest(&config, &provider, &mut InMemoryVectorStore::new())
        .await
        .unwrap();

    let mut other = InMemoryVectorStore::new();
    let texts = strings(&["Noisy room", "Small pool", "Slow check-in", "Good wifi"]);
    let embeddings = crate::embeddings::EmbeddingProvider::embed_batch(&provider, &texts)
        .await
        .unwrap();
    other
        .add(&strings(&["x1", "x2", "x3", "x4"]), &texts, &embeddings)
        .unwrap();

    let reused = jobs::ingest(&config, &provider, &mut other).await.unwrap();
    assert!(reused.stats.cache_hit);

    let mut ids = other.ids().unwrap();
    ids.sort();
    assert_eq!(ids, strings(&["r1", "r2", "r3"]));
}

#[tokio::test]
async fn test_failing_row_aborts_by_default() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(
        temp.path(),
        "review_id,review_text\nr1,Great breakfast\nr2,FAIL here\nr3,Clean room\n",
    );
    let provider = StubProvider::new(64);
    let mut store = InMemoryVectorStore::new();

    let result = jobs::ingest(&config, &provider, &mut store).await;

    assert!(matches!(result, Err(AppError::Knowledge(_))));
    assert!(!cache_path_for(&config.dataset_path()).exists());
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_skip_policy_drops_failing_rows_only() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(
        temp.path(),
        "review_id,review_text\nr1,Great breakfast\nr2,FAIL here\nr3,Clean room\n",
    );
    let provider = StubProvider::new(64);
    let mut store = InMemoryVectorStore::new();

    let ingestion = EmbeddingCacheManager::new(&provider, &mut store)
        .with_settings(CacheSettings {
            validate: true,
            on_row_error: RowErrorPolicy::Skip,
        })
        .with_id_column("review_id")
        .with_batch_size(2)
        .load_and_embed(&config.dataset_path())
        .await
        .unwrap();

    assert_eq!(ingestion.stats.rows, 3);
    assert_eq!(ingestion.stats.embedded, 2);
    assert_eq!(ingestion.stats.skipped, vec!["r2"]);
    let ids: Vec<&str> = ingestion.dataset.documents().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r3"]);
    assert_eq!(store.count().unwrap(), 2);
}

#[tokio::test]
async fn test_missing_dataset_is_missing_artifact() {
    let temp = TempDir::new().unwrap();
    let mut config = workspace_config(temp.path(), REVIEWS_CSV);
    config.dataset.path = "absent.csv".into();

    let result = jobs::ingest(&config, &StubProvider::new(16), &mut InMemoryVectorStore::new()).await;
    assert!(matches!(result, Err(AppError::MissingArtifact(_))));
}

#[tokio::test]
async fn test_health_statistics_are_reproducible_with_seed() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);
    let provider = StubProvider::new(128);
    let mut store = InMemoryVectorStore::new();

    let first = jobs::health_report(&config, &provider, &mut store, 10, Some(7))
        .await
        .unwrap();
    let second = jobs::health_report(&config, &provider, &mut store, 10, Some(7))
        .await
        .unwrap();

    assert_eq!(first.report.sample_size, 3);
    assert_eq!(first.report.embedding_dimension, 128);
    assert_eq!(first.report.collection_count, StoreCount::Available(3));
    assert!(first.report.avg_pairwise_similarity.is_some());
    assert_eq!(
        first.report.avg_pairwise_similarity,
        second.report.avg_pairwise_similarity
    );
    assert_eq!(
        first.report.std_pairwise_similarity,
        second.report.std_pairwise_similarity
    );
    assert_eq!(first.report.recall_by_query.len(), 3);

    let summary = std::fs::read_to_string(&first.summary_path).unwrap();
    assert!(summary.starts_with(
        "timestamp,collection_count,embedding_dimension,avg_similarity,std_similarity,avg_recall\n"
    ));
    assert!(first.recall_path.ends_with("recall_scores.csv"));
}

#[tokio::test]
async fn test_health_records_unavailable_count() {
    let provider = StubProvider::new(32);
    let mut store = UncountableStore::default();
    let texts = strings(&["Great breakfast", "Rude staff", "Breakfast was cold"]);
    let embeddings = crate::embeddings::EmbeddingProvider::embed_batch(&provider, &texts)
        .await
        .unwrap();
    store
        .add(&strings(&["r1", "r2", "r3"]), &texts, &embeddings)
        .unwrap();

    let report = HealthAnalyzer::new(Retriever::new(&provider, &store))
        .analyze(&texts, 10, &mut StdRng::seed_from_u64(1))
        .await
        .unwrap();

    assert_eq!(report.collection_count, StoreCount::Unavailable);
    let breakfast = report
        .recall_by_query
        .iter()
        .find(|r| r.query == "breakfast quality")
        .unwrap();
    assert!((breakfast.recall_score - 0.4).abs() < 1e-9);
}

#[tokio::test]
async fn test_health_with_one_document_reports_unavailable_pairs() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(
        temp.path(),
        "review_id,rating,review_text\nr1,5,Great breakfast\n",
    );
    let provider = StubProvider::new(16);
    let mut store = InMemoryVectorStore::new();

    let outcome = jobs::health_report(&config, &provider, &mut store, 10, Some(1))
        .await
        .unwrap();

    assert_eq!(outcome.report.sample_size, 1);
    assert_eq!(outcome.report.avg_pairwise_similarity, None);
    assert_eq!(outcome.report.std_pairwise_similarity, None);
    assert_eq!(outcome.report.collection_count, StoreCount::Available(1));
    assert_eq!(outcome.report.embedding_dimension, 16);
    assert_eq!(outcome.report.recall_by_query.len(), 3);

    let summary = std::fs::read_to_string(&outcome.summary_path).unwrap();
    let row = summary.lines().nth(1).unwrap();
    assert!(row.contains(",1,16,unavailable,unavailable,"));
    assert!(outcome.recall_path.exists());
}

#[tokio::test]
async fn test_retrieval_evaluation_writes_one_row_per_topic() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);
    let provider = TrigramProvider::new(384);
    let mut store = InMemoryVectorStore::new();

    let outcome = jobs::retrieval_evaluation(&config, &provider, &mut store, 5)
        .await
        .unwrap();

    assert_eq!(outcome.evaluations.len(), config.evaluation.retrieval_queries.len());
    let breakfast = outcome
        .evaluations
        .iter()
        .find(|e| e.query == "breakfast quality")
        .unwrap();
    assert!(breakfast.top_similarity > 0.0);

    let csv = std::fs::read_to_string(&outcome.path).unwrap();
    assert_eq!(csv.lines().count(), outcome.evaluations.len() + 1);
}

#[tokio::test]
async fn test_quality_evaluation_scores_logged_sessions() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);
    let provider = TrigramProvider::new(384);
    let mut store = InMemoryVectorStore::new();
    jobs::ingest(&config, &provider, &mut store).await.unwrap();

    let log = SessionLog::new(config.session_log_path());
    log.append(&SessionLogEntry::now("How is breakfast?", "Guests say breakfast was cold"))
        .unwrap();
    log.append(&SessionLogEntry::now("How are staff?", "Staff can be rude"))
        .unwrap();

    let outcome = jobs::quality_evaluation(&config, &provider, &store, 2)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.skipped, 0);
    assert!(outcome.summary.is_some());
    assert!(outcome.path.starts_with(config.output_dir().join("metrics")));
    let name = outcome.path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("quality_scores_") && name.ends_with(".csv"));

    for record in &outcome.records {
        assert!((0.0..=1.0).contains(&record.faithfulness));
        assert!((-1.0..=1.0).contains(&record.sentiment_alignment));
    }
}

#[tokio::test]
async fn test_quality_evaluation_with_no_scorable_sessions_writes_header() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);
    let provider = StubProvider::new(32);
    let mut store = InMemoryVectorStore::new();
    jobs::ingest(&config, &provider, &mut store).await.unwrap();

    SessionLog::new(config.session_log_path())
        .append(&SessionLogEntry::now("FAIL breakfast?", "Cold"))
        .unwrap();

    let outcome = jobs::quality_evaluation(&config, &provider, &store, 2)
        .await
        .unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.skipped, 1);
    assert!(outcome.summary.is_none());
    let csv = std::fs::read_to_string(&outcome.path).unwrap();
    assert_eq!(
        csv,
        "timestamp,query,relevance,faithfulness,sentiment_alignment,overall_quality\n"
    );
}

#[tokio::test]
async fn test_quality_evaluation_requires_session_log() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);

    let result = jobs::quality_evaluation(&config, &TrigramProvider::new(16), &InMemoryVectorStore::new(), 5).await;
    assert!(matches!(result, Err(AppError::MissingArtifact(_))));
}

#[tokio::test]
async fn test_quality_evaluation_requires_documents() {
    let temp = TempDir::new().unwrap();
    let config = workspace_config(temp.path(), REVIEWS_CSV);
    SessionLog::new(config.session_log_path())
        .append(&SessionLogEntry::now("q", "r"))
        .unwrap();

    let result = jobs::quality_evaluation(&config, &TrigramProvider::new(16), &InMemoryVectorStore::new(), 5).await;
    assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
}
