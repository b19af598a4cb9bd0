//! Embedding cache manager.
//!
//! Loads a review dataset, embeds its text column and keeps the result next to
//! the dataset as `<dataset>.embedded.json`. The cache is all-or-nothing: it is
//! either reused whole or rebuilt whole, never patched row by row.

use crate::dataset::Dataset;
use crate::embeddings::EmbeddingProvider;
use crate::store::VectorStore;
use crate::types::{Document, IngestStats};
use chrono::{DateTime, Utc};
use ragscope_core::config::{CacheSettings, RowErrorPolicy};
use ragscope_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsString;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Suffix appended to the dataset path to locate its cache artifact.
pub const CACHE_SUFFIX: &str = ".embedded.json";

const DEFAULT_BATCH_SIZE: usize = 32;

/// Cache artifact location for a dataset.
pub fn cache_path_for(dataset_path: &Path) -> PathBuf {
    let mut path = OsString::from(dataset_path.as_os_str());
    path.push(CACHE_SUFFIX);
    PathBuf::from(path)
}

/// One dataset row together with its embedded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedRow {
    /// Dataset column values, passed through untouched
    pub values: Vec<String>,
    pub document: Document,
}

/// The cache artifact: a dataset augmented with embeddings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedDataset {
    pub source: PathBuf,
    pub source_sha256: String,
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub headers: Vec<String>,
    pub text_column: String,
    pub rows: Vec<EmbeddedRow>,
    pub created_at: DateTime<Utc>,
}

impl EmbeddedDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.rows.iter().map(|r| &r.document)
    }

    pub fn texts(&self) -> Vec<String> {
        self.documents().map(|d| d.text.clone()).collect()
    }

    /// Read a cache artifact.
    pub fn read(path: &Path) -> AppResult<Self> {
        let file = std::fs::File::open(path)?;
        let cached = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            AppError::Serialization(format!("Corrupt embedding cache {:?}: {}", path, e))
        })?;
        Ok(cached)
    }

    /// Write the artifact to a sibling temp file, then move it into place.
    pub fn write(&self, path: &Path) -> AppResult<()> {
        let mut tmp = OsString::from(path.as_os_str());
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        {
            let mut writer = BufWriter::new(std::fs::File::create(&tmp)?);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp, path)?;

        tracing::debug!("Wrote embedding cache {:?} ({} rows)", path, self.rows.len());
        Ok(())
    }

    /// Why this artifact no longer describes `dataset` under `provider`, if it doesn't.
    fn staleness(&self, dataset: &Dataset, provider: &dyn EmbeddingProvider) -> Option<String> {
        if self.source_sha256 != dataset.sha256 {
            return Some("dataset contents changed".to_string());
        }
        if self.provider != provider.provider_name()
            || self.model != provider.model_name()
            || self.dimensions != provider.dimensions()
        {
            return Some(format!(
                "embedded with {}/{} ({}d), now {}/{} ({}d)",
                self.provider,
                self.model,
                self.dimensions,
                provider.provider_name(),
                provider.model_name(),
                provider.dimensions()
            ));
        }
        None
    }
}

/// Result of [`EmbeddingCacheManager::load_and_embed`].
#[derive(Debug, Clone)]
pub struct Ingestion {
    pub dataset: EmbeddedDataset,
    pub stats: IngestStats,
}

/// Embeds datasets and fills the vector store, reusing cache artifacts.
pub struct EmbeddingCacheManager<'a> {
    provider: &'a dyn EmbeddingProvider,
    store: &'a mut dyn VectorStore,
    settings: CacheSettings,
    id_column: Option<String>,
    batch_size: usize,
}

impl<'a> EmbeddingCacheManager<'a> {
    pub fn new(provider: &'a dyn EmbeddingProvider, store: &'a mut dyn VectorStore) -> Self {
        Self {
            provider,
            store,
            settings: CacheSettings::default(),
            id_column: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_settings(mut self, settings: CacheSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Column whose values become document ids.
    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Load the dataset at `dataset_path`, embedding it unless a usable
    /// cache artifact exists.
    ///
    /// On a miss every row is embedded, the cache is written, and then the
    /// store is cleared and refilled, so ids dropped from the dataset leave
    /// the store too. The two writes are not atomic
    /// together; a crash in between leaves them out of step until the next
    /// rebuild.
    pub async fn load_and_embed(&mut self, dataset_path: &Path) -> AppResult<Ingestion> {
        let started = Instant::now();
        let dataset = Dataset::load(dataset_path)?;
        let text_col = dataset.text_column(self.id_column.as_deref())?;
        let cache_path = cache_path_for(dataset_path);

        if cache_path.exists() {
            let cached = EmbeddedDataset::read(&cache_path)?;
            let stale = if self.settings.validate {
                cached.staleness(&dataset, self.provider)
            } else {
                None
            };

            match stale {
                None => {
                    tracing::info!(
                        "Reusing embedding cache {:?} ({} rows)",
                        cache_path,
                        cached.len()
                    );
                    self.resync_store(&cached)?;
                    let stats = IngestStats {
                        rows: dataset.len(),
                        embedded: 0,
                        skipped: Vec::new(),
                        cache_hit: true,
                        duration_secs: started.elapsed().as_secs_f64(),
                    };
                    return Ok(Ingestion {
                        dataset: cached,
                        stats,
                    });
                }
                Some(reason) => {
                    tracing::warn!("Embedding cache {:?} is stale ({}), rebuilding", cache_path, reason);
                }
            }
        }

        let id_col = self
            .id_column
            .as_deref()
            .and_then(|name| dataset.column_index(name));
        let ids: Vec<String> = (0..dataset.len()).map(|i| dataset.row_id(i, id_col)).collect();
        let texts: Vec<String> = dataset
            .records
            .iter()
            .map(|r| r.get(text_col).cloned().unwrap_or_default())
            .collect();

        tracing::info!(
            "Embedding {} rows from column '{}' with {}/{}",
            texts.len(),
            dataset.headers[text_col],
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let (embeddings, skipped) = self.embed_all(&ids, &texts).await?;

        let rows: Vec<EmbeddedRow> = dataset
            .records
            .iter()
            .zip(ids.iter().zip(&texts))
            .zip(embeddings)
            .filter_map(|((values, (id, text)), embedding)| {
                embedding.map(|embedding| EmbeddedRow {
                    values: values.clone(),
                    document: Document {
                        id: id.clone(),
                        text: text.clone(),
                        embedding,
                    },
                })
            })
            .collect();

        let embedded = EmbeddedDataset {
            source: dataset_path.to_path_buf(),
            source_sha256: dataset.sha256.clone(),
            provider: self.provider.provider_name().to_string(),
            model: self.provider.model_name().to_string(),
            dimensions: self.provider.dimensions(),
            headers: dataset.headers.clone(),
            text_column: dataset.headers[text_col].clone(),
            rows,
            created_at: Utc::now(),
        };

        embedded.write(&cache_path)?;
        self.replace_store(&embedded)?;

        let stats = IngestStats {
            rows: dataset.len(),
            embedded: embedded.len(),
            skipped,
            cache_hit: false,
            duration_secs: started.elapsed().as_secs_f64(),
        };

        tracing::info!(
            "Embedded {} of {} rows in {:.2}s",
            stats.embedded,
            stats.rows,
            stats.duration_secs
        );

        Ok(Ingestion {
            dataset: embedded,
            stats,
        })
    }

    /// Embed in batches of `batch_size`, keeping row order.
    ///
    /// Under [`RowErrorPolicy::Skip`] a failed batch is retried one row at a
    /// time and failing rows come back as `None`, with their ids in the second
    /// element.
    async fn embed_all(
        &self,
        ids: &[String],
        texts: &[String],
    ) -> AppResult<(Vec<Option<Vec<f32>>>, Vec<String>)> {
        let mut embeddings = Vec::with_capacity(texts.len());
        let mut skipped = Vec::new();

        for (batch_ids, batch) in ids.chunks(self.batch_size).zip(texts.chunks(self.batch_size)) {
            match self.provider.embed_batch(batch).await {
                Ok(vectors) => embeddings.extend(vectors.into_iter().map(Some)),
                Err(e) if self.settings.on_row_error == RowErrorPolicy::Skip => {
                    tracing::debug!("Batch failed ({}), retrying row by row", e);
                    for (id, text) in batch_ids.iter().zip(batch) {
                        match self.provider.embed(text).await {
                            Ok(vector) => embeddings.push(Some(vector)),
                            Err(e) => {
                                tracing::warn!("Skipping row {}: {}", id, e);
                                skipped.push(id.clone());
                                embeddings.push(None);
                            }
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok((embeddings, skipped))
    }

    fn upsert(&mut self, embedded: &EmbeddedDataset) -> AppResult<()> {
        if embedded.is_empty() {
            return Ok(());
        }

        let mut ids = Vec::with_capacity(embedded.len());
        let mut texts = Vec::with_capacity(embedded.len());
        let mut vectors = Vec::with_capacity(embedded.len());
        for doc in embedded.documents() {
            ids.push(doc.id.clone());
            texts.push(doc.text.clone());
            vectors.push(doc.embedding.clone());
        }

        self.store.add(&ids, &texts, &vectors)
    }

    /// Make the store hold exactly the cached documents.
    fn replace_store(&mut self, embedded: &EmbeddedDataset) -> AppResult<()> {
        self.store.reset()?;
        self.upsert(embedded)
    }

    /// Refill the store from a reused cache when its ids differ from the
    /// cached ones, e.g. after the store file was deleted or filled from
    /// another dataset.
    fn resync_store(&mut self, cached: &EmbeddedDataset) -> AppResult<()> {
        match self.store.ids() {
            Ok(stored) => {
                let stored: HashSet<String> = stored.into_iter().collect();
                let expected: HashSet<&str> =
                    cached.documents().map(|doc| doc.id.as_str()).collect();
                if stored.len() == expected.len()
                    && stored.iter().all(|id| expected.contains(id.as_str()))
                {
                    return Ok(());
                }
                tracing::info!(
                    "Vector store has {} documents, cache has {}; replacing with cached documents",
                    stored.len(),
                    cached.len()
                );
                self.replace_store(cached)
            }
            Err(e) => {
                tracing::warn!("Could not list vector store documents: {}", e);
                Ok(())
            }
        }
    }
}
