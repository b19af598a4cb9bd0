//! CSV report output.

use crate::session::SessionLogEntry;
use crate::types::{HealthSummaryRow, QualityRecord, RecallScore, RetrievalEvaluation};
use ragscope_core::AppResult;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// A row type written as one CSV record.
///
/// `COLUMNS` must match the serialized field names; it supplies the header
/// when there are no rows to derive it from.
pub trait CsvRow: Serialize {
    const COLUMNS: &'static [&'static str];
}

impl CsvRow for RecallScore {
    const COLUMNS: &'static [&'static str] = &["query", "recall_score"];
}

impl CsvRow for HealthSummaryRow {
    const COLUMNS: &'static [&'static str] = &[
        "timestamp",
        "collection_count",
        "embedding_dimension",
        "avg_similarity",
        "std_similarity",
        "avg_recall",
    ];
}

impl CsvRow for RetrievalEvaluation {
    const COLUMNS: &'static [&'static str] =
        &["query", "avg_similarity", "top_similarity", "examples"];
}

impl CsvRow for QualityRecord {
    const COLUMNS: &'static [&'static str] = &[
        "timestamp",
        "query",
        "relevance",
        "faithfulness",
        "sentiment_alignment",
        "overall_quality",
    ];
}

impl CsvRow for SessionLogEntry {
    const COLUMNS: &'static [&'static str] = &["timestamp", "query", "response"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the file
    Overwrite,
    /// Add rows at the end; the header is written only if the file is new or empty
    Append,
}

/// Serialize `rows` as CSV to `path`, creating parent directories.
///
/// The header is written even when `rows` is empty. Errors (unwritable path,
/// serialization) are returned, never swallowed.
pub fn write_rows<T: CsvRow>(path: &Path, rows: &[T], mode: WriteMode) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let has_content = std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
    let write_header = mode == WriteMode::Overwrite || !has_content;

    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        WriteMode::Overwrite => options.write(true).truncate(true),
        WriteMode::Append => options.append(true),
    };
    let file = options.open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);
    if rows.is_empty() && write_header {
        writer.write_record(T::COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::debug!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}

/// Writes named reports under an output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Overwrite `<output_dir>/<file_name>` with `rows`, returning its path.
    pub fn write<T: CsvRow>(&self, file_name: &str, rows: &[T]) -> AppResult<PathBuf> {
        let path = self.output_dir.join(file_name);
        write_rows(&path, rows, WriteMode::Overwrite)?;
        tracing::info!("Saved {:?}", path);
        Ok(path)
    }
}
