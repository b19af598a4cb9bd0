//! Tabular review dataset loading.

use ragscope_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Substrings that mark a header as the free-text column.
const TEXT_COLUMN_MARKERS: [&str; 2] = ["review", "text"];

/// A CSV dataset held in memory, with a fingerprint of its bytes.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,

    /// Hex SHA-256 of the file contents
    pub sha256: String,
}

impl Dataset {
    /// Read and parse a CSV file with a header row.
    pub fn load(path: &Path) -> AppResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::MissingArtifact(format!("Dataset not found: {:?}", path))
            } else {
                AppError::Io(e)
            }
        })?;
        Self::from_bytes(path, &bytes)
    }

    /// Parse CSV bytes as if read from `path`.
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> AppResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| {
                AppError::Serialization(format!("Malformed row in {:?}: {}", path, e))
            })?;
            records.push(record.iter().map(str::to_string).collect());
        }

        tracing::debug!(
            "Loaded {} rows with columns {:?} from {:?}",
            records.len(),
            headers,
            path
        );

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            records,
            sha256: fingerprint(bytes),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of the free-text column, never the identity column.
    /// See [`detect_text_column`].
    pub fn text_column(&self, id_column: Option<&str>) -> AppResult<usize> {
        detect_text_column(&self.headers, id_column)
    }

    /// Identity of row `index`: the id column's value when present and
    /// non-blank, else the ordinal position.
    pub fn row_id(&self, index: usize, id_column: Option<usize>) -> String {
        id_column
            .and_then(|col| self.records.get(index).and_then(|r| r.get(col)))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| index.to_string())
    }
}

/// First header containing "review" or "text", case-insensitively.
///
/// `exclude` names the identity column, which would otherwise match first in
/// the common `review_id, review_text` layout.
pub fn detect_text_column(headers: &[String], exclude: Option<&str>) -> AppResult<usize> {
    headers
        .iter()
        .position(|h| {
            let lower = h.to_lowercase();
            Some(h.as_str()) != exclude && TEXT_COLUMN_MARKERS.iter().any(|m| lower.contains(m))
        })
        .ok_or_else(|| {
            AppError::Schema(format!(
                "No text column found among {:?}. Expected a column containing 'review' or 'text'.",
                headers
            ))
        })
}

/// Hex SHA-256 of a byte slice.
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detects_customer_review_text() {
        let cols = headers(&["id", "rating", "customer_review_text"]);
        assert_eq!(detect_text_column(&cols, None).unwrap(), 2);
    }

    #[test]
    fn test_detection_skips_identity_column() {
        let cols = headers(&["review_id", "review_text"]);
        assert_eq!(detect_text_column(&cols, None).unwrap(), 0);
        assert_eq!(detect_text_column(&cols, Some("review_id")).unwrap(), 1);
    }

    #[test]
    fn test_detection_takes_first_match_case_insensitive() {
        let cols = headers(&["hotel", "Review_Title", "full_text"]);
        assert_eq!(detect_text_column(&cols, None).unwrap(), 1);
    }

    #[test]
    fn test_detection_fails_without_text_column() {
        let cols = headers(&["id", "rating", "stay_date"]);
        assert!(matches!(
            detect_text_column(&cols, None),
            Err(AppError::Schema(_))
        ));
    }

    #[test]
    fn test_from_bytes_parses_quoted_fields() {
        let csv = b"review_id,review_text\nr1,\"Great breakfast, friendly staff\"\nr2,Rude staff\n";
        let dataset = Dataset::from_bytes(Path::new("mem.csv"), csv).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0][1], "Great breakfast, friendly staff");
        assert_eq!(dataset.column_index("review_id"), Some(0));
        assert_eq!(dataset.sha256.len(), 64);
    }

    #[test]
    fn test_row_id_falls_back_to_ordinal() {
        let csv = b"review_id,text\nr1,a\n,b\n";
        let dataset = Dataset::from_bytes(Path::new("mem.csv"), csv).unwrap();
        let id_col = dataset.column_index("review_id");

        assert_eq!(dataset.row_id(0, id_col), "r1");
        assert_eq!(dataset.row_id(1, id_col), "1");
        assert_eq!(dataset.row_id(0, None), "0");
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let csv = b"id,text\n1,a,extra\n";
        let result = Dataset::from_bytes(Path::new("mem.csv"), csv);
        assert!(matches!(result, Err(AppError::Serialization(_))));
    }

    #[test]
    fn test_missing_file_is_missing_artifact() {
        let result = Dataset::load(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(AppError::MissingArtifact(_))));
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        assert_ne!(fingerprint(b"a"), fingerprint(b"b"));
        assert_eq!(fingerprint(b"a"), fingerprint(b"a"));
    }
}
