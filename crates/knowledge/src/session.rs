//! Append-only log of answered questions.

use crate::report::{write_rows, WriteMode};
use chrono::Local;
use ragscope_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    pub timestamp: String,
    pub query: String,
    pub response: String,
}

impl SessionLogEntry {
    /// Entry stamped with the current local time.
    pub fn now(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            query: query.into(),
            response: response.into(),
        }
    }
}

/// Session log file with columns `timestamp, query, response`.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &SessionLogEntry) -> AppResult<()> {
        write_rows(&self.path, std::slice::from_ref(entry), WriteMode::Append)
    }

    /// Every logged entry, oldest first.
    pub fn read_all(&self) -> AppResult<Vec<SessionLogEntry>> {
        if !self.path.exists() {
            return Err(AppError::MissingArtifact(format!(
                "No session log at {:?}. Ask some questions first (`ragscope ask <question>`).",
                self.path
            )));
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let entries = reader
            .deserialize()
            .collect::<Result<Vec<SessionLogEntry>, _>>()?;

        tracing::debug!("Read {} session log entries from {:?}", entries.len(), self.path);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_log_is_missing_artifact() {
        let temp = TempDir::new().unwrap();
        let log = SessionLog::new(temp.path().join("session_log.csv"));
        assert!(matches!(log.read_all(), Err(AppError::MissingArtifact(_))));
    }

    #[test]
    fn test_append_and_read_back() {
        let temp = TempDir::new().unwrap();
        let log = SessionLog::new(temp.path().join("outputs/session_log.csv"));

        log.append(&SessionLogEntry::now("How is breakfast?", "Mostly cold, say guests."))
            .unwrap();
        log.append(&SessionLogEntry::now("Staff?", "Friendly, with \"some\" exceptions"))
            .unwrap();

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].query, "How is breakfast?");
        assert_eq!(entries[1].response, "Friendly, with \"some\" exceptions");

        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw.matches("timestamp,query,response").count(), 1);
    }
}
