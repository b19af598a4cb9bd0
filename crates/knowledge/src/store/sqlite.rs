//! SQLite-backed vector store.

use super::{check_parallel, score_document, top_k, VectorStore};
use crate::types::ScoredDocument;
use ragscope_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// Persistent vector store: one row per document, embeddings as
/// little-endian f32 blobs, brute-force cosine search.
pub struct SqliteVectorStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteVectorStore")
            .field("path", &self.path)
            .finish()
    }
}

impl SqliteVectorStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to create store directory: {}", e))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to open vector store {:?}: {}", path, e))
        })?;

        let store = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;

        tracing::debug!("Opened vector store at {:?}", path);
        Ok(store)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to open in-memory store: {}", e))
        })?;
        let store = Self { conn, path: None };
        store.init_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init_schema(&self) -> AppResult<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS documents (
                    id TEXT PRIMARY KEY,
                    text TEXT NOT NULL,
                    embedding BLOB NOT NULL,
                    dimensions INTEGER NOT NULL
                );
                "#,
            )
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to create tables: {}", e)))
    }
}

impl VectorStore for SqliteVectorStore {
    fn add(
        &mut self,
        ids: &[String],
        documents: &[String],
        embeddings: &[Vec<f32>],
    ) -> AppResult<()> {
        check_parallel(ids, documents, embeddings)?;

        let tx = self
            .conn
            .transaction()
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to begin transaction: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO documents (id, text, embedding, dimensions)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| AppError::Knowledge(format!("Failed to prepare insert: {}", e)))?;

            for ((id, text), embedding) in ids.iter().zip(documents).zip(embeddings) {
                stmt.execute(params![
                    id,
                    text,
                    embedding_to_bytes(embedding),
                    embedding.len() as i64,
                ])
                .map_err(|e| AppError::Knowledge(format!("Failed to insert document {}: {}", id, e)))?;
            }
        }

        tx.commit()
            .map_err(|e| AppError::Knowledge(format!("Failed to commit documents: {}", e)))?;

        tracing::debug!("Upserted {} documents", ids.len());
        Ok(())
    }

    fn query(&self, embedding: &[f32], k: usize) -> AppResult<Vec<ScoredDocument>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare("SELECT id, text, embedding FROM documents")
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to query documents: {}", e)))?;

        let mut scored = Vec::new();
        for row in rows {
            let (id, text, bytes) = row
                .map_err(|e| AppError::StoreUnavailable(format!("Failed to read document: {}", e)))?;
            let stored = bytes_to_embedding(&bytes)?;
            scored.push(score_document(embedding, &id, &text, &stored)?);
        }

        let results = top_k(scored, k);
        tracing::debug!("Retrieved {} documents (requested top-{})", results.len(), k);
        Ok(results)
    }

    fn count(&self) -> AppResult<usize> {
        self.conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
            .map_err(|e| AppError::StoreUnavailable(format!("Failed to count documents: {}", e)))
    }

    fn ids(&self) -> AppResult<Vec<String>> {
        let unavailable =
            |e: rusqlite::Error| AppError::StoreUnavailable(format!("Failed to list ids: {}", e));
        let mut stmt = self.conn.prepare("SELECT id FROM documents").map_err(unavailable)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(unavailable)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(unavailable)?;
        Ok(ids)
    }

    fn reset(&mut self) -> AppResult<()> {
        self.conn
            .execute("DELETE FROM documents", [])
            .map_err(|e| AppError::Knowledge(format!("Failed to delete documents: {}", e)))?;

        tracing::info!("Reset vector store");
        Ok(())
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
