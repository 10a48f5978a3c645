//! SQLite-backed vector index
//!
//! Stores one row per chunk key with its text, JSON metadata and the vector
//! as little-endian `f32` bytes. Queries filter on the indexed metadata
//! columns in SQL, then rank the remaining rows by cosine distance.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::vector_store::{IndexEntry, IndexHit, MetadataFilter, VectorIndex};
use crate::types::ChunkMetadata;

/// Persistent vector index over a single SQLite table
pub struct SqliteVectorIndex {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVectorIndex {
    /// Create or open the index at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::storage(format!("Failed to open index {}: {}", path.display(), e)))?;

        let index = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        index.migrate()?;
        Ok(index)
    }

    /// Create an in-memory index
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage(format!("Failed to open in-memory index: {}", e)))?;

        let index = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        index.migrate()?;
        Ok(index)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
        "#).map_err(|e| Error::storage(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS index_entries (
                key TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                folder_id TEXT,
                text TEXT NOT NULL,
                metadata TEXT NOT NULL,
                vector BLOB NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_index_entries_document_id ON index_entries(document_id);
            CREATE INDEX IF NOT EXISTS idx_index_entries_folder_id ON index_entries(folder_id);
        "#).map_err(|e| Error::storage(format!("Failed to create index tables: {}", e)))?;

        Ok(())
    }

    fn upsert_sync(conn: &Mutex<Connection>, entries: &[IndexEntry]) -> Result<usize> {
        let mut conn = conn.lock();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO index_entries (key, document_id, folder_id, text, metadata, vector, updated_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                   ON CONFLICT(key) DO UPDATE SET
                       document_id = excluded.document_id,
                       folder_id = excluded.folder_id,
                       text = excluded.text,
                       metadata = excluded.metadata,
                       vector = excluded.vector,
                       updated_at = excluded.updated_at"#,
            )?;

            for entry in entries {
                let metadata = serde_json::to_string(&entry.metadata)?;
                stmt.execute(params![
                    entry.key,
                    entry.metadata.document_id,
                    entry.metadata.folder_id,
                    entry.text,
                    metadata,
                    encode_vector(&entry.vector),
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(entries.len())
    }

    fn query_sync(
        conn: &Mutex<Connection>,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexHit>> {
        let conn = conn.lock();
        let (sql, arg) = match filter {
            None => ("SELECT key, text, metadata, vector FROM index_entries", None),
            Some(MetadataFilter::Document(id)) => (
                "SELECT key, text, metadata, vector FROM index_entries WHERE document_id = ?1",
                Some(id.as_str()),
            ),
            Some(MetadataFilter::Folder(id)) => (
                "SELECT key, text, metadata, vector FROM index_entries WHERE folder_id = ?1",
                Some(id.as_str()),
            ),
        };

        let mut stmt = conn.prepare(sql)?;
        let map_row = |row: &rusqlite::Row<'_>| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        };
        let rows = match arg {
            Some(arg) => stmt.query_map(params![arg], map_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt.query_map([], map_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
        };

        let mut hits = Vec::with_capacity(rows.len());
        for (key, text, metadata, blob) in rows {
            let stored = decode_vector(&blob);
            if stored.len() != vector.len() {
                tracing::debug!(
                    "Skipping {}: stored dimension {} != query dimension {}",
                    key,
                    stored.len(),
                    vector.len()
                );
                continue;
            }
            let metadata: ChunkMetadata = serde_json::from_str(&metadata)?;
            hits.push(IndexHit {
                key,
                text,
                metadata,
                distance: 1.0 - cosine_similarity(vector, &stored),
            });
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(top_k);
        Ok(hits)
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }
        let conn = self.conn.clone();
        let written = tokio::task::spawn_blocking(move || Self::upsert_sync(&conn, &entries)).await??;
        tracing::debug!("Upserted {} index entries", written);
        Ok(written)
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let conn = self.conn.clone();
        let vector = vector.to_vec();
        let filter = filter.cloned();
        tokio::task::spawn_blocking(move || Self::query_sync(&conn, &vector, top_k, filter.as_ref()))
            .await?
    }

    async fn len(&self) -> Result<usize> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let count: i64 = conn
                .lock()
                .query_row("SELECT COUNT(*) FROM index_entries", [], |row| row.get(0))?;
            Ok::<_, Error>(count as usize)
        })
        .await?
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.len().await.is_ok())
    }

    fn name(&self) -> &str {
        "sqlite-cosine"
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Cosine similarity; 0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
