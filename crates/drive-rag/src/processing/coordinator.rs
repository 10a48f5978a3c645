//! Ingestion coordinator: list -> extract -> chunk -> embed -> upsert

use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::Result;
use crate::ingestion::{BatchEmbedder, DocumentExtractor, TextChunker};
use crate::providers::{EmbeddingProvider, FileStore, IndexEntry, VectorIndex};
use crate::types::{ChunkMetadata, IngestionRun, SourceDocument};

use super::run_state::{IngestionTracker, RunGuard};

/// Message recorded when the scope holds nothing to ingest
pub const NOTHING_TO_INGEST: &str = "No supported files found to ingest.";

/// Result of processing a file
#[derive(Debug, PartialEq)]
pub enum FileOutcome {
    /// Chunks written to the index
    Indexed(usize),
    /// File had nothing to index
    Skipped(String),
}

/// Final counters of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub total_files: usize,
    pub indexed_files: usize,
    pub skipped_files: usize,
    pub failed_files: usize,
    pub chunks_indexed: usize,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl RunSummary {
    fn from_run(run_id: Uuid, run: &IngestionRun) -> Self {
        Self {
            run_id,
            total_files: run.total_files,
            indexed_files: run
                .processed_files
                .saturating_sub(run.skipped_files + run.failed_files),
            skipped_files: run.skipped_files,
            failed_files: run.failed_files,
            chunks_indexed: run.chunks_indexed,
            error: run.error.clone(),
            message: run.message.clone(),
        }
    }
}

/// Handle on a spawned ingestion run
pub struct IngestionHandle {
    run_id: Uuid,
    task: JoinHandle<RunSummary>,
}

impl IngestionHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Wait for the run to finish
    pub async fn wait(self) -> Result<RunSummary> {
        Ok(self.task.await?)
    }
}

/// Drives a full ingestion pass over the file store
pub struct IngestionCoordinator {
    store: Arc<dyn FileStore>,
    extractor: DocumentExtractor,
    chunker: TextChunker,
    embedder: BatchEmbedder,
    index: Arc<dyn VectorIndex>,
    tracker: IngestionTracker,
    supported_mime_types: Vec<String>,
    default_folder: Option<String>,
}

impl IngestionCoordinator {
    /// Create a coordinator
    pub fn new(
        config: &RagConfig,
        store: Arc<dyn FileStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self> {
        Ok(Self {
            extractor: DocumentExtractor::new(Arc::clone(&store)),
            store,
            chunker: TextChunker::from_config(&config.chunking)?,
            embedder: BatchEmbedder::new(embeddings, config.embeddings.batch_size),
            index,
            tracker: IngestionTracker::new(),
            supported_mime_types: config.ingestion.mime_types(&config.file_store.backend),
            default_folder: config.ingestion.folder_id.clone(),
        })
    }

    /// Latest run status
    pub fn status(&self) -> IngestionRun {
        self.tracker.snapshot()
    }

    /// Claim the run slot and spawn the run.
    ///
    /// Returns `Error::Conflict` without side effects when a run is active.
    pub fn start(self: &Arc<Self>, scope: Option<String>) -> Result<IngestionHandle> {
        let guard = self.tracker.try_begin()?;
        let run_id = guard.run_id();
        let coordinator = Arc::clone(self);

        let task = tokio::spawn(async move { coordinator.run(guard, scope).await });

        Ok(IngestionHandle { run_id, task })
    }

    async fn run(&self, guard: RunGuard, scope: Option<String>) -> RunSummary {
        let run_id = guard.run_id();
        let scope = scope.or_else(|| self.default_folder.clone());
        tracing::info!(
            "Starting ingestion run {} from {} (scope: {})",
            run_id,
            self.store.name(),
            scope.as_deref().unwrap_or("all files")
        );

        let files = match self.store.list(scope.as_deref()).await {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("Ingestion run {} aborted, listing failed: {}", run_id, e);
                guard.set_error(e.to_string());
                return RunSummary::from_run(run_id, &guard.snapshot());
            }
        };

        let supported: Vec<SourceDocument> = files
            .into_iter()
            .filter(|f| self.supported_mime_types.iter().any(|m| m == &f.mime_type))
            .collect();

        guard.set_total(supported.len());
        if supported.is_empty() {
            tracing::info!("Ingestion run {}: no supported files", run_id);
            guard.set_message(NOTHING_TO_INGEST);
            return RunSummary::from_run(run_id, &guard.snapshot());
        }

        tracing::info!("Found {} supported files to process", supported.len());
        let total = supported.len();

        for (i, doc) in supported.iter().enumerate() {
            guard.begin_file(i + 1, &doc.name);
            tracing::info!("Processing: {} ({}/{})", doc.name, i + 1, total);

            match self.process_file(doc).await {
                Ok(FileOutcome::Indexed(chunks)) => {
                    guard.record_indexed(chunks);
                    tracing::info!("Indexed {}: {} chunks", doc.name, chunks);
                }
                Ok(FileOutcome::Skipped(reason)) => {
                    guard.record_skipped();
                    tracing::info!("Skipped {}: {}", doc.name, reason);
                }
                Err(e) => {
                    guard.record_failed();
                    tracing::warn!("Failed to process {}: {}", doc.name, e);
                }
            }
        }

        let snapshot = guard.snapshot();
        guard.set_message(format!(
            "Ingestion completed: {} files, {} chunks indexed, {} skipped, {} failed",
            total, snapshot.chunks_indexed, snapshot.skipped_files, snapshot.failed_files
        ));
        tracing::info!("Ingestion run {} completed", run_id);

        RunSummary::from_run(run_id, &guard.snapshot())
    }

    /// Index a single file
    pub async fn process_file(&self, doc: &SourceDocument) -> Result<FileOutcome> {
        let text = self.extractor.extract(doc).await?;
        if text.trim().is_empty() {
            return Ok(FileOutcome::Skipped("no extractable text".to_string()));
        }

        let path = match self.store.resolve_path(&doc.id).await {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("Path lookup for {} failed: {}", doc.name, e);
                format!("/{}", doc.name)
            }
        };

        let metadata = ChunkMetadata::for_document(doc, path)?;
        let chunks = self.chunker.chunk(&text, &metadata);
        if chunks.is_empty() {
            return Ok(FileOutcome::Skipped("text too short to chunk".to_string()));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await;

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry {
                key: chunk.key(),
                vector,
                text: chunk.text,
                metadata: chunk.metadata,
            })
            .collect();

        let written = self.index.upsert(entries).await?;
        Ok(FileOutcome::Indexed(written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::config::FileStoreBackend;
    use crate::providers::mock::{FailingEmbedder, KeywordEmbedder, MockFileStore};
    use crate::providers::LocalFileStore;
    use crate::storage::SqliteVectorIndex;
    use crate::types::document::mime;
    use tokio::sync::Notify;

    const VOCAB: &[&str] = &["lorem", "zebra", "budget"];

    fn zebra_text() -> String {
        let head: String = "lorem ipsum ".chars().cycle().take(800).collect();
        let tail: String = "zebra crossing ".chars().cycle().take(200).collect();
        format!("{}{}", head, tail)
    }

    fn setup(
        store: MockFileStore,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> (Arc<IngestionCoordinator>, Arc<SqliteVectorIndex>) {
        let index = Arc::new(SqliteVectorIndex::in_memory().unwrap());
        let coordinator = IngestionCoordinator::new(
            &RagConfig::default(),
            Arc::new(store),
            embeddings,
            index.clone(),
        )
        .unwrap();
        (Arc::new(coordinator), index)
    }

    fn keyword() -> Arc<dyn EmbeddingProvider> {
        Arc::new(KeywordEmbedder::new(VOCAB))
    }

    #[tokio::test]
    async fn test_ingests_supported_files() {
        let doc = SourceDocument::new("doc-1", "Animals", mime::GOOGLE_DOCUMENT).with_parent("folder-a");
        let store = MockFileStore::new()
            .with_file(doc, zebra_text())
            .with_file(SourceDocument::new("img", "photo.png", "image/png"), "binary")
            .with_path("doc-1", "/Team/Animals");
        let (coordinator, index) = setup(store, keyword());

        let summary = coordinator.start(None).unwrap().wait().await.unwrap();
        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.indexed_files, 1);
        assert_eq!(summary.chunks_indexed, 2);
        assert_eq!(index.len().await.unwrap(), 2);

        let hits = index.query(&[0.0, 1.0, 0.0], 1, None).await.unwrap();
        assert_eq!(hits[0].key, "doc-1_chunk_1");
        assert_eq!(hits[0].metadata.path, "/Team/Animals");
        assert_eq!(hits[0].metadata.folder_id.as_deref(), Some("folder-a"));

        let status = coordinator.status();
        assert!(!status.is_ingesting);
        assert_eq!(status.processed_files, 1);
        assert!(status.current_file.is_none());
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let doc = SourceDocument::new("doc-1", "Animals", mime::GOOGLE_DOCUMENT);
        let store = MockFileStore::new().with_file(doc, zebra_text());
        let (coordinator, index) = setup(store, keyword());

        coordinator.start(None).unwrap().wait().await.unwrap();
        let first = index.query(&[0.0, 1.0, 0.0], 10, None).await.unwrap();

        coordinator.start(None).unwrap().wait().await.unwrap();
        let second = index.query(&[0.0, 1.0, 0.0], 10, None).await.unwrap();

        assert_eq!(index.len().await.unwrap(), 2);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.key, b.key);
            assert_eq!(a.distance, b.distance);
        }
    }

    #[tokio::test]
    async fn test_start_while_running_conflicts() {
        let gate = Arc::new(Notify::new());
        let doc = SourceDocument::new("doc-1", "Animals", mime::GOOGLE_DOCUMENT);
        let store = MockFileStore::new()
            .with_file(doc, zebra_text())
            .gated(gate.clone());
        let (coordinator, _index) = setup(store, keyword());

        let handle = coordinator.start(None).unwrap();
        let before = coordinator.status();

        let err = coordinator.start(None).err().unwrap();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(coordinator.status(), before);

        gate.notify_one();
        let summary = handle.wait().await.unwrap();
        assert_eq!(summary.indexed_files, 1);
        assert!(coordinator.start(None).is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_accept_exactly_one() {
        let gate = Arc::new(Notify::new());
        let store = MockFileStore::new().gated(gate.clone());
        let (coordinator, _index) = setup(store, keyword());

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let coordinator = coordinator.clone();
                tokio::spawn(async move { coordinator.start(None) })
            })
            .collect();

        let mut accepted = Vec::new();
        let mut conflicts = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(handle) => accepted.push(handle),
                Err(Error::Conflict(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(accepted.len(), 1);
        assert_eq!(conflicts, 7);

        gate.notify_one();
        for handle in accepted {
            handle.wait().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_nothing_supported() {
        let store = MockFileStore::new()
            .with_file(SourceDocument::new("v", "clip.mp4", "video/mp4"), "data");
        let (coordinator, _index) = setup(store, keyword());

        let summary = coordinator.start(None).unwrap().wait().await.unwrap();
        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.message.as_deref(), Some(NOTHING_TO_INGEST));
        assert!(summary.error.is_none());
        assert!(!coordinator.status().is_ingesting);
    }

    #[tokio::test]
    async fn test_failed_file_does_not_stop_run() {
        let store = MockFileStore::new()
            .with_broken_file(SourceDocument::new("bad", "corrupt.pdf", mime::PDF))
            .with_file(SourceDocument::new("empty", "Blank", mime::GOOGLE_DOCUMENT), "   \n  ")
            .with_file(SourceDocument::new("good", "Budget", mime::GOOGLE_SPREADSHEET), "budget,total\nQ3,1200\n");
        let (coordinator, index) = setup(store, keyword());

        let summary = coordinator.start(None).unwrap().wait().await.unwrap();
        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.failed_files, 1);
        assert_eq!(summary.skipped_files, 1);
        assert_eq!(summary.indexed_files, 1);
        assert_eq!(index.len().await.unwrap(), 1);

        let status = coordinator.status();
        assert_eq!(status.processed_files, 3);
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_embedding_outage_indexes_zero_vectors() {
        let doc = SourceDocument::new("doc-1", "Animals", mime::GOOGLE_DOCUMENT);
        let store = MockFileStore::new().with_file(doc, zebra_text());
        let (coordinator, index) = setup(store, Arc::new(FailingEmbedder { dimensions: 3 }));

        let summary = coordinator.start(None).unwrap().wait().await.unwrap();
        assert_eq!(summary.failed_files, 0);
        assert_eq!(summary.chunks_indexed, 2);
        assert_eq!(index.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_listing_failure_is_recorded() {
        let (coordinator, _index) = setup(MockFileStore::new().failing_list(), keyword());

        let summary = coordinator.start(None).unwrap().wait().await.unwrap();
        assert!(summary.error.is_some());

        let status = coordinator.status();
        assert!(!status.is_ingesting);
        assert!(status.error.unwrap().contains("mock listing failed"));
    }

    #[tokio::test]
    async fn test_scope_and_path_fallback() {
        let store = MockFileStore::new()
            .with_file(
                SourceDocument::new("in", "Inside", mime::GOOGLE_DOCUMENT).with_parent("f1"),
                "budget review notes for the team",
            )
            .with_file(
                SourceDocument::new("out", "Outside", mime::GOOGLE_DOCUMENT).with_parent("f2"),
                "budget review notes elsewhere",
            );
        let (coordinator, index) = setup(store, keyword());

        let summary = coordinator.start(Some("f1".to_string())).unwrap().wait().await.unwrap();
        assert_eq!(summary.total_files, 1);

        let hits = index.query(&[0.0, 0.0, 1.0], 10, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.document_id, "in");
        assert_eq!(hits[0].metadata.path, "/Inside");
    }

    #[tokio::test]
    async fn test_local_backend_ingests_text_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("team")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "budget review notes for the team").unwrap();
        std::fs::write(dir.path().join("team/plan.md"), "# Plan\n\nbudget plan for next year").unwrap();
        std::fs::write(dir.path().join("team/q3.csv"), "item,budget\nads,100\n").unwrap();

        let mut config = RagConfig::default();
        config.file_store.backend = FileStoreBackend::Local;
        let index = Arc::new(SqliteVectorIndex::in_memory().unwrap());
        let coordinator = Arc::new(
            IngestionCoordinator::new(
                &config,
                Arc::new(LocalFileStore::new(dir.path()).unwrap()),
                keyword(),
                index.clone(),
            )
            .unwrap(),
        );

        let summary = coordinator.start(None).unwrap().wait().await.unwrap();
        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.indexed_files, 3);

        let hits = index.query(&[0.0, 0.0, 1.0], 10, None).await.unwrap();
        let mut paths: Vec<&str> = hits.iter().map(|h| h.metadata.path.as_str()).collect();
        paths.sort();
        assert_eq!(paths, vec!["/notes.txt", "/team/plan.md", "/team/q3.csv"]);
    }
}
