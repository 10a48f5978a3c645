//! Application state for the RAG server

use std::sync::Arc;

use crate::browse::DriveBrowser;
use crate::config::{FileStoreBackend, RagConfig};
use crate::error::{Error, Result};
use crate::generation::AnswerGenerator;
use crate::processing::{IngestionCoordinator, IngestionHandle};
use crate::providers::{
    EmbeddingProvider, FileStore, GoogleDriveStore, LlmProvider, LocalFileStore, OpenAiClient,
    VectorIndex,
};
use crate::retrieval::RetrievalEngine;
use crate::storage::SqliteVectorIndex;
use crate::types::{
    ChatRequest, ChatResponse, DriveFile, DriveFolder, IngestionRun, SearchRequest, SearchResult,
    StartAck,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    store: Arc<dyn FileStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    index: Arc<dyn VectorIndex>,
    coordinator: Arc<IngestionCoordinator>,
    retrieval: RetrievalEngine,
    generator: AnswerGenerator,
    browser: DriveBrowser,
}

impl AppState {
    /// Build providers from configuration
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!(
            "Initializing RAG application state (file store: {:?})...",
            config.file_store.backend
        );

        let store: Arc<dyn FileStore> = match config.file_store.backend {
            FileStoreBackend::Drive => Arc::new(GoogleDriveStore::new(&config.file_store)?),
            FileStoreBackend::Local => Arc::new(LocalFileStore::new(&config.file_store.local_root)?),
        };

        let openai = Arc::new(OpenAiClient::new(&config.llm, &config.embeddings)?);
        tracing::info!(
            "OpenAI-compatible client at {} (embeddings: {}, generation: {})",
            config.llm.base_url,
            config.embeddings.model,
            config.llm.generate_model
        );

        let index = Arc::new(SqliteVectorIndex::new(&config.vector_db.storage_path)?);
        tracing::info!("Vector index at {}", config.vector_db.storage_path.display());

        Self::from_parts(config, store, openai.clone(), openai, index)
    }

    /// Assemble state from already-built providers
    pub fn from_parts(
        config: RagConfig,
        store: Arc<dyn FileStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self> {
        config.validate()?;

        let coordinator = Arc::new(IngestionCoordinator::new(
            &config,
            Arc::clone(&store),
            Arc::clone(&embeddings),
            Arc::clone(&index),
        )?);
        let retrieval = RetrievalEngine::new(
            Arc::clone(&embeddings),
            Arc::clone(&index),
            config.retrieval.clone(),
        );
        let generator = AnswerGenerator::new(Arc::clone(&llm), &config.llm);
        let browser = DriveBrowser::new(Arc::clone(&store));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                embeddings,
                llm,
                index,
                coordinator,
                retrieval,
                generator,
                browser,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn file_store(&self) -> &Arc<dyn FileStore> {
        &self.inner.store
    }

    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embeddings
    }

    pub fn llm_provider(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    pub fn vector_index(&self) -> &Arc<dyn VectorIndex> {
        &self.inner.index
    }

    /// Start a background run and keep a handle on it
    pub fn spawn_ingestion(&self, scope: Option<String>) -> Result<IngestionHandle> {
        self.inner.coordinator.start(scope)
    }

    /// Start a background run; `Error::Conflict` when one is active
    pub fn start_ingestion(&self, scope: Option<String>) -> Result<StartAck> {
        let handle = self.spawn_ingestion(scope)?;
        Ok(StartAck {
            accepted: true,
            run_id: handle.run_id(),
            message: "Ingestion started".to_string(),
        })
    }

    /// Latest ingestion status
    pub fn ingestion_status(&self) -> IngestionRun {
        self.inner.coordinator.status()
    }

    /// Semantic search
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        self.inner.retrieval.search(request).await
    }

    /// Retrieve sources for the message and answer from them
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        if request.message.trim().is_empty() {
            return Err(Error::validation("message must not be empty"));
        }

        let search = SearchRequest {
            query: request.message.clone(),
            folder_id: request.folder_id.clone(),
            file_id: request.file_id.clone(),
            limit: Some(self.inner.config.retrieval.chat_top_k),
        };
        let sources = self.inner.retrieval.search(&search).await?;
        tracing::info!("Chat: {} sources for \"{}\"", sources.len(), request.message);

        Ok(self
            .inner
            .generator
            .answer(&request.message, sources, request.history())
            .await)
    }

    /// Files in the store with resolved paths
    pub async fn list_files(&self) -> Result<Vec<DriveFile>> {
        self.inner.browser.list_files().await
    }

    /// Folders in the store with direct file counts
    pub async fn list_folders(&self) -> Result<Vec<DriveFolder>> {
        self.inner.browser.list_folders().await
    }

    pub async fn get_folder(&self, id: &str) -> Result<DriveFolder> {
        self.inner.browser.get_folder(id).await
    }
}
