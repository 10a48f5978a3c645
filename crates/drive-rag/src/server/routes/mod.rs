//! API routes for the RAG server

pub mod drive;
pub mod ingest;
pub mod search;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ingest/start", post(ingest::start_ingestion))
        .route("/ingest/status", get(ingest::ingestion_status))
        .route("/search", post(search::search))
        .route("/chat", post(search::chat))
        .route("/drive/files", get(drive::list_files))
        .route("/drive/folders", get(drive::list_folders))
        .route("/drive/folders/:id", get(drive::get_folder))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let indexed_chunks = match state.vector_index().len().await {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!("Could not count index entries: {}", e);
            None
        }
    };

    let status = state.ingestion_status();

    Json(serde_json::json!({
        "name": "drive-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Semantic search and cited answers over Drive documents",
        "providers": {
            "fileStore": state.file_store().name(),
            "embeddings": state.embedding_provider().name(),
            "llm": state.llm_provider().name(),
            "model": state.llm_provider().model(),
            "vectorIndex": state.vector_index().name(),
        },
        "indexedChunks": indexed_chunks,
        "ingestion": {
            "isIngesting": status.is_ingesting,
            "percentComplete": status.percent_complete(),
        },
        "endpoints": {
            "POST /api/ingest/start": "Start a background ingestion run",
            "GET /api/ingest/status": "Ingestion progress",
            "POST /api/search": "Semantic search with highlights",
            "POST /api/chat": "Answer a question with cited sources",
            "GET /api/drive/files": "Files with their paths",
            "GET /api/drive/folders": "Folders with file counts",
            "GET /api/drive/folders/:id": "One folder with its file count",
            "GET /api/info": "This document"
        }
    }))
}
