//! Search and chat endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse, SearchRequest, SearchResult};

/// POST /api/search - Ranked chunks for a query
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResult>>> {
    tracing::info!("Search: \"{}\"", request.query);
    let results = state.search(&request).await?;
    Ok(Json(results))
}

/// POST /api/chat - Grounded answer with sources
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let response = state.chat(&request).await?;
    Ok(Json(response))
}
