//! Ingestion endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{IngestionRun, StartAck};

/// Optional body for a start request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartIngestionRequest {
    /// Only ingest files under this folder
    #[serde(default)]
    pub folder_id: Option<String>,
}

/// POST /api/ingest/start - Start a background ingestion run
pub async fn start_ingestion(
    State(state): State<AppState>,
    body: Option<Json<StartIngestionRequest>>,
) -> Result<(StatusCode, Json<StartAck>)> {
    let scope = body.and_then(|Json(request)| request.folder_id);
    let ack = state.start_ingestion(scope)?;
    tracing::info!("Ingestion run {} accepted", ack.run_id);
    Ok((StatusCode::ACCEPTED, Json(ack)))
}

/// GET /api/ingest/status - Current or most recent run
pub async fn ingestion_status(State(state): State<AppState>) -> Json<IngestionRun> {
    Json(state.ingestion_status())
}
