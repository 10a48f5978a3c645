//! Drive browsing endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{DriveFile, DriveFolder};

/// GET /api/drive/files - Files with resolved paths
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<DriveFile>>> {
    let files = state.list_files().await?;
    Ok(Json(files))
}

/// GET /api/drive/folders - Folders with file counts
pub async fn list_folders(State(state): State<AppState>) -> Result<Json<Vec<DriveFolder>>> {
    let folders = state.list_folders().await?;
    Ok(Json(folders))
}

/// GET /api/drive/folders/:id - One folder; 400 when the id is not a folder
pub async fn get_folder(
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
) -> Result<Json<DriveFolder>> {
    let folder = state.get_folder(&folder_id).await?;
    Ok(Json(folder))
}
