//! GET /images/{filename}

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use snapbin_core::AppError;
use std::sync::Arc;

use super::serve_bytes;
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GetParams {
    #[serde(default)]
    pub download: bool,
}

pub async fn image_get(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    Query(params): Query<GetParams>,
) -> Result<Response, HttpAppError> {
    let asset = state
        .assets
        .get_by_filename(&filename)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Image '{filename}'")))?;

    let bytes = state.storage.read(&filename).await?;

    let attachment = params.download.then(|| asset.original_filename.clone());
    Ok(serve_bytes(bytes, &asset.mime_type, attachment))
}
