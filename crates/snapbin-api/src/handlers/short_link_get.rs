//! GET /s/{code}
//!
//! Serves the linked image's bytes directly. The access counter bump is
//! best effort and decoupled from serving.

use axum::extract::{Path, State};
use axum::response::Response;
use chrono::Utc;
use snapbin_core::AppError;
use std::sync::Arc;

use super::serve_bytes;
use crate::error::HttpAppError;
use crate::state::AppState;

pub async fn short_link_get(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Response, HttpAppError> {
    let link = state.issuer.resolve(&code, Utc::now()).await?;

    let asset = state
        .assets
        .get_by_filename(&link.target_file)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Short link '{code}' target")))?;
    let bytes = state.storage.read(&asset.filename).await?;

    state.issuer.record_access(&code).await;

    Ok(serve_bytes(bytes, &asset.mime_type, None))
}
