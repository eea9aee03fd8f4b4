//! DELETE /images/{filename}
//!
//! Owner-or-admin only. The database rows (asset plus any short links
//! pointing at it) go first in one transaction, then the bytes; storage
//! deletion is idempotent, so a retry after a partial failure converges.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use snapbin_core::models::{AuditStatus, NewAuditRecord};
use snapbin_core::AppError;
use std::sync::Arc;

use crate::error::HttpAppError;
use crate::identity::RequestIdentity;
use crate::state::AppState;

pub async fn image_delete(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    identity: RequestIdentity,
    headers: HeaderMap,
) -> Result<StatusCode, HttpAppError> {
    let asset = state
        .assets
        .get_by_filename(&filename)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Image '{filename}'")))?;

    // A caller without rights gets the same 404 as a missing image, so the
    // endpoint does not confirm which filenames exist.
    if !identity.identity.can_modify(asset.owner.as_deref()) {
        return Err(AppError::NotFound(format!("Image '{filename}'")).into());
    }

    state.assets.delete_with_links(&filename).await?;
    state.storage.delete(&filename).await?;

    let entry = NewAuditRecord {
        original_filename: asset.original_filename,
        saved_filename: Some(asset.filename),
        status: AuditStatus::Deleted,
        size_kb: Some(asset.size_kb),
        error_message: None,
        identity: identity.identity.audit_label(),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    if let Err(e) = state.audits.record(&entry).await {
        tracing::error!(error = %e, "Failed to write audit record for deletion");
    }

    tracing::info!(filename = %filename, identity = %identity.identity.audit_label(), "Image deleted");
    Ok(StatusCode::NO_CONTENT)
}
