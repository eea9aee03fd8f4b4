//! POST /links/{id}
//!
//! Issues a temporary short link for an existing asset, expiring after the
//! requested number of minutes (at most one week).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use snapbin_core::constants::MAX_TEMP_LINK_TTL_MINUTES;
use snapbin_core::AppError;
use std::sync::Arc;

use crate::error::HttpAppError;
use crate::identity::RequestIdentity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateLinkResponse {
    pub code: String,
    pub short_url: String,
    pub expire_at: DateTime<Utc>,
}

pub async fn link_create(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    identity: RequestIdentity,
    Json(body): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<CreateLinkResponse>), HttpAppError> {
    if !(1..=MAX_TEMP_LINK_TTL_MINUTES).contains(&body.minutes) {
        return Err(AppError::Validation(format!(
            "Expiry must be between 1 and {MAX_TEMP_LINK_TTL_MINUTES} minutes"
        ))
        .into());
    }

    let asset = state
        .assets
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset {id}")))?;

    let expire_at = Utc::now() + Duration::minutes(body.minutes);
    let link = state
        .issuer
        .issue(&asset.filename, identity.identity.owner(), Some(expire_at))
        .await?;

    tracing::info!(
        code = %link.code,
        asset_id = id,
        minutes = body.minutes,
        "Temporary link issued"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateLinkResponse {
            short_url: state.short_url(&link.code),
            code: link.code,
            expire_at,
        }),
    ))
}
