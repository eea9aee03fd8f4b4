//! POST /upload

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use snapbin_core::AppError;
use std::sync::Arc;

use crate::error::HttpAppError;
use crate::identity::RequestIdentity;
use crate::services::upload::UploadRequest;
use crate::state::AppState;

pub async fn upload(
    State(state): State<Arc<AppState>>,
    identity: RequestIdentity,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let declared_size = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let original_filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation("File field has no filename".to_string()))?;
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file field: {e}")))?;
            file = Some((original_filename, data.to_vec()));
        }
    }

    let (original_filename, data) =
        file.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;

    let outcome = state
        .pipeline
        .run(UploadRequest {
            original_filename,
            declared_size,
            data,
            identity: identity.identity,
            client_key: identity.client_key,
            user_agent,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}
