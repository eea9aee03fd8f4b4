//! GET /images/{filename}/watermark
//!
//! Renders a text watermark over the stored image on the fly; the stored
//! bytes are never modified. An undecodable source is a hard error, while
//! failures after decode (no usable font, encode trouble) degrade to the
//! unmodified image.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use snapbin_core::AppError;
use snapbin_processing::image::{apply_watermark, WatermarkAnchor, WatermarkError, WatermarkSpec};
use std::sync::Arc;

use super::serve_bytes;
use crate::error::HttpAppError;
use crate::state::AppState;

const DEFAULT_OPACITY: f32 = 0.5;

#[derive(Debug, Deserialize)]
pub struct WatermarkParams {
    pub text: String,
    pub position: Option<String>,
    pub opacity: Option<f32>,
    #[serde(default)]
    pub download: bool,
}

pub async fn image_watermark(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    Query(params): Query<WatermarkParams>,
) -> Result<Response, HttpAppError> {
    if params.text.trim().is_empty() {
        return Err(AppError::Validation("Watermark text must not be empty".to_string()).into());
    }
    let anchor = match &params.position {
        Some(raw) => raw
            .parse::<WatermarkAnchor>()
            .map_err(AppError::Validation)?,
        None => WatermarkAnchor::default(),
    };
    let spec = WatermarkSpec::new(
        params.text.trim(),
        anchor,
        params.opacity.unwrap_or(DEFAULT_OPACITY),
    );

    let asset = state
        .assets
        .get_by_filename(&filename)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Image '{filename}'")))?;
    let bytes = state.storage.read(&filename).await?;

    let attachment = params.download.then(|| asset.original_filename.clone());

    let Some(font) = state.watermark_font.clone() else {
        tracing::warn!(filename = %filename, "No watermark font available, serving unmodified image");
        return Ok(serve_bytes(bytes, &asset.mime_type, attachment));
    };

    let source = bytes.clone();
    let rendered = state
        .governor
        .run_cpu(move || apply_watermark(&source, &spec, &font))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    match rendered {
        Ok(watermarked) => Ok(serve_bytes(watermarked, &asset.mime_type, attachment)),
        Err(e @ WatermarkError::Decode(_)) => Err(AppError::Transform(e.to_string()).into()),
        Err(e) => {
            tracing::warn!(filename = %filename, error = %e, "Watermarking degraded to source image");
            Ok(serve_bytes(bytes, &asset.mime_type, attachment))
        }
    }
}
