//! HTTP handlers, one file per route.

mod image_delete;
mod image_get;
mod image_watermark;
mod link_create;
mod short_link_get;
mod upload;

pub use image_delete::image_delete;
pub use image_get::image_get;
pub use image_watermark::image_watermark;
pub use link_create::link_create;
pub use short_link_get::short_link_get;
pub use upload::upload;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Serve raw image bytes with the right content type; `attachment_name`
/// switches the response to a download.
pub(crate) fn serve_bytes(
    bytes: Vec<u8>,
    mime_type: &str,
    attachment_name: Option<String>,
) -> Response {
    let mut response = (StatusCode::OK, bytes).into_response();

    let content_type = HeaderValue::from_str(mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);

    if let Some(name) = attachment_name {
        let sanitized: String = name
            .chars()
            .map(|c| if c == '"' || c.is_control() { '_' } else { c })
            .collect();
        if let Ok(value) =
            HeaderValue::from_str(&format!("attachment; filename=\"{sanitized}\""))
        {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
    }

    response
}
