use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageReader, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::io::Cursor;
use std::path::PathBuf;
use std::str::FromStr;

use super::normalize::encode;

/// Where the watermark text is anchored, with a fixed 20px margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatermarkAnchor {
    Center,
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl FromStr for WatermarkAnchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "center" => Ok(WatermarkAnchor::Center),
            "bottom-right" => Ok(WatermarkAnchor::BottomRight),
            "bottom-left" => Ok(WatermarkAnchor::BottomLeft),
            "top-right" => Ok(WatermarkAnchor::TopRight),
            "top-left" => Ok(WatermarkAnchor::TopLeft),
            other => Err(format!("Unknown watermark position: {other}")),
        }
    }
}

/// Text watermark parameters.
#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    pub text: String,
    pub anchor: WatermarkAnchor,
    pub opacity: f32,
}

impl WatermarkSpec {
    /// Opacity is clamped to the accepted 0.1..=1.0 range.
    pub fn new(text: impl Into<String>, anchor: WatermarkAnchor, opacity: f32) -> Self {
        Self {
            text: text.into(),
            anchor,
            opacity: opacity.clamp(0.1, 1.0),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WatermarkError {
    #[error("Failed to decode source image: {0}")]
    Decode(String),

    #[error("No usable watermark font found")]
    FontUnavailable,

    #[error("Failed to encode watermarked image: {0}")]
    Encode(String),
}

/// Load the first readable font from the configured fallback chain.
pub fn load_font(paths: &[PathBuf]) -> Result<FontVec, WatermarkError> {
    for path in paths {
        match std::fs::read(path) {
            Ok(bytes) => match FontVec::try_from_vec(bytes) {
                Ok(font) => {
                    tracing::debug!(path = %path.display(), "Watermark font loaded");
                    return Ok(font);
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Font file unusable");
                }
            },
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Font file unreadable");
            }
        }
    }
    Err(WatermarkError::FontUnavailable)
}

const MARGIN: i64 = 20;
const RECT_PADDING: i64 = 10;

fn anchor_origin(
    img_width: u32,
    img_height: u32,
    text_width: u32,
    text_height: u32,
    anchor: WatermarkAnchor,
) -> (i64, i64) {
    let (w, h) = (img_width as i64, img_height as i64);
    let (tw, th) = (text_width as i64, text_height as i64);
    let (x, y) = match anchor {
        WatermarkAnchor::Center => ((w - tw) / 2, (h - th) / 2),
        WatermarkAnchor::BottomRight => (w - tw - MARGIN, h - th - MARGIN),
        WatermarkAnchor::BottomLeft => (MARGIN, h - th - MARGIN),
        WatermarkAnchor::TopRight => (w - tw - MARGIN, MARGIN),
        WatermarkAnchor::TopLeft => (MARGIN, MARGIN),
    };
    (x.max(0), y.max(0))
}

/// Render a text watermark over the source bytes, preserving the source's
/// container format and color mode. The original bytes are never mutated.
pub fn apply_watermark(
    data: &[u8],
    spec: &WatermarkSpec,
    font: &FontVec,
) -> Result<Vec<u8>, WatermarkError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| WatermarkError::Decode(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| WatermarkError::Decode("Unrecognized image format".to_string()))?;
    let img = reader
        .decode()
        .map_err(|e| WatermarkError::Decode(e.to_string()))?;
    let original_color = img.color();

    // Very large sources are shrunk before compositing to bound memory.
    let img = if img.width() > 3000 || img.height() > 3000 {
        img.thumbnail(3000, 3000)
    } else {
        img
    };
    let (width, height) = img.dimensions();

    let scale = PxScale::from((width.min(height) as f32 / 20.0).max(8.0));
    let (text_width, text_height) = text_size(scale, font, &spec.text);
    let (x, y) = anchor_origin(width, height, text_width, text_height, spec.anchor);

    // Text and a translucent backing rectangle go on a transparent layer
    // which is then alpha-composited over the source.
    let mut layer = RgbaImage::new(width, height);
    let rect_x = (x - RECT_PADDING).max(0);
    let rect_y = (y - RECT_PADDING).max(0);
    let rect_w = ((text_width as i64 + 2 * RECT_PADDING).min(width as i64 - rect_x)).max(1) as u32;
    let rect_h =
        ((text_height as i64 + 2 * RECT_PADDING).min(height as i64 - rect_y)).max(1) as u32;
    draw_filled_rect_mut(
        &mut layer,
        Rect::at(rect_x as i32, rect_y as i32).of_size(rect_w, rect_h),
        Rgba([0, 0, 0, (128.0 * spec.opacity) as u8]),
    );
    draw_text_mut(
        &mut layer,
        Rgba([255, 255, 255, (255.0 * spec.opacity) as u8]),
        x as i32,
        y as i32,
        scale,
        font,
        &spec.text,
    );

    let mut canvas = img.to_rgba8();
    image::imageops::overlay(&mut canvas, &layer, 0, 0);

    let composed = restore_color(DynamicImage::ImageRgba8(canvas), original_color.into());
    encode(&composed, format).map_err(|e| WatermarkError::Encode(e.to_string()))
}

/// Convert the composited RGBA result back to the source's color mode.
fn restore_color(img: DynamicImage, original: ExtendedColorType) -> DynamicImage {
    match original {
        ExtendedColorType::L8 => DynamicImage::ImageLuma8(img.to_luma8()),
        ExtendedColorType::La8 => DynamicImage::ImageLumaA8(img.to_luma_alpha8()),
        ExtendedColorType::Rgb8 => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img,
    }
}
