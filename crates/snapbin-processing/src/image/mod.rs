//! Image transforms: size normalization, content screening, text watermarks.

mod normalize;
mod screen;
mod watermark;

pub use normalize::{normalize, NormalizeOutcome};
pub use screen::{screen, ScreenVerdict};
pub use watermark::{load_font, WatermarkAnchor, WatermarkError, WatermarkSpec};

pub use watermark::apply_watermark;

/// Select a resampling filter based on how aggressive the downscale is.
/// Cheaper filters for large ratios, Lanczos for near-1:1 work.
pub(crate) fn select_filter(
    orig_width: u32,
    orig_height: u32,
    new_width: u32,
    new_height: u32,
) -> ::image::imageops::FilterType {
    let width_ratio = orig_width as f32 / new_width as f32;
    let height_ratio = orig_height as f32 / new_height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        ::image::imageops::FilterType::Triangle
    } else if max_ratio > 1.5 {
        ::image::imageops::FilterType::CatmullRom
    } else {
        ::image::imageops::FilterType::Lanczos3
    }
}
