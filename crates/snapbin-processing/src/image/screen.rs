use anyhow::{Context, Result};
use image::GenericImageView;

/// Verdict of the offline content screen.
///
/// This is a coarse skin-tone-ratio heuristic, a basic filter rather than a
/// substitute for a real moderation service; the pipeline contract around it
/// (delete-on-unsafe) is what matters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScreenVerdict {
    Safe,
    Unsafe { skin_ratio: f64 },
}

impl ScreenVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, ScreenVerdict::Safe)
    }
}

/// Classify image content by skin-tone pixel ratio against `threshold`.
/// Grayscale images are always Safe.
pub fn screen(data: &[u8], threshold: f64) -> Result<ScreenVerdict> {
    let img = image::load_from_memory(data).context("Failed to decode image for screening")?;

    if !img.color().has_color() {
        return Ok(ScreenVerdict::Safe);
    }

    // Downscale for throughput; the ratio is scale-invariant enough.
    let (width, height) = img.dimensions();
    let thumb = if width > 100 {
        img.thumbnail(100, ((100 * height) / width).max(1))
    } else {
        img
    };

    let rgb = thumb.to_rgb8();
    let total = (rgb.width() * rgb.height()) as f64;
    let mut skin = 0u64;

    for pixel in rgb.pixels() {
        let [r, g, b] = pixel.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        if r > 95
            && g > 40
            && b > 20
            && max - min > 15
            && r.abs_diff(g) > 15
            && r > g
            && r > b
        {
            skin += 1;
        }
    }

    let skin_ratio = skin as f64 / total;
    if skin_ratio > threshold {
        tracing::warn!(skin_ratio, threshold, "Content screen flagged image as unsafe");
        Ok(ScreenVerdict::Unsafe { skin_ratio })
    } else {
        Ok(ScreenVerdict::Safe)
    }
}
