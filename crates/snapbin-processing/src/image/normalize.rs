use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

use super::select_filter;

/// Result of size normalization.
#[derive(Debug)]
pub struct NormalizeOutcome {
    /// Re-encoded bytes when a downscale happened; `None` when the image was
    /// already within bounds and the stored bytes stand untouched.
    pub data: Option<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

/// Compute the normalized dimensions: clamp both axes to `max_dimension`,
/// then cap the long edge at `max_long_edge`, preserving aspect ratio.
/// Never upscales.
fn target_dimensions(
    width: u32,
    height: u32,
    max_long_edge: u32,
    max_dimension: u32,
) -> (u32, u32) {
    let (mut w, mut h) = (width as f64, height as f64);

    if w > max_dimension as f64 || h > max_dimension as f64 {
        let scale = (max_dimension as f64 / w).min(max_dimension as f64 / h);
        w *= scale;
        h *= scale;
    }

    let long_edge = w.max(h);
    if long_edge > max_long_edge as f64 {
        let scale = max_long_edge as f64 / long_edge;
        w *= scale;
        h *= scale;
    }

    ((w.round() as u32).max(1), (h.round() as u32).max(1))
}

/// Downscale an image to fit the configured bounds, re-encoding in its source
/// format. No-op (data `None`) when already within bounds.
pub fn normalize(
    data: &[u8],
    extension: &str,
    max_long_edge: u32,
    max_dimension: u32,
) -> Result<NormalizeOutcome> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("Failed to probe image format")?;
    let format = reader
        .format()
        .or_else(|| ImageFormat::from_extension(extension))
        .context("Unrecognized image format")?;
    let img = reader.decode().context("Failed to decode image")?;

    let (orig_width, orig_height) = img.dimensions();
    let (width, height) = target_dimensions(orig_width, orig_height, max_long_edge, max_dimension);

    if (width, height) == (orig_width, orig_height) {
        return Ok(NormalizeOutcome {
            data: None,
            width: orig_width,
            height: orig_height,
        });
    }

    let filter = select_filter(orig_width, orig_height, width, height);
    let resized = img.resize_exact(width, height, filter);
    let encoded = encode(&resized, format)?;

    tracing::info!(
        from = format!("{orig_width}x{orig_height}"),
        to = format!("{width}x{height}"),
        "Image normalized"
    );

    Ok(NormalizeOutcome {
        data: Some(encoded),
        width,
        height,
    })
}

/// Encode in the given container format. JPEG goes through the quality-90
/// encoder and drops any alpha channel first (JPEG cannot carry one).
pub(crate) fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    if format == ImageFormat::Jpeg {
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let encoder = JpegEncoder::new_with_quality(&mut buf, 90);
        rgb.write_with_encoder(encoder)
            .context("JPEG encoding failed")?;
    } else {
        img.write_to(&mut buf, format)
            .with_context(|| format!("Encoding to {format:?} failed"))?;
    }
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 20, 30])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn within_bounds_is_a_no_op() {
        let data = png_bytes(800, 600);
        let outcome = normalize(&data, "png", 1920, 5000).unwrap();
        assert!(outcome.data.is_none());
        assert_eq!((outcome.width, outcome.height), (800, 600));
    }

    #[test]
    fn long_edge_is_capped_preserving_aspect() {
        let data = png_bytes(4000, 2000);
        let outcome = normalize(&data, "png", 1920, 5000).unwrap();
        assert_eq!((outcome.width, outcome.height), (1920, 960));
        assert!(outcome.data.is_some());
    }

    #[test]
    fn never_upscales() {
        assert_eq!(target_dimensions(100, 50, 1920, 5000), (100, 50));
    }

    #[test]
    fn dimension_clamp_applies_before_long_edge_cap() {
        // 6000x3000: clamp to 5000x2500, then cap long edge to 1920x960.
        assert_eq!(target_dimensions(6000, 3000, 1920, 5000), (1920, 960));
        // With a generous long edge, only the dimension clamp acts.
        assert_eq!(target_dimensions(6000, 3000, 10_000, 5000), (5000, 2500));
    }

    #[test]
    fn reencoded_bytes_decode_to_new_dimensions() {
        let data = png_bytes(3000, 1500);
        let outcome = normalize(&data, "png", 1500, 5000).unwrap();
        let resized = image::load_from_memory(&outcome.data.unwrap()).unwrap();
        assert_eq!(resized.dimensions(), (1500, 750));
    }

    #[test]
    fn garbage_bytes_fail() {
        assert!(normalize(b"not an image", "jpg", 1920, 5000).is_err());
    }
}
