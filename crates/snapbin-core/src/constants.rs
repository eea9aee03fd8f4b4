//! Application-wide constants.

/// File extensions accepted by upload validation (lowercase, no dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "tif", "svg", "ico", "heic", "heif",
    "avif", "jfif", "pjpeg", "pjp",
];

/// Length of generated short-link codes.
pub const SHORT_CODE_LENGTH: usize = 6;

/// Alphabet that short-link codes are drawn from. 62^6 possible codes keeps
/// the collision probability negligible against the expected record count.
pub const SHORT_CODE_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Upper bound on the TTL of an on-demand temporary link (7 days).
pub const MAX_TEMP_LINK_TTL_MINUTES: i64 = 7 * 24 * 60;

/// Maximum regenerate-and-retry attempts when a generated short code collides.
pub const MAX_CODE_ATTEMPTS: u32 = 16;

/// Map a normalized file extension to its MIME type.
pub fn mime_type_for_extension(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" | "jfif" | "pjpeg" | "pjp" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_aliases_share_a_mime_type() {
        for ext in ["jpg", "jpeg", "jfif", "pjpeg", "pjp"] {
            assert_eq!(mime_type_for_extension(ext), "image/jpeg");
        }
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(mime_type_for_extension("exe"), "application/octet-stream");
    }

    #[test]
    fn alphabet_matches_code_space_claim() {
        assert_eq!(SHORT_CODE_ALPHABET.len(), 62);
        assert_eq!(SHORT_CODE_LENGTH, 6);
    }
}
