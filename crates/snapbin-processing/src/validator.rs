//! Upload validation: extension allow-list, size bounds, and sanitization of
//! the client-supplied name (stored for display only; never used as a path).

use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File size {size} bytes exceeds maximum of {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Unsupported file extension '{extension}'")]
    InvalidExtension { extension: String },

    #[error("Missing file extension: {0}")]
    MissingExtension(String),

    #[error("File is empty")]
    EmptyFile,
}

/// Lowercased extension of `filename`, without the dot.
pub fn normalized_extension(filename: &str) -> Result<String, ValidationError> {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Ok(ext.to_lowercase()),
        _ => Err(ValidationError::MissingExtension(filename.to_string())),
    }
}

/// Validate an upload attempt; returns the normalized extension on success.
/// Both the declared and the actual byte size must fit within `max_size`.
pub fn validate_upload(
    filename: &str,
    declared_size: Option<u64>,
    actual_size: u64,
    max_size: u64,
    allowed_extensions: &[String],
) -> Result<String, ValidationError> {
    if actual_size == 0 {
        return Err(ValidationError::EmptyFile);
    }

    let extension = normalized_extension(filename)?;
    if !allowed_extensions.iter().any(|e| e == &extension) {
        return Err(ValidationError::InvalidExtension { extension });
    }

    let effective = declared_size.unwrap_or(0).max(actual_size);
    if effective > max_size {
        return Err(ValidationError::FileTooLarge {
            size: effective,
            max: max_size,
        });
    }

    Ok(extension)
}

/// Sanitize the client-supplied filename before persisting it as display
/// metadata. Strips any path component and replaces unusual characters.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "file".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim_matches(['_', '.']).is_empty() {
        "file".to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["jpg".to_string(), "png".to_string()]
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(normalized_extension("Photo.JPG").unwrap(), "jpg");
    }

    #[test]
    fn missing_extension_rejected() {
        assert!(matches!(
            normalized_extension("noext"),
            Err(ValidationError::MissingExtension(_))
        ));
        assert!(matches!(
            normalized_extension(".bashrc"),
            Err(ValidationError::MissingExtension(_))
        ));
    }

    #[test]
    fn disallowed_extension_rejected() {
        let err = validate_upload("tool.exe", None, 100, 1000, &allowed()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidExtension {
                extension: "exe".to_string()
            }
        );
    }

    #[test]
    fn oversize_rejected_by_declared_or_actual() {
        // Declared larger than actual still rejects.
        let err = validate_upload("a.jpg", Some(2000), 100, 1000, &allowed()).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));

        let err = validate_upload("a.jpg", None, 2000, 1000, &allowed()).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
    }

    #[test]
    fn empty_file_rejected() {
        assert_eq!(
            validate_upload("a.jpg", None, 0, 1000, &allowed()),
            Err(ValidationError::EmptyFile)
        );
    }

    #[test]
    fn valid_upload_returns_extension() {
        assert_eq!(
            validate_upload("Photo.PNG", Some(500), 500, 1000, &allowed()).unwrap(),
            "png"
        );
    }

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_filename("???"), "file");
    }
}
