//! Selection validation for candidate input images

use crate::error::ValidationError;
use crate::types::{FileCandidate, SelectedFile};

/// Validator for user-selected image files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileValidator {
    max_file_size: u64,
}

impl FileValidator {
    /// Create a validator with the given size limit in bytes
    #[must_use]
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Configured size limit in bytes
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Check a candidate against the MIME and size constraints
    ///
    /// The size limit applies regardless of MIME type and is checked first, so an
    /// oversized non-image is reported as oversized.
    ///
    /// # Errors
    /// - `ValidationError::TooLarge` when the file exceeds the limit
    /// - `ValidationError::NotAnImage` when the MIME type is not `image/*`
    pub fn validate(&self, candidate: FileCandidate) -> Result<SelectedFile, ValidationError> {
        if candidate.size() > self.max_file_size {
            return Err(ValidationError::TooLarge {
                size: candidate.size(),
                max: self.max_file_size,
            });
        }

        if !Self::is_image_mime(&candidate.mime) {
            return Err(ValidationError::NotAnImage {
                mime: candidate.mime,
            });
        }

        Ok(SelectedFile::from_candidate(candidate))
    }

    /// Whether a MIME type names an image (`image/<subtype>`)
    #[must_use]
    pub fn is_image_mime(mime: &str) -> bool {
        mime.trim()
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
            && mime.trim().len() > 6
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_FILE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    fn candidate(mime: &str, size: u64) -> FileCandidate {
        FileCandidate::new("input", mime, vec![0u8; size as usize])
    }

    #[test]
    fn test_accepts_images_up_to_limit() {
        let validator = FileValidator::default();
        for mime in ["image/png", "image/jpeg", "image/gif", "image/webp", "IMAGE/BMP"] {
            let selected = validator.validate(candidate(mime, 1024)).unwrap();
            assert_eq!(selected.mime(), mime);
        }

        // Exactly at the limit is accepted
        assert!(validator.validate(candidate("image/png", 10 * MB)).is_ok());
    }

    #[test]
    fn test_rejects_non_images() {
        let validator = FileValidator::default();
        for mime in ["text/plain", "application/pdf", "", "image/", "video/mp4", "imagex/png"] {
            let err = validator.validate(candidate(mime, 16)).unwrap_err();
            assert!(matches!(err, ValidationError::NotAnImage { .. }), "{mime}");
        }
    }

    #[test]
    fn test_rejects_oversized_regardless_of_mime() {
        let validator = FileValidator::default();
        for mime in ["image/png", "text/plain", ""] {
            let err = validator.validate(candidate(mime, 10 * MB + 1)).unwrap_err();
            assert_eq!(
                err,
                ValidationError::TooLarge {
                    size: 10 * MB + 1,
                    max: 10 * MB
                }
            );
            assert!(err.to_string().contains("10MB"));
        }
    }

    #[test]
    fn test_too_large_names_fractional_limits() {
        let half_mb = FileValidator::new(512 * 1024);
        let err = half_mb.validate(candidate("image/png", 600 * 1024)).unwrap_err();
        assert_eq!(err.to_string(), "File is too large. Maximum size is 512KB");

        let one_and_a_half = FileValidator::new(MB + MB / 2);
        let err = one_and_a_half
            .validate(candidate("image/png", 2 * MB))
            .unwrap_err();
        assert_eq!(err.to_string(), "File is too large. Maximum size is 1.5MB");
    }
}
