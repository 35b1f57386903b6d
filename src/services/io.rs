//! Image I/O operations service
//!
//! Reading candidate files from disk, probing image dimensions for the
//! before/after panels, and scoped preview files.

use crate::error::{ClientError, Result};
use crate::types::FileCandidate;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// MIME type used when neither extension nor content identifies the file
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Extensions accepted by the file picker filter, in display order
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "png", "jpeg", "gif", "bmp", "webp"];

/// Service for handling input file operations
pub struct ImageIOService;

impl ImageIOService {
    /// Read a file from disk as an unvalidated candidate
    ///
    /// The MIME type is taken from the extension first, like a browser file
    /// picker, then from the content when the extension is not an image type.
    ///
    /// # Errors
    /// - The file does not exist or cannot be read
    ///
    /// # Examples
    /// ```rust,no_run
    /// use bg_remover_client::services::ImageIOService;
    ///
    /// let candidate = ImageIOService::load_candidate("portrait.jpg")?;
    /// println!("{} ({})", candidate.name, candidate.mime);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_candidate<P: AsRef<Path>>(path: P) -> Result<FileCandidate> {
        let path_ref = path.as_ref();

        if !path_ref.is_file() {
            return Err(ClientError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        let bytes = std::fs::read(path_ref)
            .map_err(|e| ClientError::file_io_error("read image file", path_ref, &e))?;
        let mime = Self::detect_mime(path_ref, &bytes);
        let name = path_ref
            .file_name()
            .map_or_else(|| path_ref.display().to_string(), |n| n.to_string_lossy().into_owned());

        tracing::debug!(file = %name, mime = %mime, size = bytes.len(), "Loaded candidate");
        Ok(FileCandidate::new(name, mime, bytes))
    }

    /// Determine the MIME type of a file
    #[must_use]
    pub fn detect_mime(path: &Path, bytes: &[u8]) -> String {
        if let Ok(format) = ImageFormat::from_path(path) {
            return format.to_mime_type().to_string();
        }

        match image::guess_format(bytes) {
            Ok(format) => format.to_mime_type().to_string(),
            Err(_) => UNKNOWN_MIME.to_string(),
        }
    }

    /// Whether a path has an extension accepted by the picker filter
    #[must_use]
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|supported| supported.eq_ignore_ascii_case(ext))
            })
    }

    /// Read image dimensions from encoded bytes without a full decode
    ///
    /// Returns `None` when the content is not a decodable image.
    #[must_use]
    pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()
    }

    /// Write bytes to a temporary preview file
    ///
    /// The file is removed when the returned handle is dropped.
    ///
    /// # Errors
    /// - The temporary file cannot be created or written
    pub fn write_preview(bytes: &[u8], extension: &str) -> Result<PreviewFile> {
        let mut file = tempfile::Builder::new()
            .prefix("bg-remover-preview-")
            .suffix(&format!(".{}", extension))
            .tempfile()?;
        std::io::Write::write_all(&mut file, bytes)?;
        Ok(PreviewFile {
            path: file.into_temp_path(),
        })
    }
}

/// A preview image on disk, owned by whatever view displays it
///
/// Dropping the handle deletes the file.
#[derive(Debug)]
pub struct PreviewFile {
    path: TempPath,
}

impl PreviewFile {
    /// Location of the preview
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the preview now, reporting deletion failures
    ///
    /// # Errors
    /// - The file could not be removed
    pub fn release(self) -> Result<()> {
        let display: PathBuf = self.path.to_path_buf();
        self.path
            .close()
            .map_err(|e| ClientError::file_io_error("remove preview", display, &e))
    }
}
