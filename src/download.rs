//! Saving processed results to local files
//!
//! The data URL is decoded into bytes and written to
//! `background-removed-<epoch-millis>.png`. Writes go through a temporary file
//! in the target directory that is persisted under its final name, so a
//! partially written result is never visible and the temporary handle is
//! released as soon as the save completes.

use crate::error::{ClientError, Result};
use crate::types::ProcessedResult;
use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name prefix of saved results
pub const RESULT_FILE_PREFIX: &str = "background-removed-";

/// Attempts at finding a free file name when timestamps collide
const MAX_NAME_ATTEMPTS: i64 = 16;

/// Saves processed results to disk
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultDownloader;

impl ResultDownloader {
    /// File name for a result saved at `epoch_millis`
    #[must_use]
    pub fn file_name_for(epoch_millis: i64) -> String {
        format!("{}{}.png", RESULT_FILE_PREFIX, epoch_millis)
    }

    /// Save `result` into `dir` using the current time in the file name
    ///
    /// # Errors
    /// - The data URL cannot be decoded
    /// - The directory cannot be created or written
    pub fn save(result: &ProcessedResult, dir: &Path) -> Result<PathBuf> {
        Self::save_at(result, dir, Utc::now().timestamp_millis())
    }

    /// Save `result` into `dir` with an explicit timestamp
    ///
    /// An existing file is never overwritten: on a name collision the timestamp
    /// is bumped by one millisecond.
    ///
    /// # Errors
    /// - The data URL cannot be decoded
    /// - The directory cannot be created or written
    /// - No free file name was found
    pub fn save_at(result: &ProcessedResult, dir: &Path, epoch_millis: i64) -> Result<PathBuf> {
        let bytes = result.decode()?;

        match result.media_type() {
            Some("image/png") => {},
            other => warn!(
                media_type = other.unwrap_or("unknown"),
                "Saving non-PNG result under a .png name"
            ),
        }

        fs::create_dir_all(dir)
            .map_err(|e| ClientError::file_io_error("create download directory", dir, &e))?;

        let mut staged = tempfile::Builder::new()
            .prefix(".bg-remover-")
            .tempfile_in(dir)
            .map_err(|e| ClientError::file_io_error("create temporary file in", dir, &e))?;
        let staged_path = staged.path().to_path_buf();
        staged
            .write_all(&bytes)
            .and_then(|()| staged.flush())
            .map_err(|e| ClientError::file_io_error("write result to", &staged_path, &e))?;

        for offset in 0..MAX_NAME_ATTEMPTS {
            let target = dir.join(Self::file_name_for(epoch_millis + offset));
            match staged.persist_noclobber(&target) {
                Ok(_) => {
                    info!(path = %target.display(), bytes = bytes.len(), "Saved processed image");
                    return Ok(target);
                },
                Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    staged = e.file;
                },
                Err(e) => {
                    return Err(ClientError::file_io_error("save result to", &target, &e.error));
                },
            }
        }

        Err(ClientError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!(
                "No free file name for timestamp {} in '{}'",
                epoch_millis,
                dir.display()
            ),
        )))
    }
}
