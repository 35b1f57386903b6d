//! Core types for the upload/process/download workflow

use crate::error::{ClientError, Result};
use base64::Engine;
use std::fmt;
use std::sync::Arc;

/// An image file offered by the user, not yet validated
///
/// This is what a file picker or a drop event hands over. Only
/// [`crate::utils::FileValidator`] turns it into a [`SelectedFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Display name (usually the file name)
    pub name: String,
    /// Declared MIME type, empty when unknown
    pub mime: String,
    /// Raw file content
    pub bytes: Vec<u8>,
}

impl FileCandidate {
    /// Create a new candidate
    pub fn new<N: Into<String>, M: Into<String>>(name: N, mime: M, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Size of the content in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A validated input image held by the client
///
/// Content is shared so a submission can carry it while the state keeps it for retry.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    mime: String,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub(crate) fn from_candidate(candidate: FileCandidate) -> Self {
        Self {
            name: candidate.name,
            mime: candidate.mime,
            bytes: candidate.bytes.into(),
        }
    }

    /// File name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type, always `image/*`
    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// File content
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Current stage of the workflow
///
/// A failed attempt folds back into `Selected` with the file retained, so there is
/// no separate failed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingState {
    /// Nothing selected
    #[default]
    Idle,
    /// A valid file is held and can be submitted
    Selected,
    /// A request is outstanding
    Processing,
    /// The processed image is available
    Completed,
}

impl ProcessingState {
    /// Get a human-readable description of the state
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingState::Idle => "Waiting for an image",
            ProcessingState::Selected => "Ready to remove background",
            ProcessingState::Processing => "Removing background",
            ProcessingState::Completed => "Background removed",
        }
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Selected => write!(f, "selected"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Processed image returned by the service, as a data URL
///
/// e.g. `data:image/png;base64,iVBORw0KGgo...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedResult {
    data_url: String,
}

impl ProcessedResult {
    /// Wrap a data URL returned by the service
    pub fn new<S: Into<String>>(data_url: S) -> Self {
        Self {
            data_url: data_url.into(),
        }
    }

    /// The data URL as received
    #[must_use]
    pub fn as_data_url(&self) -> &str {
        &self.data_url
    }

    /// Media type declared in the data URL header, if any
    #[must_use]
    pub fn media_type(&self) -> Option<&str> {
        let header = self.data_url.strip_prefix("data:")?.split_once(',')?.0;
        let media = header.split(';').next().unwrap_or_default();
        (!media.is_empty()).then_some(media)
    }

    /// Decode the payload into raw bytes
    ///
    /// # Errors
    /// - Not a `data:` URL or missing the `,` separator
    /// - Payload is not base64 encoded
    /// - Invalid base64 content
    pub fn decode(&self) -> Result<Vec<u8>> {
        let rest = self
            .data_url
            .strip_prefix("data:")
            .ok_or_else(|| ClientError::decode("processed image is not a data URL"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ClientError::decode("data URL has no payload separator"))?;

        if !header.split(';').any(|param| param == "base64") {
            return Err(ClientError::decode("data URL payload is not base64 encoded"));
        }

        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| ClientError::decode(format!("invalid base64 payload: {}", e)))
    }
}

/// Last user-visible failure description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage(String);

impl ErrorMessage {
    /// Create a new message
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self(text.into())
    }

    /// Message text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ClientError> for ErrorMessage {
    fn from(error: &ClientError) -> Self {
        Self(error.user_message())
    }
}
