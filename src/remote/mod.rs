//! Access to the external background removal service
//!
//! The service is opaque: it takes an image and answers with either a data URL of
//! the processed image or an error message. [`RemovalService`] is the seam the
//! client depends on; [`HttpRemovalService`] talks to the real endpoint and
//! [`MockRemovalService`] serves scripted answers.

pub mod http;
pub mod mock;

pub use http::HttpRemovalService;
pub use mock::{MockRemovalService, MockResponse};

use crate::error::{ClientError, Result, PROCESSING_FAILED_MESSAGE};
use crate::types::{ProcessedResult, SelectedFile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A service that removes the background from an image
#[async_trait]
pub trait RemovalService: Send + Sync {
    /// Submit one image and wait for the processed result
    ///
    /// Exactly one request is issued per call; no retry happens here.
    async fn remove_background(&self, file: &SelectedFile) -> Result<ProcessedResult>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// JSON body returned by the service
///
/// Success: `{"success": true, "image": "data:image/png;base64,..."}`.
/// Failure: `{"error": "reason"}` (usually with a non-2xx status).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalResponse {
    /// Whether processing succeeded
    #[serde(default)]
    pub success: bool,
    /// Processed image as a data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Human-readable failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RemovalResponse {
    /// Successful body carrying `image`
    pub fn success<S: Into<String>>(image: S) -> Self {
        Self {
            success: true,
            image: Some(image.into()),
            error: None,
        }
    }

    /// Failure body carrying `error`
    pub fn failure<S: Into<String>>(error: S) -> Self {
        Self {
            success: false,
            image: None,
            error: Some(error.into()),
        }
    }

    /// Interpret a body that arrived with a 2xx status
    ///
    /// # Errors
    /// - `success` is false: service error with the body's reason, or a default
    /// - `success` is true without an image: malformed response
    pub fn into_result(self) -> Result<ProcessedResult> {
        if !self.success {
            let message = self
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| PROCESSING_FAILED_MESSAGE.to_string());
            return Err(ClientError::service(None, message));
        }

        match self.image {
            Some(image) if !image.is_empty() => Ok(ProcessedResult::new(image)),
            _ => Err(ClientError::malformed("success response without an image")),
        }
    }
}
