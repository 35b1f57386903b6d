//! Mock removal service for testing and demos

use super::{RemovalResponse, RemovalService};
use crate::error::{ClientError, Result, GENERIC_FAILURE_MESSAGE};
use crate::types::{ProcessedResult, SelectedFile};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted answer
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// HTTP status plus JSON body, interpreted like the real service
    Http {
        /// Status code
        status: u16,
        /// Response body
        body: RemovalResponse,
    },
    /// The request never reached the service
    NetworkFailure,
    /// The body could not be parsed
    Malformed,
}

impl MockResponse {
    /// 200 with a processed image
    pub fn success<S: Into<String>>(image: S) -> Self {
        Self::Http {
            status: 200,
            body: RemovalResponse::success(image),
        }
    }

    /// Non-2xx with an error body
    pub fn error<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Http {
            status,
            body: RemovalResponse::failure(message),
        }
    }

    fn into_result(self) -> Result<ProcessedResult> {
        match self {
            Self::Http { status, body } if (200..300).contains(&status) => body.into_result(),
            Self::Http { status, body } => Err(ClientError::service(
                Some(status),
                body.error
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            )),
            Self::NetworkFailure => Err(ClientError::network("connection refused")),
            Self::Malformed => Err(ClientError::malformed("expected value at line 1 column 1")),
        }
    }
}

/// Removal service answering from a script
///
/// Answers are consumed in order; when the script runs out the last answer
/// repeats. Each call can be delayed to simulate server latency.
#[derive(Debug)]
pub struct MockRemovalService {
    script: Mutex<VecDeque<MockResponse>>,
    last: Mutex<Option<MockResponse>>,
    latency: Duration,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockRemovalService {
    /// Create a service that answers with `responses` in order
    #[must_use]
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            last: Mutex::new(None),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Service that always succeeds with a tiny transparent PNG
    #[must_use]
    pub fn always_succeeding() -> Self {
        Self::new(vec![MockResponse::success(TRANSPARENT_PIXEL_PNG)])
    }

    /// Delay every answer by `latency`
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of requests received
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Names of the files received, in order
    #[must_use]
    pub fn received_files(&self) -> Vec<String> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    fn next_response(&self) -> MockResponse {
        let next = self.script.lock().ok().and_then(|mut script| script.pop_front());
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match next {
            Some(response) => {
                *last = Some(response.clone());
                response
            },
            None => last.clone().unwrap_or(MockResponse::NetworkFailure),
        }
    }
}

#[async_trait]
impl RemovalService for MockRemovalService {
    async fn remove_background(&self, file: &SelectedFile) -> Result<ProcessedResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(file.name().to_string());
        }
        let response = self.next_response();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        response.into_result()
    }

    fn describe(&self) -> String {
        "mock removal service".to_string()
    }
}

/// 1x1 fully transparent PNG as a data URL
pub const TRANSPARENT_PIXEL_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAAC0lEQVR42mNgAAIAAAUAAen63NgAAAAASUVORK5CYII=";
