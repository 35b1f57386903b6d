#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Background Remover Client
//!
//! Upload an image to a remote background removal service, follow an estimated
//! progress indicator while it works, and save the transparent result.
//!
//! The background removal itself happens in the service; this crate is the
//! client side of the workflow:
//!
//! - **Selection**: image MIME type and size checks, before anything is sent
//! - **Submission**: one multipart POST per submission, with a cosmetic progress
//!   estimate that ticks while the request is outstanding
//! - **Download**: decoding the returned data URL and saving it as
//!   `background-removed-<epoch-millis>.png`
//! - **State**: an explicit [`ClientState`] driven by a pure transition function,
//!   usable and testable without any frontend
//! - **CLI Integration**: Optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bg_remover_client::{ClientConfig, RemovalClient};
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::builder()
//!     .endpoint("http://localhost:5000/api/remove-background")
//!     .build()?;
//! let mut client = RemovalClient::connect(config)?;
//!
//! client.select_path("portrait.jpg")?;
//! client.submit().await?;
//! let saved = client.download(Some(Path::new("out")))?;
//! println!("saved {}", saved.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Driving the state machine directly
//!
//! ```rust
//! use bg_remover_client::{Action, ClientState, FileCandidate, ProcessingState};
//!
//! let mut state = ClientState::default();
//! state.apply(Action::Select(FileCandidate::new("a.png", "image/png", vec![1, 2, 3])));
//! state.apply(Action::Submit);
//! assert_eq!(state.processing_state(), ProcessingState::Processing);
//!
//! state.apply(Action::Reset);
//! assert!(state.is_initial());
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): Command-line interface and progress bars
//! - `webp-support` (default): WebP dimension probing
//! - `tracing-json`, `tracing-files`: extra log outputs for the CLI

pub mod client;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod remote;
pub mod services;
pub mod state;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;

// Public API exports
pub use client::RemovalClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use download::ResultDownloader;
pub use error::{ClientError, Result, ValidationError};
pub use remote::{HttpRemovalService, MockRemovalService, MockResponse, RemovalService};
pub use services::{
    ConsoleProgressReporter, ImageIOService, NoOpProgressReporter, ProgressEstimate,
    ProgressPhase, ProgressReporter, ProgressUpdate,
};
pub use state::{Action, ClientState, Outcome};
pub use types::{ErrorMessage, FileCandidate, ProcessedResult, ProcessingState, SelectedFile};
pub use utils::{ConfigValidator, FileValidator};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat, TracingOutput};

/// Supported-formats hint shown next to the file picker, naming the active size limit
#[must_use]
pub fn supported_formats_hint(max_file_size: u64) -> String {
    format!(
        "Supports: JPG, PNG, JPEG, GIF, BMP, WEBP (up to {})",
        error::format_size_limit(max_file_size)
    )
}
