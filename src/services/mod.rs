//! Service layer
//!
//! Infrastructure concerns (file access, progress timing and reporting) kept
//! apart from the workflow state so each can be tested on its own.

pub mod io;
pub mod progress;

pub use io::{ImageIOService, PreviewFile};
#[cfg(feature = "cli")]
pub use progress::{create_cli_progress_reporter, BarProgressReporter};
pub use progress::{
    ConsoleProgressReporter, NoOpProgressReporter, ProgressEstimate, ProgressEstimator,
    ProgressPhase, ProgressReporter, ProgressUpdate,
};
