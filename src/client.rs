//! Upload/process/download controller
//!
//! [`RemovalClient`] owns the session state and is the only thing that talks to
//! the removal service. All state changes still go through
//! [`ClientState::apply`]; the controller adds the effects: issuing the request,
//! running the progress timer while it is outstanding, and saving results.

use crate::config::ClientConfig;
use crate::download::ResultDownloader;
use crate::error::{ClientError, Result};
use crate::remote::{HttpRemovalService, RemovalService};
use crate::services::io::ImageIOService;
use crate::services::progress::{
    NoOpProgressReporter, ProgressEstimator, ProgressReporter, ProgressUpdate,
};
use crate::state::{Action, ClientState, Outcome};
use crate::types::{ErrorMessage, FileCandidate, ProcessedResult, SelectedFile};
use crate::utils::FileValidator;
use instant::Instant;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Controller for one upload/process/download session
pub struct RemovalClient<S> {
    config: ClientConfig,
    service: S,
    state: ClientState,
    reporter: Box<dyn ProgressReporter>,
    seed: Option<u64>,
}

impl RemovalClient<HttpRemovalService> {
    /// Create a client talking to the configured HTTP endpoint
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Failed to create HTTP client
    pub fn connect(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let service = HttpRemovalService::new(&config)?;
        Ok(Self::new(config, service))
    }
}

impl<S: RemovalService> RemovalClient<S> {
    /// Create a client using `service`
    pub fn new(config: ClientConfig, service: S) -> Self {
        let state = ClientState::new(
            FileValidator::new(config.max_file_size),
            config.progress_cap,
        );
        Self {
            config,
            service,
            state,
            reporter: Box::new(NoOpProgressReporter),
            seed: None,
        }
    }

    /// Report progress to `reporter`
    #[must_use]
    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Use a fixed seed for progress increments
    #[must_use]
    pub fn with_progress_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Current session state
    #[must_use]
    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying removal service
    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Apply a raw action to the state
    pub fn dispatch(&mut self, action: Action) -> Outcome {
        self.state.apply(action)
    }

    /// Select a file from the picker
    ///
    /// On rejection the previous selection is kept and the error banner is set.
    ///
    /// # Errors
    /// - `ClientError::Validation` when the file is not an image or too large
    /// - `ClientError::InvalidState` while a request is outstanding
    pub fn select(&mut self, candidate: FileCandidate) -> Result<&SelectedFile> {
        let outcome = self.state.apply(Action::Select(candidate));
        self.selection_result(outcome)
    }

    /// Select a file dropped on the drop zone
    ///
    /// # Errors
    /// Same as [`RemovalClient::select`].
    pub fn drop_file(&mut self, candidate: FileCandidate) -> Result<&SelectedFile> {
        let outcome = self.state.apply(Action::Drop(candidate));
        self.selection_result(outcome)
    }

    /// Read `path` from disk and select it
    ///
    /// # Errors
    /// - The file cannot be read (the error banner is set as well)
    /// - Same as [`RemovalClient::select`]
    pub fn select_path<P: AsRef<Path>>(&mut self, path: P) -> Result<&SelectedFile> {
        let candidate = self.load(path.as_ref())?;
        self.select(candidate)
    }

    /// Read `path` from disk as if it were dragged onto the drop zone
    ///
    /// # Errors
    /// Same as [`RemovalClient::select_path`].
    pub fn drop_path<P: AsRef<Path>>(&mut self, path: P) -> Result<&SelectedFile> {
        self.state.apply(Action::DragEnter);
        let candidate = self.load(path.as_ref())?;
        self.drop_file(candidate)
    }

    fn load(&mut self, path: &Path) -> Result<FileCandidate> {
        ImageIOService::load_candidate(path).map_err(|e| {
            self.state.apply(Action::SelectionFailed(ErrorMessage::from(&e)));
            e
        })
    }

    fn selection_result(&self, outcome: Outcome) -> Result<&SelectedFile> {
        match outcome {
            Outcome::Applied => self
                .state
                .selected_file()
                .ok_or_else(|| ClientError::invalid_state("selection applied but no file held")),
            Outcome::Rejected(e) => Err(e.into()),
            Outcome::Ignored => Err(ClientError::invalid_state(
                "cannot change the selection while an image is being processed",
            )),
        }
    }

    /// Submit the selected file and wait for the service
    ///
    /// While the request is outstanding a timer advances the progress estimate.
    /// The timer lives inside this future and is dropped when the response
    /// resolves, whatever the outcome, or when the future itself is dropped.
    ///
    /// # Errors
    /// - `ClientError::InvalidState` when nothing is selected or a request is
    ///   already outstanding; no request is issued
    /// - Any service failure; the state returns to `Selected` with the error banner set
    pub async fn submit(&mut self) -> Result<ProcessedResult> {
        if !self.state.apply(Action::Submit).is_applied() {
            debug!(state = %self.state.processing_state(), "Submit ignored");
            return Err(ClientError::invalid_state(
                "no image is ready to be processed",
            ));
        }

        let file = self
            .state
            .selected_file()
            .cloned()
            .ok_or_else(|| ClientError::invalid_state("processing without a selected file"))?;

        info!(
            file = %file.name(),
            mime = %file.mime(),
            size = file.size(),
            service = %self.service.describe(),
            "Submitting image for background removal"
        );
        let started = Instant::now();
        self.reporter.report_start(file.name());

        let response = {
            let mut estimator = match self.seed {
                Some(seed) => ProgressEstimator::seeded(
                    self.config.progress_interval(),
                    self.config.progress_max_increment,
                    seed,
                ),
                None => ProgressEstimator::new(
                    self.config.progress_interval(),
                    self.config.progress_max_increment,
                ),
            };
            let request = self.service.remove_background(&file);
            tokio::pin!(request);

            loop {
                tokio::select! {
                    biased;
                    response = &mut request => break response,
                    increment = estimator.next_increment() => {
                        if self.state.apply(Action::ProgressTick(increment)).is_applied() {
                            self.reporter
                                .report_progress(ProgressUpdate::new(self.state.progress(), started));
                        }
                    }
                }
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match response {
            Ok(result) => {
                self.state.apply(Action::Succeeded(result.clone()));
                self.reporter.report_completion(elapsed_ms);
                info!(elapsed_ms, "Background removed");
                Ok(result)
            },
            Err(e) => {
                let message = ErrorMessage::from(&e);
                warn!(elapsed_ms, error = %e, "Background removal failed");
                self.reporter.report_error(message.as_str());
                self.state.apply(Action::Failed(message));
                Err(e)
            },
        }
    }

    /// Save the processed image
    ///
    /// Uses `dir`, else the configured download directory, else the current directory.
    ///
    /// # Errors
    /// - `ClientError::InvalidState` when there is no processed image
    /// - The result cannot be decoded or written
    pub fn download(&mut self, dir: Option<&Path>) -> Result<PathBuf> {
        let result = self
            .state
            .result()
            .ok_or_else(|| ClientError::invalid_state("no processed image to download"))?;

        let target_dir = dir
            .map(Path::to_path_buf)
            .or_else(|| self.config.download_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        let path = ResultDownloader::save(result, &target_dir)?;
        self.state.apply(Action::Downloaded);
        Ok(path)
    }

    /// Return to the initial state
    pub fn reset(&mut self) {
        self.state.apply(Action::Reset);
    }

    /// Close the error banner
    pub fn dismiss_error(&mut self) {
        self.state.apply(Action::DismissError);
    }
}

impl<S> std::fmt::Debug for RemovalClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemovalClient")
            .field("endpoint", &self.config.endpoint)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
