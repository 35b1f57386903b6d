//! Workflow state and its transition function
//!
//! `ClientState` is the whole upload/process/download session. Every change goes
//! through [`ClientState::apply`], which implements the state machine:
//!
//! ```text
//! Idle       --select(valid)--> Selected
//! Selected   --select(valid)--> Selected   (file replaced)
//! Selected   --submit-------->  Processing
//! Processing --success------->  Completed
//! Processing --failure------->  Selected   (error set, file kept for retry)
//! any        --reset--------->  Idle
//! ```
//!
//! The transition function performs no I/O, so it can be driven directly in tests.

use crate::error::ValidationError;
use crate::services::progress::ProgressEstimate;
use crate::types::{ErrorMessage, FileCandidate, ProcessedResult, ProcessingState, SelectedFile};
use crate::utils::FileValidator;
use tracing::debug;

/// Events that drive the workflow
#[derive(Debug, Clone)]
pub enum Action {
    /// A file was chosen with the picker
    Select(FileCandidate),
    /// The pointer entered the drop zone carrying a file
    DragEnter,
    /// The pointer left the drop zone
    DragLeave,
    /// A file was dropped on the drop zone
    Drop(FileCandidate),
    /// A chosen file could not even be read
    SelectionFailed(ErrorMessage),
    /// The user asked to process the selected file
    Submit,
    /// The progress timer fired with a pseudo-random increment
    ProgressTick(f64),
    /// The service returned a processed image
    Succeeded(ProcessedResult),
    /// The request failed; carries the text for the error banner
    Failed(ErrorMessage),
    /// The user saved the result locally
    Downloaded,
    /// Clear everything
    Reset,
    /// Close the error banner
    DismissError,
}

/// Whether an action changed the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action was accepted
    Applied,
    /// The action is not applicable in the current state
    Ignored,
    /// A selection failed validation; the error banner now shows it
    Rejected(ValidationError),
}

impl Outcome {
    /// True when the action was accepted
    #[must_use]
    pub fn is_applied(&self) -> bool {
        *self == Outcome::Applied
    }
}

/// Complete client session state
#[derive(Debug, Clone, PartialEq)]
pub struct ClientState {
    validator: FileValidator,
    progress_cap: f64,
    selected: Option<SelectedFile>,
    result: Option<ProcessedResult>,
    processing: ProcessingState,
    progress: ProgressEstimate,
    error: Option<ErrorMessage>,
    drag_over: bool,
    picker_value: Option<String>,
}

impl ClientState {
    /// Create an idle state
    ///
    /// # Arguments
    /// * `validator` - Selection constraints
    /// * `progress_cap` - Ceiling for the progress estimate while waiting
    #[must_use]
    pub fn new(validator: FileValidator, progress_cap: f64) -> Self {
        Self {
            validator,
            progress_cap,
            selected: None,
            result: None,
            processing: ProcessingState::Idle,
            progress: ProgressEstimate::default(),
            error: None,
            drag_over: false,
            picker_value: None,
        }
    }

    /// Apply one action, returning whether it was accepted
    pub fn apply(&mut self, action: Action) -> Outcome {
        let before = self.processing;
        let outcome = match action {
            Action::Select(candidate) => self.select(candidate),
            Action::DragEnter => {
                self.drag_over = true;
                Outcome::Applied
            },
            Action::DragLeave => {
                self.drag_over = false;
                Outcome::Applied
            },
            Action::Drop(candidate) => {
                self.drag_over = false;
                self.select(candidate)
            },
            Action::SelectionFailed(message) => {
                self.drag_over = false;
                if self.processing == ProcessingState::Processing {
                    Outcome::Ignored
                } else {
                    self.error = Some(message);
                    Outcome::Applied
                }
            },
            Action::Submit => self.submit(),
            Action::ProgressTick(increment) => self.tick(increment),
            Action::Succeeded(result) => self.succeed(result),
            Action::Failed(message) => self.fail(message),
            Action::Downloaded => {
                if self.result.is_some() {
                    Outcome::Applied
                } else {
                    Outcome::Ignored
                }
            },
            Action::Reset => {
                self.reset();
                Outcome::Applied
            },
            Action::DismissError => {
                if self.error.take().is_some() {
                    Outcome::Applied
                } else {
                    Outcome::Ignored
                }
            },
        };

        if before != self.processing {
            debug!(from = %before, to = %self.processing, "State transition");
        }
        outcome
    }

    fn select(&mut self, candidate: FileCandidate) -> Outcome {
        if self.processing == ProcessingState::Processing {
            debug!(file = %candidate.name, "Selection ignored while processing");
            return Outcome::Ignored;
        }

        let name = candidate.name.clone();
        match self.validator.validate(candidate) {
            Ok(file) => {
                self.selected = Some(file);
                self.result = None;
                self.progress = ProgressEstimate::default();
                self.error = None;
                self.processing = ProcessingState::Selected;
                self.picker_value = Some(name);
                Outcome::Applied
            },
            Err(e) => {
                self.reject(&e);
                Outcome::Rejected(e)
            },
        }
    }

    fn reject(&mut self, error: &ValidationError) {
        debug!(error = %error, "Selection rejected");
        self.error = Some(ErrorMessage::new(error.to_string()));
    }

    fn submit(&mut self) -> Outcome {
        if self.selected.is_none() || self.processing != ProcessingState::Selected {
            return Outcome::Ignored;
        }
        self.processing = ProcessingState::Processing;
        self.progress = ProgressEstimate::default();
        self.error = None;
        Outcome::Applied
    }

    fn tick(&mut self, increment: f64) -> Outcome {
        if self.processing != ProcessingState::Processing {
            return Outcome::Ignored;
        }
        if self.progress.advance(increment, self.progress_cap) {
            Outcome::Applied
        } else {
            Outcome::Ignored
        }
    }

    fn succeed(&mut self, result: ProcessedResult) -> Outcome {
        if self.processing != ProcessingState::Processing {
            return Outcome::Ignored;
        }
        self.progress = ProgressEstimate::complete();
        self.result = Some(result);
        self.error = None;
        self.processing = ProcessingState::Completed;
        Outcome::Applied
    }

    fn fail(&mut self, message: ErrorMessage) -> Outcome {
        if self.processing != ProcessingState::Processing {
            return Outcome::Ignored;
        }
        self.error = Some(message);
        self.result = None;
        self.processing = ProcessingState::Selected;
        Outcome::Applied
    }

    fn reset(&mut self) {
        self.selected = None;
        self.result = None;
        self.progress = ProgressEstimate::default();
        self.error = None;
        self.processing = ProcessingState::Idle;
        self.drag_over = false;
        self.picker_value = None;
    }

    /// Currently selected file
    #[must_use]
    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    /// Processed result, present only in `Completed`
    #[must_use]
    pub fn result(&self) -> Option<&ProcessedResult> {
        self.result.as_ref()
    }

    /// Workflow stage
    #[must_use]
    pub fn processing_state(&self) -> ProcessingState {
        self.processing
    }

    /// Raw progress estimate
    #[must_use]
    pub fn progress(&self) -> ProgressEstimate {
        self.progress
    }

    /// Progress estimate, only while processing
    #[must_use]
    pub fn visible_progress(&self) -> Option<ProgressEstimate> {
        (self.processing == ProcessingState::Processing).then_some(self.progress)
    }

    /// Error banner text
    #[must_use]
    pub fn error(&self) -> Option<&ErrorMessage> {
        self.error.as_ref()
    }

    /// Largest accepted selection in bytes
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.validator.max_file_size()
    }

    /// Whether the drop zone is highlighted
    #[must_use]
    pub fn is_drag_over(&self) -> bool {
        self.drag_over
    }

    /// What the file picker currently retains; cleared by reset so the same
    /// file can be picked again
    #[must_use]
    pub fn picker_value(&self) -> Option<&str> {
        self.picker_value.as_deref()
    }

    /// Whether a submission would be accepted
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && self.processing == ProcessingState::Selected
    }

    /// Whether a download would be accepted
    #[must_use]
    pub fn can_download(&self) -> bool {
        self.result.is_some()
    }

    /// Whether this equals a freshly created state
    #[must_use]
    pub fn is_initial(&self) -> bool {
        *self == Self::new(self.validator, self.progress_cap)
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new(FileValidator::default(), 90.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str) -> FileCandidate {
        FileCandidate::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    fn processing_state() -> ClientState {
        let mut state = ClientState::default();
        state.apply(Action::Select(png("a.png")));
        state.apply(Action::Submit);
        state
    }

    #[test]
    fn test_select_valid_file() {
        let mut state = ClientState::default();
        assert!(state.apply(Action::Select(png("a.png"))).is_applied());
        assert_eq!(state.processing_state(), ProcessingState::Selected);
        assert_eq!(state.selected_file().unwrap().name(), "a.png");
        assert_eq!(state.picker_value(), Some("a.png"));
        assert!(state.error().is_none());
    }

    #[test]
    fn test_invalid_selection_keeps_previous_file() {
        let mut state = ClientState::default();
        state.apply(Action::Select(png("a.png")));

        let text = FileCandidate::new("notes.txt", "text/plain", b"hi".to_vec());
        assert!(matches!(
            state.apply(Action::Select(text)),
            Outcome::Rejected(ValidationError::NotAnImage { .. })
        ));
        assert_eq!(state.selected_file().unwrap().name(), "a.png");
        assert_eq!(state.processing_state(), ProcessingState::Selected);
        assert_eq!(state.error().unwrap().as_str(), "Please select a valid image file");

        let big = FileCandidate::new("big.png", "image/png", vec![0; 10 * 1024 * 1024 + 1]);
        state.apply(Action::Select(big));
        assert_eq!(state.selected_file().unwrap().name(), "a.png");
        assert!(state.error().unwrap().as_str().contains("too large"));
    }

    #[test]
    fn test_invalid_selection_from_idle_stays_idle() {
        let mut state = ClientState::default();
        state.apply(Action::Select(FileCandidate::new("x.pdf", "application/pdf", vec![1])));
        assert_eq!(state.processing_state(), ProcessingState::Idle);
        assert!(state.selected_file().is_none());
        assert!(state.error().is_some());
    }

    #[test]
    fn test_new_selection_clears_result_and_error() {
        let mut state = processing_state();
        state.apply(Action::Succeeded(ProcessedResult::new("data:image/png;base64,AAAA")));
        assert_eq!(state.processing_state(), ProcessingState::Completed);

        state.apply(Action::Select(png("b.png")));
        assert!(state.result().is_none());
        assert_eq!(state.progress().value(), 0.0);
        assert_eq!(state.processing_state(), ProcessingState::Selected);
    }

    #[test]
    fn test_submit_without_file_is_noop() {
        let mut state = ClientState::default();
        assert_eq!(state.apply(Action::Submit), Outcome::Ignored);
        assert!(state.is_initial());
    }

    #[test]
    fn test_submit_twice_is_rejected() {
        let mut state = processing_state();
        assert_eq!(state.apply(Action::Submit), Outcome::Ignored);
        assert_eq!(state.processing_state(), ProcessingState::Processing);
    }

    #[test]
    fn test_selection_ignored_while_processing() {
        let mut state = processing_state();
        assert_eq!(state.apply(Action::Select(png("b.png"))), Outcome::Ignored);
        assert_eq!(state.selected_file().unwrap().name(), "a.png");
    }

    #[test]
    fn test_progress_ticks_are_capped_and_monotonic() {
        let mut state = processing_state();
        let mut last = 0.0;
        for increment in [12.0, 3.5, -8.0, 14.9, 14.9, 14.9, 14.9, 14.9, 14.9] {
            state.apply(Action::ProgressTick(increment));
            let value = state.visible_progress().unwrap().value();
            assert!(value >= last);
            assert!(value <= 90.0);
            last = value;
        }
        assert!((last - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ticks_ignored_outside_processing() {
        let mut state = ClientState::default();
        state.apply(Action::Select(png("a.png")));
        assert_eq!(state.apply(Action::ProgressTick(10.0)), Outcome::Ignored);
        assert_eq!(state.visible_progress(), None);
    }

    #[test]
    fn test_success_completes() {
        let mut state = processing_state();
        state.apply(Action::ProgressTick(40.0));
        state.apply(Action::Succeeded(ProcessedResult::new("data:image/png;base64,AAAA")));

        assert_eq!(state.processing_state(), ProcessingState::Completed);
        assert_eq!(state.progress().value(), 100.0);
        assert_eq!(state.result().unwrap().as_data_url(), "data:image/png;base64,AAAA");
        assert!(state.can_download());
        assert!(!state.can_submit());
    }

    #[test]
    fn test_failure_returns_to_selected() {
        let mut state = processing_state();
        state.apply(Action::Failed(ErrorMessage::new("server overloaded")));

        assert_eq!(state.processing_state(), ProcessingState::Selected);
        assert_eq!(state.error().unwrap().as_str(), "server overloaded");
        assert!(state.result().is_none());
        assert!(state.selected_file().is_some());
        assert!(state.can_submit());

        // Retrying clears the previous error
        state.apply(Action::Submit);
        assert!(state.error().is_none());
        assert_eq!(state.progress().value(), 0.0);
    }

    #[test]
    fn test_late_responses_are_ignored() {
        let mut state = processing_state();
        state.apply(Action::Reset);
        assert_eq!(
            state.apply(Action::Succeeded(ProcessedResult::new("data:image/png;base64,AAAA"))),
            Outcome::Ignored
        );
        assert_eq!(
            state.apply(Action::Failed(ErrorMessage::new("late"))),
            Outcome::Ignored
        );
        assert!(state.is_initial());
    }

    #[test]
    fn test_reset_from_every_state() {
        let mut selected = ClientState::default();
        selected.apply(Action::Select(png("a.png")));

        let processing = processing_state();

        let mut completed = processing_state();
        completed.apply(Action::Succeeded(ProcessedResult::new("data:image/png;base64,AAAA")));

        let mut with_error = processing_state();
        with_error.apply(Action::Failed(ErrorMessage::new("boom")));

        let mut dragging = ClientState::default();
        dragging.apply(Action::DragEnter);

        for mut state in [selected, processing, completed, with_error, dragging] {
            state.apply(Action::Reset);
            assert!(state.is_initial());
            assert!(state.selected_file().is_none());
            assert!(state.result().is_none());
            assert_eq!(state.progress().value(), 0.0);
            assert!(state.error().is_none());
            assert_eq!(state.processing_state(), ProcessingState::Idle);
            assert_eq!(state.picker_value(), None);
        }
    }

    #[test]
    fn test_dismiss_error_changes_nothing_else() {
        let mut state = processing_state();
        state.apply(Action::Failed(ErrorMessage::new("boom")));
        let mut expected = state.clone();
        expected.error = None;

        assert!(state.apply(Action::DismissError).is_applied());
        assert_eq!(state, expected);
        assert_eq!(state.apply(Action::DismissError), Outcome::Ignored);
    }

    #[test]
    fn test_drag_and_drop() {
        let mut state = ClientState::default();
        state.apply(Action::DragEnter);
        assert!(state.is_drag_over());
        state.apply(Action::DragLeave);
        assert!(!state.is_drag_over());

        state.apply(Action::DragEnter);
        assert!(state.apply(Action::Drop(png("dropped.png"))).is_applied());
        assert!(!state.is_drag_over());
        assert_eq!(state.selected_file().unwrap().name(), "dropped.png");
    }

    #[test]
    fn test_unreadable_selection_only_sets_error() {
        let mut state = ClientState::default();
        state.apply(Action::Select(png("a.png")));
        state.apply(Action::SelectionFailed(ErrorMessage::new("permission denied")));
        assert_eq!(state.selected_file().unwrap().name(), "a.png");
        assert_eq!(state.processing_state(), ProcessingState::Selected);
        assert_eq!(state.error().unwrap().as_str(), "permission denied");
    }

    #[test]
    fn test_downloaded_requires_result() {
        let mut state = ClientState::default();
        assert_eq!(state.apply(Action::Downloaded), Outcome::Ignored);
    }
}
