//! Progress estimation and reporting service
//!
//! The service gives no progress information, so the client shows a cosmetic
//! estimate: a repeating timer adds a pseudo-random increment while the request
//! is outstanding, never passing the cap, and the value jumps to 100 on success.
//! Reporting is separated from the estimate so different frontends can render it.

use instant::Instant;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::{self, Interval, MissedTickBehavior};

#[cfg(feature = "cli")]
use indicatif::{ProgressBar, ProgressStyle};

/// Client-side approximation of processing completion, in `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct ProgressEstimate(f64);

impl ProgressEstimate {
    /// Estimate forced on success
    #[must_use]
    pub fn complete() -> Self {
        Self(100.0)
    }

    /// Current value
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whole percent, for progress bars
    #[must_use]
    pub fn percent(self) -> u8 {
        self.0.clamp(0.0, 100.0).floor() as u8
    }

    /// Coarse phase label for the current value
    #[must_use]
    pub fn phase(self) -> ProgressPhase {
        ProgressPhase::from_value(self.0)
    }

    /// Add `increment`, never exceeding `cap` and never decreasing
    ///
    /// Returns whether the value changed.
    pub fn advance(&mut self, increment: f64, cap: f64) -> bool {
        if !increment.is_finite() || increment <= 0.0 || self.0 >= cap {
            return false;
        }
        let next = (self.0 + increment).min(cap);
        let changed = next > self.0;
        self.0 = next;
        changed
    }
}

/// Textual phase shown under the progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// Below 30
    Analyzing,
    /// 30 to below 70
    DetectingObjects,
    /// 70 to below 90
    RemovingBackground,
    /// 90 and above
    FinalTouches,
}

impl ProgressPhase {
    /// Map a progress value to its phase
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        if value < 30.0 {
            Self::Analyzing
        } else if value < 70.0 {
            Self::DetectingObjects
        } else if value < 90.0 {
            Self::RemovingBackground
        } else {
            Self::FinalTouches
        }
    }

    /// Get a human-readable label for the phase
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Analyzing => "Analyzing image...",
            Self::DetectingObjects => "Detecting objects...",
            Self::RemovingBackground => "Removing background...",
            Self::FinalTouches => "Final touches...",
        }
    }
}

/// Repeating timer producing pseudo-random progress increments
///
/// The first increment arrives one period after creation. Dropping the
/// estimator cancels the timer, so scoping it to the request future tears it
/// down on every exit path.
#[derive(Debug)]
pub struct ProgressEstimator {
    interval: Interval,
    rng: StdRng,
    max_increment: f64,
}

impl ProgressEstimator {
    /// Create an estimator seeded from the OS
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(period: Duration, max_increment: f64) -> Self {
        Self::with_rng(period, max_increment, StdRng::from_os_rng())
    }

    /// Create an estimator with a fixed seed (reproducible increments)
    #[must_use]
    pub fn seeded(period: Duration, max_increment: f64, seed: u64) -> Self {
        Self::with_rng(period, max_increment, StdRng::seed_from_u64(seed))
    }

    fn with_rng(period: Duration, max_increment: f64, rng: StdRng) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            rng,
            max_increment,
        }
    }

    /// Wait for the next tick and return its increment in `[0, max_increment)`
    pub async fn next_increment(&mut self) -> f64 {
        self.interval.tick().await;
        self.rng.random::<f64>() * self.max_increment
    }
}

/// Progress update sent to reporters while a request is outstanding
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Current estimate
    pub estimate: ProgressEstimate,
    /// Phase derived from the estimate
    pub phase: ProgressPhase,
    /// Elapsed time since submission (milliseconds)
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    /// Create a new progress update
    #[must_use]
    pub fn new(estimate: ProgressEstimate, start_time: Instant) -> Self {
        Self {
            phase: estimate.phase(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            estimate,
        }
    }
}

/// Trait for reporting progress of a submission
pub trait ProgressReporter: Send + Sync {
    /// A submission started
    fn report_start(&self, file_name: &str) {
        let _ = file_name;
    }

    /// The estimate changed
    fn report_progress(&self, update: ProgressUpdate);

    /// The service returned a processed image
    fn report_completion(&self, elapsed_ms: u64);

    /// The submission failed; `message` is the banner text
    fn report_error(&self, message: &str);
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_completion(&self, _elapsed_ms: u64) {}

    fn report_error(&self, _message: &str) {}
}

/// Console progress reporter that logs progress through tracing
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    ///
    /// # Arguments
    /// * `verbose` - Whether to include elapsed time in each line
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_start(&self, file_name: &str) {
        tracing::info!("Removing background from {}", file_name);
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            tracing::info!(
                "[{}%] {} ({}ms elapsed)",
                update.estimate.percent(),
                update.phase.label(),
                update.elapsed_ms
            );
        } else {
            tracing::info!("[{}%] {}", update.estimate.percent(), update.phase.label());
        }
    }

    fn report_completion(&self, elapsed_ms: u64) {
        tracing::info!("✅ Background removed in {}ms", elapsed_ms);
    }

    fn report_error(&self, message: &str) {
        tracing::error!("❌ {}", message);
    }
}

/// Progress bar reporter for interactive terminals
#[cfg(feature = "cli")]
pub struct BarProgressReporter {
    bar: ProgressBar,
}

#[cfg(feature = "cli")]
impl BarProgressReporter {
    /// Create a hidden bar; it is shown when a submission starts
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.magenta} [{elapsed_precise}] [{bar:40.magenta/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

#[cfg(feature = "cli")]
impl Default for BarProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "cli")]
impl ProgressReporter for BarProgressReporter {
    fn report_start(&self, file_name: &str) {
        self.bar.reset();
        self.bar
            .set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_position(0);
        self.bar.set_message(format!(
            "{} {}",
            ProgressPhase::Analyzing.label(),
            file_name
        ));
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    fn report_progress(&self, update: ProgressUpdate) {
        self.bar.set_position(u64::from(update.estimate.percent()));
        self.bar.set_message(update.phase.label());
    }

    fn report_completion(&self, elapsed_ms: u64) {
        self.bar.set_position(100);
        self.bar
            .finish_with_message(format!("✅ Background removed in {}ms", elapsed_ms));
    }

    fn report_error(&self, message: &str) {
        self.bar.abandon_with_message(format!("❌ {}", message));
    }
}

/// Create the reporter used by the CLI
#[cfg(feature = "cli")]
#[must_use]
pub fn create_cli_progress_reporter(show_bar: bool, verbose: bool) -> Box<dyn ProgressReporter> {
    if show_bar {
        Box::new(BarProgressReporter::new())
    } else {
        Box::new(ConsoleProgressReporter::new(verbose))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_thresholds() {
        assert_eq!(ProgressPhase::from_value(0.0), ProgressPhase::Analyzing);
        assert_eq!(ProgressPhase::from_value(29.9), ProgressPhase::Analyzing);
        assert_eq!(ProgressPhase::from_value(30.0), ProgressPhase::DetectingObjects);
        assert_eq!(ProgressPhase::from_value(69.9), ProgressPhase::DetectingObjects);
        assert_eq!(ProgressPhase::from_value(70.0), ProgressPhase::RemovingBackground);
        assert_eq!(ProgressPhase::from_value(89.9), ProgressPhase::RemovingBackground);
        assert_eq!(ProgressPhase::from_value(90.0), ProgressPhase::FinalTouches);
        assert_eq!(ProgressPhase::from_value(100.0), ProgressPhase::FinalTouches);
        assert_eq!(ProgressPhase::FinalTouches.label(), "Final touches...");
    }

    #[test]
    fn test_advance_respects_cap() {
        let mut estimate = ProgressEstimate::default();
        assert!(estimate.advance(85.0, 90.0));
        assert!(estimate.advance(14.0, 90.0));
        assert!((estimate.value() - 90.0).abs() < f64::EPSILON);
        assert!(!estimate.advance(5.0, 90.0));
        assert!(!estimate.advance(-5.0, 90.0));
        assert!(!estimate.advance(f64::NAN, 90.0));
        assert_eq!(estimate.percent(), 90);
        assert_eq!(ProgressEstimate::complete().percent(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_estimator_ticks_on_period() {
        let start = time::Instant::now();
        let mut estimator = ProgressEstimator::seeded(Duration::from_millis(200), 15.0, 7);

        for n in 1..=5u32 {
            let increment = estimator.next_increment().await;
            assert!((0.0..15.0).contains(&increment));
            assert_eq!(start.elapsed(), Duration::from_millis(200) * n);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_estimators_agree() {
        let mut a = ProgressEstimator::seeded(Duration::from_millis(50), 15.0, 42);
        let mut b = ProgressEstimator::seeded(Duration::from_millis(50), 15.0, 42);
        for _ in 0..3 {
            let left = a.next_increment().await;
            let right = b.next_increment().await;
            assert!((left - right).abs() < f64::EPSILON);
        }
    }
}
