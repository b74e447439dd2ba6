use std::path::PathBuf;

/// Batch processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchStage {
    Processing,
    StackStatistics,
    StackCombination,
    Writing,
}

impl std::fmt::Display for BatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "Registering frames"),
            Self::StackStatistics => write!(f, "Computing statistics"),
            Self::StackCombination => write!(f, "Combining"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// How a successfully processed frame relates to the reference.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    /// This frame became the session reference.
    pub reference: bool,
    /// Fingerprint distance of the accepted match.
    pub distance: f64,
    /// Applied rotation in radians.
    pub angle: f64,
    /// Applied net `(row, col)` translation.
    pub translation: (f64, f64),
}

/// Result of one batch frame.
#[derive(Clone, Debug)]
pub struct FrameOutcome {
    pub index: usize,
    pub source: PathBuf,
    pub result: Result<ProcessedFrame, String>,
}

impl FrameOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Clone, Debug)]
pub struct ProcessedFrame {
    pub snapshot: PathBuf,
    pub alignment: Alignment,
}

/// Final tally of a batch run.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<FrameOutcome>,
    /// Where the combined frame was written; `None` when the batch was
    /// cancelled before stacking.
    pub output: Option<PathBuf>,
    pub cancelled: bool,
    /// Why stacking or writing the combined frame failed, if it did.
    pub stack_error: Option<String>,
}

impl BatchReport {
    pub fn record(&mut self, outcome: FrameOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Snapshots of every frame that made it through, in input order.
    pub fn snapshots(&self) -> Vec<PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|p| p.snapshot.clone()))
            .collect()
    }
}

/// Thread-safe progress reporting for batch runs.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items in
    /// this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: BatchStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// A frame finished processing, successfully or not.
    fn frame_done(&self, _outcome: &FrameOutcome) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
