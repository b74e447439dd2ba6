//! Background batch runs: process every input frame, persist it, then stack.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::error::{Result, StarstackError};
use crate::io::{FrameDecoder, FrameStore, ImageDecoder, ImageSink, OutputSink, SnapshotStore};
use crate::solver::{DetectingSolver, PlateSolver, SidecarSolver};
use crate::frame::Frame;
use crate::stack::{robust_stack_with_progress, FrameSource, StackPass};

use super::config::{BatchConfig, SolverMethod};
use super::session::Session;
use super::types::{
    BatchReport, BatchStage, FrameOutcome, NoOpReporter, ProcessedFrame, ProgressReporter,
};

/// The external pieces a batch talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub decoder: Arc<dyn FrameDecoder>,
    pub solver: Arc<dyn PlateSolver>,
    pub store: Arc<dyn FrameStore>,
    pub sink: Arc<dyn OutputSink>,
}

impl Collaborators {
    /// Image files in, snapshots in `workdir`, solver picked by the config.
    pub fn from_config(config: &BatchConfig) -> Self {
        let solver: Arc<dyn PlateSolver> = match &config.solver.method {
            SolverMethod::Sidecar => Arc::new(SidecarSolver::new(
                config.solver.scale_arcsec,
                config.matching.max_stars,
            )),
            SolverMethod::Detect(detect) => Arc::new(DetectingSolver::new(
                detect.clone(),
                config.matching.max_stars,
            )),
        };
        Self {
            decoder: Arc::new(ImageDecoder),
            solver,
            store: Arc::new(SnapshotStore::new(&config.workdir)),
            sink: Arc::new(ImageSink),
        }
    }
}

/// Notifications sent from the batch worker.
#[derive(Clone, Debug)]
pub enum BatchEvent {
    StageStarted {
        stage: BatchStage,
        total: Option<usize>,
    },
    Progress {
        done: usize,
    },
    FrameDone(FrameOutcome),
    StageFinished,
    Finished {
        succeeded: usize,
        failed: usize,
        cancelled: bool,
        stack_error: Option<String>,
    },
}

/// Point-in-time view of a running batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchStatus {
    pub frames_done: usize,
    pub frames_total: usize,
    pub cancel_requested: bool,
    pub finished: bool,
}

#[derive(Default)]
struct SharedProgress {
    frames_done: AtomicUsize,
    finished: AtomicBool,
}

/// Forwards progress to the event channel and the shared counters.
struct ChannelReporter {
    events: Sender<BatchEvent>,
    progress: Arc<SharedProgress>,
}

impl ChannelReporter {
    fn send(&self, event: BatchEvent) {
        // The receiver may be gone if the caller only joins.
        let _ = self.events.send(event);
    }
}

impl ProgressReporter for ChannelReporter {
    fn begin_stage(&self, stage: BatchStage, total_items: Option<usize>) {
        self.send(BatchEvent::StageStarted {
            stage,
            total: total_items,
        });
    }

    fn advance(&self, items_done: usize) {
        self.send(BatchEvent::Progress { done: items_done });
    }

    fn frame_done(&self, outcome: &FrameOutcome) {
        self.progress.frames_done.fetch_add(1, Ordering::Relaxed);
        self.send(BatchEvent::FrameDone(outcome.clone()));
    }

    fn finish_stage(&self) {
        self.send(BatchEvent::StageFinished);
    }
}

type WorkerResult = (Result<BatchReport>, Session);

/// A batch run on its own thread. The session moves into the worker for the
/// duration of the run and comes back from [`BatchTask::join`].
pub struct BatchTask {
    handle: JoinHandle<WorkerResult>,
    cancel: Arc<AtomicBool>,
    progress: Arc<SharedProgress>,
    events: Receiver<BatchEvent>,
    total: usize,
}

impl BatchTask {
    pub fn start(
        config: BatchConfig,
        mut session: Session,
        collaborators: Collaborators,
    ) -> Result<Self> {
        config.validate()?;
        let cancel = Arc::new(AtomicBool::new(false));
        let progress = Arc::new(SharedProgress::default());
        let (tx, rx) = mpsc::channel();
        let total = config.inputs.len();

        let worker_cancel = Arc::clone(&cancel);
        let worker_progress = Arc::clone(&progress);
        let handle = thread::Builder::new()
            .name("starstack-batch".into())
            .spawn(move || {
                let reporter = ChannelReporter {
                    events: tx,
                    progress: Arc::clone(&worker_progress),
                };
                let result = run_batch(
                    &config,
                    &mut session,
                    &collaborators,
                    &worker_cancel,
                    &reporter,
                );
                worker_progress.finished.store(true, Ordering::Release);
                if let Ok(report) = &result {
                    reporter.send(BatchEvent::Finished {
                        succeeded: report.succeeded,
                        failed: report.failed,
                        cancelled: report.cancelled,
                        stack_error: report.stack_error.clone(),
                    });
                }
                (result, session)
            })?;

        Ok(Self {
            handle,
            cancel,
            progress,
            events: rx,
            total,
        })
    }

    /// Ask the worker to stop before the next frame.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn status(&self) -> BatchStatus {
        BatchStatus {
            frames_done: self.progress.frames_done.load(Ordering::Relaxed),
            frames_total: self.total,
            cancel_requested: self.cancel.load(Ordering::Relaxed),
            finished: self.progress.finished.load(Ordering::Acquire),
        }
    }

    /// Progress and completion notifications. The channel closes when the
    /// worker exits.
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.events
    }

    /// Wait for the worker and take back the report and the session.
    pub fn join(self) -> Result<(BatchReport, Session)> {
        let (result, session) = self
            .handle
            .join()
            .map_err(|_| StarstackError::Worker("batch worker panicked".into()))?;
        Ok((result?, session))
    }
}

/// Run a batch on the calling thread.
///
/// Frames are processed in input order; a frame that fails is recorded and
/// skipped. The cancel flag is checked before every frame. Unless cancelled,
/// the persisted frames are then robust-stacked and the result written to
/// `config.output`. A stacking or write failure is recorded in the report's
/// `stack_error` and leaves `output` empty.
pub fn run_batch(
    config: &BatchConfig,
    session: &mut Session,
    collaborators: &Collaborators,
    cancel: &AtomicBool,
    reporter: &dyn ProgressReporter,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    let total = config.inputs.len();
    info!(frames = total, solver = %config.solver.method, "Starting batch");

    reporter.begin_stage(BatchStage::Processing, Some(total));
    for (index, source) in config.inputs.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            info!(processed = index, "Batch cancelled");
            report.cancelled = true;
            break;
        }

        let result = process_one(index, source, session, collaborators).map_err(|e| {
            warn!(frame = index, source = %source.display(), error = %e, "Frame failed");
            e.to_string()
        });
        let outcome = FrameOutcome {
            index,
            source: source.clone(),
            result,
        };
        reporter.frame_done(&outcome);
        report.record(outcome);
        reporter.advance(index + 1);
    }
    reporter.finish_stage();

    if report.cancelled {
        return Ok(report);
    }

    match stack_and_write(config, collaborators, report.snapshots(), reporter) {
        Ok(()) => {
            info!(
                succeeded = report.succeeded,
                failed = report.failed,
                output = %config.output.display(),
                "Batch complete"
            );
            report.output = Some(config.output.clone());
        }
        Err(e) => {
            warn!(
                succeeded = report.succeeded,
                failed = report.failed,
                error = %e,
                "Stacking failed"
            );
            report.stack_error = Some(e.to_string());
        }
    }
    Ok(report)
}

fn stack_and_write(
    config: &BatchConfig,
    collaborators: &Collaborators,
    snapshots: Vec<PathBuf>,
    reporter: &dyn ProgressReporter,
) -> Result<()> {
    let stack_source = StoredFrames {
        store: collaborators.store.as_ref(),
        paths: snapshots,
    };
    let mut current = None;
    let stacked = robust_stack_with_progress(&stack_source, &config.stacking, |pass, done| {
        let stage = match pass {
            StackPass::Statistics => BatchStage::StackStatistics,
            StackPass::Combination => BatchStage::StackCombination,
        };
        if current != Some(stage) {
            if current.is_some() {
                reporter.finish_stage();
            }
            reporter.begin_stage(stage, Some(stack_source.len()));
            current = Some(stage);
        }
        reporter.advance(done);
    })?;
    reporter.finish_stage();

    reporter.begin_stage(BatchStage::Writing, None);
    collaborators.sink.write(&stacked.frame, &config.output)?;
    reporter.finish_stage();
    Ok(())
}

/// [`run_batch`] without cancellation or progress.
pub fn run_batch_blocking(config: &BatchConfig, session: &mut Session) -> Result<BatchReport> {
    let collaborators = Collaborators::from_config(config);
    run_batch(
        config,
        session,
        &collaborators,
        &AtomicBool::new(false),
        &NoOpReporter,
    )
}

/// Persisted frames reloaded through the batch's own store.
struct StoredFrames<'a> {
    store: &'a dyn FrameStore,
    paths: Vec<PathBuf>,
}

impl FrameSource for StoredFrames<'_> {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn load(&self, index: usize) -> Result<Frame> {
        let path = self.paths.get(index).ok_or(StarstackError::EmptySequence)?;
        self.store.load(path)
    }
}

fn process_one(
    index: usize,
    source: &Path,
    session: &mut Session,
    collaborators: &Collaborators,
) -> Result<ProcessedFrame> {
    let mut frame = collaborators.decoder.decode(source)?;
    let alignment = session.process_frame(&mut frame, source, collaborators.solver.as_ref())?;
    let snapshot = collaborators.store.save(index, &frame)?;
    info!(
        frame = index,
        reference = alignment.reference,
        distance = alignment.distance,
        angle_deg = alignment.angle.to_degrees(),
        "Frame registered"
    );
    Ok(ProcessedFrame {
        snapshot,
        alignment,
    })
}
