use tracing::{debug, info};

use crate::error::{Result, StarstackError};
use crate::frame::{Frame, FrameStatus};
use crate::pipeline::config::StackingConfig;

use super::accumulator::{MaskedAccumulator, StackAccumulator, StackStatistics};
use super::source::FrameSource;

/// Which pass of the robust stacker a progress update belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackPass {
    Statistics,
    Combination,
}

impl std::fmt::Display for StackPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Statistics => write!(f, "Computing statistics"),
            Self::Combination => write!(f, "Combining"),
        }
    }
}

/// Result of a robust stack.
#[derive(Clone, Debug)]
pub struct StackOutput {
    pub frame: Frame,
    pub statistics: StackStatistics,
    /// Samples accepted per pixel and channel.
    pub accepted: ndarray::Array3<f64>,
}

/// Combine all frames of `source` with per-pixel outlier rejection.
pub fn robust_stack<S>(source: &S, config: &StackingConfig) -> Result<StackOutput>
where
    S: FrameSource + ?Sized,
{
    robust_stack_with_progress(source, config, |_, _| {})
}

/// Same as [`robust_stack`], reporting `(pass, frames_done)` after each frame.
pub fn robust_stack_with_progress<S, F>(
    source: &S,
    config: &StackingConfig,
    mut on_progress: F,
) -> Result<StackOutput>
where
    S: FrameSource + ?Sized,
    F: FnMut(StackPass, usize),
{
    if source.is_empty() {
        return Err(StarstackError::EmptySequence);
    }
    let total = source.len();

    let first = source.load(0)?;
    let shape = first.shape();
    let mut all_normalized = first.status.normalized;

    let mut accumulator = StackAccumulator::new(shape);
    accumulator.push(&first.data);
    drop(first);
    on_progress(StackPass::Statistics, 1);

    for i in 1..total {
        let frame = source.load(i)?;
        check_shape(shape, &frame)?;
        all_normalized &= frame.status.normalized;
        accumulator.push(&frame.data);
        on_progress(StackPass::Statistics, i + 1);
    }
    let statistics = accumulator.finish();
    debug!(frames = total, "Stack statistics pass complete");

    let mut masked = MaskedAccumulator::new(&statistics, config.tolerance);
    for i in 0..total {
        let frame = source.load(i)?;
        check_shape(shape, &frame)?;
        masked.push(&frame.data, &statistics);
        on_progress(StackPass::Combination, i + 1);
    }

    let accepted = masked.accepted();
    let frame = Frame {
        data: masked.finish(),
        status: FrameStatus {
            loaded: true,
            normalized: all_normalized,
            registered: true,
            solved: false,
        },
        stars: Default::default(),
    };
    info!(
        frames = total,
        tolerance = config.tolerance,
        "Robust stacking complete"
    );

    Ok(StackOutput {
        frame,
        statistics,
        accepted,
    })
}

fn check_shape(expected: (usize, usize, usize), frame: &Frame) -> Result<()> {
    let found = frame.shape();
    if found != expected {
        return Err(StarstackError::ShapeMismatch { expected, found });
    }
    Ok(())
}
