//! Two-pass robust combination of registered frames.
//!
//! Frames are streamed from a [`FrameSource`] twice: the first pass gathers
//! per-pixel mean and standard deviation, the second averages only the
//! samples lying inside the rejection band. Memory use is independent of the
//! number of frames.

pub mod accumulator;
pub mod robust;
pub mod source;

pub use accumulator::{MaskedAccumulator, StackAccumulator, StackStatistics};
pub use robust::{robust_stack, robust_stack_with_progress, StackOutput, StackPass};
pub use source::{FrameSource, SnapshotSource};
