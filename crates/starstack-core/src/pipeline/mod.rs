pub mod batch;
pub mod config;
mod session;
mod types;

pub use batch::{run_batch, run_batch_blocking, BatchEvent, BatchStatus, BatchTask, Collaborators};
pub use session::Session;
pub use types::{
    Alignment, BatchReport, BatchStage, FrameOutcome, NoOpReporter, ProcessedFrame,
    ProgressReporter,
};
