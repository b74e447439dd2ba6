use std::path::PathBuf;

use crate::error::{Result, StarstackError};
use crate::frame::Frame;
use crate::io::snapshot::read_snapshot;

/// Random-access provider of frames for streaming passes.
pub trait FrameSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load frame `index`. Called once per frame per pass.
    fn load(&self, index: usize) -> Result<Frame>;
}

impl FrameSource for [Frame] {
    fn len(&self) -> usize {
        <[Frame]>::len(self)
    }

    fn load(&self, index: usize) -> Result<Frame> {
        self.get(index)
            .cloned()
            .ok_or(StarstackError::EmptySequence)
    }
}

/// Frames persisted as snapshot files, loaded one at a time.
#[derive(Clone, Debug, Default)]
pub struct SnapshotSource {
    paths: Vec<PathBuf>,
}

impl SnapshotSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for SnapshotSource {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn load(&self, index: usize) -> Result<Frame> {
        let path = self.paths.get(index).ok_or(StarstackError::EmptySequence)?;
        read_snapshot(path)
    }
}
