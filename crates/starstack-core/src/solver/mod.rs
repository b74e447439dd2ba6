//! Plate-solver collaborators producing the star list of a frame.

pub mod detect;
pub mod scale;
pub mod sidecar;

use std::path::Path;

use crate::error::Result;
use crate::frame::{Frame, StarList};

pub use detect::{detect_stars, DetectingSolver};
pub use scale::{field_of_view_arcmin, pixel_scale, ScaleRange};
pub use sidecar::SidecarSolver;

/// Finds the stars of a decoded frame.
///
/// `source` is the path the frame was decoded from; solvers that work off
/// files written next to the exposure use it to locate them.
pub trait PlateSolver: Send + Sync {
    fn solve(&self, frame: &Frame, source: &Path) -> Result<StarList>;
}
