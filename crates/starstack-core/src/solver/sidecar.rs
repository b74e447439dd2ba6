use std::path::Path;

use tracing::debug;

use crate::consts::{ASTERISM_SIZE, MAX_STARS};
use crate::error::{Result, StarstackError};
use crate::frame::{Frame, StarList};
use crate::io::stars::{load_star_sidecar, sidecar_path};

use super::scale::ScaleRange;
use super::PlateSolver;

/// Reads the star list an external solver left in `<stem>.stars.toml`.
#[derive(Clone, Debug)]
pub struct SidecarSolver {
    pub scale_range: Option<ScaleRange>,
    pub max_stars: usize,
}

impl SidecarSolver {
    pub fn new(expected_scale: Option<f64>, max_stars: usize) -> Self {
        Self {
            scale_range: expected_scale.map(ScaleRange::around),
            max_stars,
        }
    }
}

impl Default for SidecarSolver {
    fn default() -> Self {
        Self::new(None, MAX_STARS)
    }
}

impl PlateSolver for SidecarSolver {
    fn solve(&self, _frame: &Frame, source: &Path) -> Result<StarList> {
        let path = sidecar_path(source);
        let sidecar = load_star_sidecar(&path)
            .map_err(|e| StarstackError::SolveFailure(format!("{}: {e}", path.display())))?;

        if let (Some(range), Some(scale)) = (self.scale_range, sidecar.scale_arcsec) {
            if !range.contains(scale) {
                return Err(StarstackError::SolveFailure(format!(
                    "scale {scale:.3}\"/px outside {:.3}..{:.3}",
                    range.low, range.high
                )));
            }
        }

        if sidecar.stars.len() < ASTERISM_SIZE {
            return Err(StarstackError::SolveFailure(format!(
                "{} lists {} stars, need {ASTERISM_SIZE}",
                path.display(),
                sidecar.stars.len()
            )));
        }

        debug!(path = %path.display(), stars = sidecar.stars.len(), "Loaded star sidecar");
        Ok(StarList::new(sidecar.stars, self.max_stars))
    }
}
