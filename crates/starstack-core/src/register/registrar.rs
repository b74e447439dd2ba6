use ndarray::{s, Array3};
use tracing::{debug, info};

use crate::error::{Result, StarstackError};
use crate::frame::{Frame, Star, StarList};
use crate::pipeline::config::RegistrationConfig;

use super::reference::Correspondence;
use super::transform::RegistrationTransform;
use super::warp::warp_frame;

/// What [`register_frame`] did to the frame.
#[derive(Clone, Debug, PartialEq)]
pub enum RegistrationOutcome {
    Applied(RegistrationTransform),
    /// The frame was already registered; nothing changed.
    AlreadyRegistered,
}

/// Align `frame` onto the reference grid in place.
///
/// On success the frame is marked registered and unsolved, and its star list
/// is replaced by the reference stars with brightness re-measured in the
/// aligned pixels. On failure the frame is left untouched.
pub fn register_frame(
    frame: &mut Frame,
    correspondence: &Correspondence,
    reference_stars: &StarList,
    config: &RegistrationConfig,
) -> Result<RegistrationOutcome> {
    if frame.status.registered {
        debug!("Frame already registered, skipping");
        return Ok(RegistrationOutcome::AlreadyRegistered);
    }
    if !frame.status.normalized {
        return Err(StarstackError::InvalidRegistrationInput(
            "frame must be flat-field normalized before registration".into(),
        ));
    }

    let transform = RegistrationTransform::plan(correspondence, frame.height(), frame.width())?;
    info!(
        angle_deg = transform.angle.to_degrees(),
        shift_row = transform.net_translation().0,
        shift_col = transform.net_translation().1,
        "Registering frame"
    );

    frame.data = warp_frame(&frame.data, &transform);

    let refreshed: Vec<Star> = reference_stars
        .iter()
        .map(|s| {
            Star::new(
                s.row,
                s.col,
                measure_brightness(&frame.data, s.row, s.col, config.brightness_radius),
            )
        })
        .collect();
    frame.stars = StarList::new(refreshed, reference_stars.len());
    frame.status.registered = true;
    frame.status.solved = false;

    Ok(RegistrationOutcome::Applied(transform))
}

/// Sum of all channel values in the `(2 * radius + 1)`-wide square centered on
/// `(row, col)`, clipped to the frame.
pub fn measure_brightness(data: &Array3<u16>, row: f64, col: f64, radius: usize) -> f64 {
    let (h, w, _) = data.dim();
    let (r, c) = (row.round(), col.round());
    let radius = radius as f64;

    let r0 = (r - radius).max(0.0);
    let c0 = (c - radius).max(0.0);
    let r1 = (r + radius + 1.0).min(h as f64);
    let c1 = (c + radius + 1.0).min(w as f64);
    if r0 >= r1 || c0 >= c1 {
        return 0.0;
    }

    data.slice(s![r0 as usize..r1 as usize, c0 as usize..c1 as usize, ..])
        .iter()
        .map(|&v| v as f64)
        .sum()
}
