use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::consts::{COLOR_CHANNEL_COUNT, RECENTER_OFFSET, WHITE_LEVEL};
use crate::error::Result;
use crate::frame::Frame;
use crate::pipeline::config::FlatConfig;

use super::histogram::{background_peak, channel_histogram};
use super::polyfit::fit_poly2d;

/// Flat-field a frame in place.
///
/// Returns `Ok(false)` without touching the frame when it is already
/// normalized. A failed fit leaves the frame unchanged.
pub fn normalize_frame(frame: &mut Frame, config: &FlatConfig) -> Result<bool> {
    if frame.status.normalized {
        debug!("Frame already normalized, skipping");
        return Ok(false);
    }

    let channels: Vec<Array2<u16>> = (0..COLOR_CHANNEL_COUNT)
        .into_par_iter()
        .map(|ch| correct_channel(frame.data.index_axis(Axis(2), ch), config))
        .collect::<Result<_>>()?;

    for (ch, corrected) in channels.into_iter().enumerate() {
        frame.data.index_axis_mut(Axis(2), ch).assign(&corrected);
    }
    frame.status.normalized = true;
    info!(
        height = frame.height(),
        width = frame.width(),
        "Flat-field normalization applied"
    );
    Ok(true)
}

/// Background samples `(row, col, value)` on the interior grid.
pub fn sample_grid(channel: ArrayView2<'_, u16>, config: &FlatConfig) -> Vec<(f64, f64, f64)> {
    let (h, w) = channel.dim();
    let step = config.grid_step.max(1);
    let mut samples = Vec::new();
    for row in (config.margin..h.saturating_sub(config.margin)).step_by(step) {
        for col in (config.margin..w.saturating_sub(config.margin)).step_by(step) {
            samples.push((row as f64, col as f64, channel[[row, col]] as f64));
        }
    }
    samples
}

/// Remove the fitted background of one channel and move its histogram peak
/// onto [`RECENTER_OFFSET`].
pub fn correct_channel(channel: ArrayView2<'_, u16>, config: &FlatConfig) -> Result<Array2<u16>> {
    let samples = sample_grid(channel, config);
    let surface = fit_poly2d(&samples)?;

    let mut corrected = Array2::<u16>::zeros(channel.dim());
    for ((row, col), out) in corrected.indexed_iter_mut() {
        let v = channel[[row, col]] as f64 - surface.eval(row as f64, col as f64) + RECENTER_OFFSET;
        *out = quantize(v);
    }

    let hist = channel_histogram(corrected.view());
    if let Some(peak) = background_peak(&hist) {
        let shift = RECENTER_OFFSET - peak as f64;
        debug!(peak, shift, "Histogram peak alignment");
        corrected.mapv_inplace(|v| quantize(v as f64 + shift));
    }
    Ok(corrected)
}

/// Clip to the 16-bit range and truncate to an integer level.
#[inline]
fn quantize(v: f64) -> u16 {
    v.clamp(0.0, WHITE_LEVEL as f64) as u16
}
