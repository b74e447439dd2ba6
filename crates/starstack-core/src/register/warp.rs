use ndarray::Array3;
use rayon::prelude::*;

use crate::consts::{COLOR_CHANNEL_COUNT, PARALLEL_PIXEL_THRESHOLD};

use super::transform::RegistrationTransform;

/// Sample coordinates this close to an integer are treated as exact, so an
/// identity transform reproduces the input bit for bit.
const SNAP_TOLERANCE: f64 = 1e-6;

/// Resample `data` onto the reference grid described by `transform`.
///
/// Output shape equals input shape. Pixels mapping outside the source are
/// zero; everything else is bilinearly interpolated and rounded.
pub fn warp_frame(data: &Array3<u16>, transform: &RegistrationTransform) -> Array3<u16> {
    let (h, w, _) = data.dim();

    let warp_row = |row: usize| -> Vec<u16> {
        let mut out = vec![0u16; w * COLOR_CHANNEL_COUNT];
        for col in 0..w {
            let (src_r, src_c) = transform.inverse((row as f64, col as f64));
            let px = bilinear_sample(data, snap(src_r), snap(src_c));
            out[col * COLOR_CHANNEL_COUNT..(col + 1) * COLOR_CHANNEL_COUNT].copy_from_slice(&px);
        }
        out
    };

    let rows: Vec<Vec<u16>> = if h * w >= PARALLEL_PIXEL_THRESHOLD {
        (0..h).into_par_iter().map(warp_row).collect()
    } else {
        (0..h).map(warp_row).collect()
    };

    let mut result = Array3::<u16>::zeros((h, w, COLOR_CHANNEL_COUNT));
    for (row, row_data) in rows.iter().enumerate() {
        for col in 0..w {
            for ch in 0..COLOR_CHANNEL_COUNT {
                result[[row, col, ch]] = row_data[col * COLOR_CHANNEL_COUNT + ch];
            }
        }
    }
    result
}

fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < SNAP_TOLERANCE {
        r
    } else {
        v
    }
}

/// Bilinear sample of all channels at a fractional position, zero outside.
fn bilinear_sample(data: &Array3<u16>, y: f64, x: f64) -> [u16; COLOR_CHANNEL_COUNT] {
    let (h, w, _) = data.dim();
    let mut px = [0u16; COLOR_CHANNEL_COUNT];
    if !(y > -1.0 && x > -1.0 && y < h as f64 && x < w as f64) {
        return px;
    }

    let y0 = y.floor();
    let x0 = x.floor();
    let fy = y - y0;
    let fx = x - x0;
    let (y0, x0) = (y0 as isize, x0 as isize);

    let fetch = |r: isize, c: isize, ch: usize| -> f64 {
        if r < 0 || c < 0 || r >= h as isize || c >= w as isize {
            0.0
        } else {
            data[[r as usize, c as usize, ch]] as f64
        }
    };

    for (ch, out) in px.iter_mut().enumerate() {
        let mut v = fetch(y0, x0, ch) * (1.0 - fy) * (1.0 - fx);
        if fx > 0.0 {
            v += fetch(y0, x0 + 1, ch) * (1.0 - fy) * fx;
        }
        if fy > 0.0 {
            v += fetch(y0 + 1, x0, ch) * fy * (1.0 - fx);
            if fx > 0.0 {
                v += fetch(y0 + 1, x0 + 1, ch) * fy * fx;
            }
        }
        *out = v.round().clamp(0.0, u16::MAX as f64) as u16;
    }
    px
}
