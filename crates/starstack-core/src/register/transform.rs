//! Geometry of the registration transform.
//!
//! Registration is modelled as a chain of canvas operations on a
//! `height x width` frame:
//!
//! 1. pad symmetrically and translate so the target centroid lands on the
//!    canvas center;
//! 2. pad to the canvas diagonal and rotate about the canvas center;
//! 3. pad symmetrically and translate the center onto the reference centroid;
//! 4. crop the original `height x width` window from the center.
//!
//! The chain collapses to `out = ref_centroid + R(angle) * (in - target_centroid)`,
//! which is what [`RegistrationTransform::inverse`] evaluates so the pixels
//! are resampled once. Paddings are rounded away from zero (ceiling of the
//! absolute offset), which guarantees no intermediate canvas clips content.

use crate::error::Result;

use super::reference::Correspondence;

/// Rotation + translation that maps a target frame onto the reference grid.
#[derive(Clone, Debug, PartialEq)]
pub struct RegistrationTransform {
    pub target_centroid: (f64, f64),
    pub reference_centroid: (f64, f64),
    /// Reference bearing minus target bearing, radians.
    pub angle: f64,
    /// Translation moving the target centroid onto the frame center.
    pub pre_shift: (f64, f64),
    pub pre_pad: (usize, usize),
    /// Extra padding letting the rotated canvas keep its full diagonal.
    pub rotate_pad: (usize, usize),
    /// Translation moving the frame center onto the reference centroid.
    pub post_shift: (f64, f64),
    pub post_pad: (usize, usize),
    /// Shape of the frame being registered, `(height, width)`.
    pub frame_shape: (usize, usize),
}

impl RegistrationTransform {
    /// Derive the transform from a correspondence for a `height x width` frame.
    pub fn plan(correspondence: &Correspondence, height: usize, width: usize) -> Result<Self> {
        correspondence.validate()?;

        let target_centroid = centroid(&correspondence.target);
        let reference_centroid = centroid(&correspondence.reference);
        let angle = bearing(&correspondence.reference, reference_centroid)
            - bearing(&correspondence.target, target_centroid);

        let half = (height as f64 / 2.0, width as f64 / 2.0);
        let pre_shift = (half.0 - target_centroid.0, half.1 - target_centroid.1);
        let pre_pad = (pad_for(pre_shift.0), pad_for(pre_shift.1));

        let h1 = height + 2 * pre_pad.0;
        let w1 = width + 2 * pre_pad.1;
        let half_diagonal = ((h1 * h1 + w1 * w1) as f64).sqrt() / 2.0;
        let rotate_pad = (
            pad_for(half_diagonal - h1 as f64 / 2.0),
            pad_for(half_diagonal - w1 as f64 / 2.0),
        );

        let post_shift = (
            reference_centroid.0 - half.0,
            reference_centroid.1 - half.1,
        );
        let post_pad = (pad_for(post_shift.0), pad_for(post_shift.1));

        Ok(Self {
            target_centroid,
            reference_centroid,
            angle,
            pre_shift,
            pre_pad,
            rotate_pad,
            post_shift,
            post_pad,
            frame_shape: (height, width),
        })
    }

    /// Shape of the largest intermediate canvas, `(rows, cols)`.
    pub fn canvas_shape(&self) -> (usize, usize) {
        let (h, w) = self.frame_shape;
        (
            h + 2 * (self.pre_pad.0 + self.rotate_pad.0 + self.post_pad.0),
            w + 2 * (self.pre_pad.1 + self.rotate_pad.1 + self.post_pad.1),
        )
    }

    /// Offset of the final crop window inside the largest canvas.
    pub fn crop_offset(&self) -> (usize, usize) {
        (
            self.pre_pad.0 + self.rotate_pad.0 + self.post_pad.0,
            self.pre_pad.1 + self.rotate_pad.1 + self.post_pad.1,
        )
    }

    /// Map a target-frame position onto the reference grid.
    pub fn forward(&self, point: (f64, f64)) -> (f64, f64) {
        let (sin, cos) = self.angle.sin_cos();
        let dr = point.0 - self.target_centroid.0;
        let dc = point.1 - self.target_centroid.1;
        (
            self.reference_centroid.0 + dr * cos - dc * sin,
            self.reference_centroid.1 + dr * sin + dc * cos,
        )
    }

    /// Map a reference-grid position back into the target frame.
    pub fn inverse(&self, point: (f64, f64)) -> (f64, f64) {
        let (sin, cos) = self.angle.sin_cos();
        let dr = point.0 - self.reference_centroid.0;
        let dc = point.1 - self.reference_centroid.1;
        (
            self.target_centroid.0 + dr * cos + dc * sin,
            self.target_centroid.1 - dr * sin + dc * cos,
        )
    }

    /// Translation part of the net transform: `forward(p) = R * p + t`.
    pub fn net_translation(&self) -> (f64, f64) {
        self.forward((0.0, 0.0))
    }
}

/// Canvas padding for a fractional offset: the absolute value rounded up.
pub fn pad_for(offset: f64) -> usize {
    offset.abs().ceil() as usize
}

pub fn centroid(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let (sr, sc) = points
        .iter()
        .fold((0.0, 0.0), |(ar, ac), (r, c)| (ar + r, ac + c));
    (sr / n, sc / n)
}

/// Bearing `atan2(dcol, drow)` of the star farthest from `center`.
///
/// The first of several equally distant stars wins. A group collapsed onto
/// its centroid has bearing zero.
pub fn bearing(points: &[(f64, f64)], center: (f64, f64)) -> f64 {
    let mut max_dist = 0.0f64;
    let mut farthest = None;
    for &(r, c) in points {
        let d = (r - center.0) * (r - center.0) + (c - center.1) * (c - center.1);
        if d > max_dist {
            max_dist = d;
            farthest = Some((r, c));
        }
    }
    match farthest {
        Some((r, c)) => (c - center.1).atan2(r - center.0),
        None => 0.0,
    }
}
