#![allow(dead_code)]

use std::path::Path;

use ndarray::Array3;
use starstack_core::frame::{Frame, Star, StarList};
use starstack_core::io::{save_star_sidecar, sidecar_path, StarSidecar};

pub const BACKGROUND: f64 = 1000.0;
pub const STAR_SIGMA: f64 = 1.5;

/// Eight stars with distinct brightness, clustered around `(48, 48)` so they
/// stay inside a 96x96 frame under any rotation about its center.
pub fn star_field() -> Vec<Star> {
    vec![
        Star::new(30.0, 40.0, 20000.0),
        Star::new(55.0, 25.0, 18000.0),
        Star::new(62.0, 60.0, 16000.0),
        Star::new(38.0, 67.0, 14000.0),
        Star::new(47.0, 50.0, 12000.0),
        Star::new(24.0, 58.0, 10000.0),
        Star::new(70.0, 41.0, 8000.0),
        Star::new(45.0, 33.0, 6000.0),
    ]
}

/// Render gaussian stars (peak = brightness / 4) over a flat background.
/// All three channels get the same value.
pub fn render_stars(height: usize, width: usize, stars: &[Star]) -> Frame {
    let mut data = Array3::<u16>::zeros((height, width, 3));
    for row in 0..height {
        for col in 0..width {
            let mut v = BACKGROUND;
            for s in stars {
                let dr = row as f64 - s.row;
                let dc = col as f64 - s.col;
                let d2 = dr * dr + dc * dc;
                v += s.brightness / 4.0 * (-d2 / (2.0 * STAR_SIGMA * STAR_SIGMA)).exp();
            }
            let v = v.round().clamp(0.0, 65535.0) as u16;
            for ch in 0..3 {
                data[[row, col, ch]] = v;
            }
        }
    }
    Frame::new(data)
}

/// `center + R(angle) * (p - center) + shift` for every star.
pub fn rotate_stars(
    stars: &[Star],
    center: (f64, f64),
    angle: f64,
    shift: (f64, f64),
) -> Vec<Star> {
    stars
        .iter()
        .map(|s| {
            let (r, c) = rotate_point((s.row, s.col), center, angle, shift);
            Star::new(r, c, s.brightness)
        })
        .collect()
}

pub fn rotate_point(
    p: (f64, f64),
    center: (f64, f64),
    angle: f64,
    shift: (f64, f64),
) -> (f64, f64) {
    let (sin, cos) = angle.sin_cos();
    let dr = p.0 - center.0;
    let dc = p.1 - center.1;
    (
        center.0 + dr * cos - dc * sin + shift.0,
        center.1 + dr * sin + dc * cos + shift.1,
    )
}

/// 90° rotation about `center` plus an integer shift, computed without
/// trigonometry so positions stay exact.
pub fn quarter_turn(stars: &[Star], center: (f64, f64), shift: (f64, f64)) -> Vec<Star> {
    stars
        .iter()
        .map(|s| {
            let dr = s.row - center.0;
            let dc = s.col - center.1;
            Star::new(center.0 - dc + shift.0, center.1 + dr + shift.1, s.brightness)
        })
        .collect()
}

/// A rendered frame already marked normalized and solved.
pub fn solved_frame(height: usize, width: usize, stars: &[Star]) -> Frame {
    let mut frame = render_stars(height, width, stars);
    frame.status.normalized = true;
    frame.set_stars(StarList::brightest(stars.to_vec()));
    frame
}

/// Five points on a circle of radius `radius` around `center`, 72° apart.
pub fn pentagon(center: (f64, f64), radius: f64) -> Vec<(f64, f64)> {
    (0..5)
        .map(|k| {
            let a = k as f64 * 72f64.to_radians();
            (center.0 + radius * a.cos(), center.1 + radius * a.sin())
        })
        .collect()
}

/// Write a star sidecar next to `image`.
pub fn write_sidecar(image: &Path, stars: &[Star], scale_arcsec: Option<f64>) {
    let sidecar = StarSidecar {
        scale_arcsec,
        stars: stars.to_vec(),
    };
    save_star_sidecar(&sidecar_path(image), &sidecar).unwrap();
}
