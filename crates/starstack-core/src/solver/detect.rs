use std::path::Path;

use ndarray::{Array2, Axis};
use tracing::debug;

use crate::consts::{ASTERISM_SIZE, MAX_STARS};
use crate::error::{Result, StarstackError};
use crate::frame::{Frame, Star, StarList};
use crate::pipeline::config::DetectConfig;

use super::PlateSolver;

/// Scale factor turning a median absolute deviation into a Gaussian sigma.
const MAD_TO_SIGMA: f64 = 1.4826;

/// Built-in threshold detector, used when no external solver output exists.
#[derive(Clone, Debug)]
pub struct DetectingSolver {
    pub config: DetectConfig,
    pub max_stars: usize,
}

impl DetectingSolver {
    pub fn new(config: DetectConfig, max_stars: usize) -> Self {
        Self { config, max_stars }
    }
}

impl Default for DetectingSolver {
    fn default() -> Self {
        Self::new(DetectConfig::default(), MAX_STARS)
    }
}

impl PlateSolver for DetectingSolver {
    fn solve(&self, frame: &Frame, _source: &Path) -> Result<StarList> {
        let stars = detect_stars(frame, &self.config);
        if stars.len() < ASTERISM_SIZE {
            return Err(StarstackError::SolveFailure(format!(
                "detected {} stars, need {ASTERISM_SIZE}",
                stars.len()
            )));
        }
        Ok(StarList::new(stars, self.max_stars))
    }
}

struct Blob {
    area: usize,
    flux: f64,
    row_moment: f64,
    col_moment: f64,
}

/// Find star-like blobs in the luminance of `frame`, unsorted.
pub fn detect_stars(frame: &Frame, config: &DetectConfig) -> Vec<Star> {
    let lum = luminance(frame);
    if lum.is_empty() {
        return Vec::new();
    }

    let (background, noise) = background_and_noise(&lum);
    // A perfectly flat background has zero MAD; keep one count of headroom.
    let threshold = background + config.sigma * noise.max(1.0);
    let mask = lum.mapv(|v| v > threshold);
    let (labels, count) = label_components(&mask);

    let mut blobs: Vec<Blob> = (0..count)
        .map(|_| Blob {
            area: 0,
            flux: 0.0,
            row_moment: 0.0,
            col_moment: 0.0,
        })
        .collect();

    for ((row, col), &label) in labels.indexed_iter() {
        if label == 0 {
            continue;
        }
        let signal = lum[[row, col]] - background;
        let blob = &mut blobs[label as usize - 1];
        blob.area += 1;
        blob.flux += signal;
        blob.row_moment += signal * row as f64;
        blob.col_moment += signal * col as f64;
    }

    let stars: Vec<Star> = blobs
        .into_iter()
        .filter(|b| b.area >= config.min_area && b.area <= config.max_area && b.flux > 0.0)
        .map(|b| Star::new(b.row_moment / b.flux, b.col_moment / b.flux, b.flux))
        .collect();

    debug!(
        background,
        noise,
        threshold,
        components = count,
        stars = stars.len(),
        "Star detection"
    );
    stars
}

fn luminance(frame: &Frame) -> Array2<f64> {
    frame
        .data
        .map(|&v| v as f64)
        .mean_axis(Axis(2))
        .unwrap_or_else(|| Array2::zeros((frame.height(), frame.width())))
}

/// Median background level and MAD-derived noise.
fn background_and_noise(lum: &Array2<f64>) -> (f64, f64) {
    let mut values: Vec<f64> = lum.iter().copied().collect();
    let background = median(&mut values);
    let mut deviations: Vec<f64> = lum.iter().map(|v| (v - background).abs()).collect();
    let mad = median(&mut deviations);
    (background, mad * MAD_TO_SIGMA)
}

fn median(values: &mut [f64]) -> f64 {
    let mid = values.len() / 2;
    let (_, m, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    *m
}

/// Two-pass union-find labelling with 8-connectivity.
///
/// Returns a label grid (0 = background, 1..=count compact labels) and the
/// number of components.
fn label_components(mask: &Array2<bool>) -> (Array2<u32>, usize) {
    let (h, w) = mask.dim();
    let mut labels = Array2::<u32>::zeros((h, w));
    // Index 0 unused; provisional labels start at 1.
    let mut parent: Vec<u32> = vec![0];

    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }

            let mut neighbours = [0u32; 4];
            if col > 0 {
                neighbours[0] = labels[[row, col - 1]];
            }
            if row > 0 {
                if col > 0 {
                    neighbours[1] = labels[[row - 1, col - 1]];
                }
                neighbours[2] = labels[[row - 1, col]];
                if col + 1 < w {
                    neighbours[3] = labels[[row - 1, col + 1]];
                }
            }

            match neighbours.iter().copied().filter(|&l| l > 0).min() {
                None => {
                    let label = parent.len() as u32;
                    parent.push(label);
                    labels[[row, col]] = label;
                }
                Some(smallest) => {
                    labels[[row, col]] = smallest;
                    for &other in neighbours.iter().filter(|&&l| l > 0 && l != smallest) {
                        union(&mut parent, smallest, other);
                    }
                }
            }
        }
    }

    // Compact roots to 1..=count.
    let mut compact = vec![0u32; parent.len()];
    let mut count = 0usize;
    for label in 1..parent.len() {
        let root = find(&parent, label as u32) as usize;
        if compact[root] == 0 {
            count += 1;
            compact[root] = count as u32;
        }
        compact[label] = compact[root];
    }

    labels.mapv_inplace(|l| compact[l as usize]);
    (labels, count)
}

fn find(parent: &[u32], mut x: u32) -> u32 {
    while parent[x as usize] != x {
        x = parent[x as usize];
    }
    x
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[big as usize] = small;
    }
}
