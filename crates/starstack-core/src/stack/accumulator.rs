use ndarray::{Array3, Zip};

use crate::consts::{PARALLEL_PIXEL_THRESHOLD, WHITE_LEVEL};

/// First-pass accumulator: running mean and sum of squared deviations
/// (Welford's online update) for every pixel and channel.
pub struct StackAccumulator {
    mean: Array3<f64>,
    m2: Array3<f64>,
    frames: usize,
}

/// Per-pixel statistics after the first pass.
#[derive(Clone, Debug)]
pub struct StackStatistics {
    pub mean: Array3<f64>,
    /// Population standard deviation, `sqrt(m2 / n)`.
    pub stdev: Array3<f64>,
    pub frames: usize,
}

impl StackAccumulator {
    pub fn new(shape: (usize, usize, usize)) -> Self {
        Self {
            mean: Array3::zeros(shape),
            m2: Array3::zeros(shape),
            frames: 0,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn push(&mut self, data: &Array3<u16>) {
        self.frames += 1;
        let n = self.frames as f64;
        let update = |m: &mut f64, s: &mut f64, &x: &u16| {
            let x = x as f64;
            let delta = x - *m;
            *m += delta / n;
            *s += delta * (x - *m);
        };

        let zip = Zip::from(&mut self.mean).and(&mut self.m2).and(data);
        if is_large(data) {
            zip.par_for_each(update);
        } else {
            zip.for_each(update);
        }
    }

    pub fn finish(self) -> StackStatistics {
        let n = self.frames.max(1) as f64;
        let stdev = self.m2.mapv(|s| (s / n).sqrt());
        StackStatistics {
            mean: self.mean,
            stdev,
            frames: self.frames,
        }
    }
}

/// Second-pass accumulator: sum and count of the samples inside the
/// rejection band.
///
/// A pixel whose samples are all rejected falls back to its first-pass mean.
pub struct MaskedAccumulator {
    sum: Array3<f64>,
    count: Array3<f64>,
    fallback: Array3<f64>,
    tolerance: f64,
}

impl MaskedAccumulator {
    pub fn new(stats: &StackStatistics, tolerance: f64) -> Self {
        let shape = stats.mean.dim();
        Self {
            sum: Array3::zeros(shape),
            count: Array3::zeros(shape),
            fallback: stats.mean.clone(),
            tolerance,
        }
    }

    pub fn push(&mut self, data: &Array3<u16>, stats: &StackStatistics) {
        let tolerance = self.tolerance;
        let update = |sum: &mut f64, count: &mut f64, &x: &u16, &mean: &f64, &stdev: &f64| {
            let x = x as f64;
            if (x - mean).abs() <= tolerance * stdev {
                *sum += x;
                *count += 1.0;
            }
        };

        let zip = Zip::from(&mut self.sum)
            .and(&mut self.count)
            .and(data)
            .and(&stats.mean)
            .and(&stats.stdev);
        if is_large(data) {
            zip.par_for_each(update);
        } else {
            zip.for_each(update);
        }
    }

    /// Number of accepted samples per pixel.
    pub fn accepted(&self) -> Array3<f64> {
        self.count.clone()
    }

    pub fn finish(&self) -> Array3<u16> {
        Zip::from(&self.sum)
            .and(&self.count)
            .and(&self.fallback)
            .map_collect(|&s, &c, &mean| {
                let v = if c > 0.0 { s / c } else { mean };
                v.round().clamp(0.0, WHITE_LEVEL as f64) as u16
            })
    }
}

fn is_large(data: &Array3<u16>) -> bool {
    let (h, w, _) = data.dim();
    h * w >= PARALLEL_PIXEL_THRESHOLD
}
