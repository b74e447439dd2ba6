use ndarray::ArrayView2;

use crate::consts::WHITE_LEVEL;

/// Number of bins of a full 16-bit histogram.
pub const HISTOGRAM_BINS: usize = WHITE_LEVEL as usize + 1;

/// One bin per 16-bit level.
pub fn channel_histogram(channel: ArrayView2<'_, u16>) -> Vec<u64> {
    let mut hist = vec![0u64; HISTOGRAM_BINS];
    for &v in channel.iter() {
        hist[v as usize] += 1;
    }
    hist
}

/// Most populated level, ignoring the clipped extremes (0 and white).
///
/// Ties resolve to the lowest level. Returns `None` when every pixel sits at
/// an extreme.
pub fn background_peak(hist: &[u64]) -> Option<u16> {
    let upper = hist.len().min(HISTOGRAM_BINS).saturating_sub(1);
    let mut best: Option<(usize, u64)> = None;
    for (level, &count) in hist.iter().enumerate().take(upper).skip(1) {
        if count > 0 && best.map_or(true, |(_, c)| count > c) {
            best = Some((level, count));
        }
    }
    best.map(|(level, _)| level as u16)
}
