//! Flat-field normalization: removal of smooth per-channel background
//! gradients followed by alignment of each channel's histogram peak.

pub mod histogram;
pub mod normalizer;
pub mod polyfit;

pub use histogram::{background_peak, channel_histogram};
pub use normalizer::{correct_channel, normalize_frame, sample_grid};
pub use polyfit::{fit_poly2d, Poly2D};
