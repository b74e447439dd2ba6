use crate::consts::{ARCSEC_PER_RADIAN_MILLI, SCALE_HIGH_FACTOR, SCALE_LOW_FACTOR};

/// Accepted interval of plate scales, arcsec per pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleRange {
    pub low: f64,
    pub high: f64,
}

impl ScaleRange {
    /// 80%..120% of the expected scale.
    pub fn around(scale: f64) -> Self {
        Self {
            low: scale * SCALE_LOW_FACTOR,
            high: scale * SCALE_HIGH_FACTOR,
        }
    }

    pub fn contains(&self, scale: f64) -> bool {
        scale >= self.low && scale <= self.high
    }
}

/// Image scale in arcsec/pixel for a pixel pitch in µm behind a focal length in mm.
pub fn pixel_scale(pixel_size_um: f64, focal_length_mm: f64) -> f64 {
    pixel_size_um / focal_length_mm * ARCSEC_PER_RADIAN_MILLI
}

/// Field of view along one sensor axis, in arcminutes.
pub fn field_of_view_arcmin(sensor_mm: f64, pixel_size_um: f64, scale: f64) -> f64 {
    let pixels = sensor_mm * 1000.0 / pixel_size_um;
    pixels * scale / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_range_bounds() {
        let range = ScaleRange::around(2.0);
        assert_relative_eq!(range.low, 1.6);
        assert_relative_eq!(range.high, 2.4);
        assert!(range.contains(2.4));
        assert!(!range.contains(2.41));
    }

    #[test]
    fn test_pixel_scale() {
        // 3.76 µm pixels at 1000 mm
        assert_relative_eq!(pixel_scale(3.76, 1000.0), 0.7755564, epsilon = 1e-6);
    }
}
