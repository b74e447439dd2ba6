/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Number of channels in a frame (R, G, B).
pub const COLOR_CHANNEL_COUNT: usize = 3;

/// Maximum representable pixel value of the 16-bit frame storage.
pub const WHITE_LEVEL: u16 = u16::MAX;

/// Background level the flat-field normalizer recenters every channel on
/// (one tenth of the white level).
pub const RECENTER_OFFSET: f64 = WHITE_LEVEL as f64 / 10.0;

/// Maximum number of stars kept per frame, brightest first.
pub const MAX_STARS: usize = 20;

/// Number of stars in one asterism.
pub const ASTERISM_SIZE: usize = 5;

/// Number of pairwise distances among the stars of an asterism: C(5,2).
pub const FINGERPRINT_LEN: usize = 10;

/// Nearest-neighbour distance below which a fingerprint match is accepted.
pub const DEFAULT_MATCH_EPSILON: f64 = 1e-3;

/// Half-size of the square window used to re-measure star brightness after
/// registration (window is `2 * radius + 1` pixels wide).
pub const DEFAULT_BRIGHTNESS_RADIUS: usize = 30;

/// Border excluded from flat-field background sampling.
pub const DEFAULT_FLAT_MARGIN: usize = 10;

/// Stride of the flat-field background sampling grid.
pub const DEFAULT_FLAT_GRID_STEP: usize = 200;

/// Number of coefficients of a 2nd-degree two-variable polynomial.
pub const POLY2D_TERMS: usize = 6;

/// Per-pixel rejection band of the robust stacker, in standard deviations.
pub const DEFAULT_STACK_TOLERANCE: f64 = 1.5;

/// Lower/upper bounds of the accepted plate-solve scale, as a fraction of the
/// expected pixel scale.
pub const SCALE_LOW_FACTOR: f64 = 0.8;
pub const SCALE_HIGH_FACTOR: f64 = 1.2;

/// Arcseconds per radian divided by 1000 (µm pixel / mm focal length).
pub const ARCSEC_PER_RADIAN_MILLI: f64 = 206.265;

/// Default detection threshold of the built-in star detector, in units of
/// background noise.
pub const DEFAULT_DETECT_SIGMA: f64 = 5.0;

/// Smallest connected component accepted as a star by the built-in detector.
pub const DEFAULT_DETECT_MIN_AREA: usize = 3;

/// Largest connected component accepted as a star by the built-in detector.
pub const DEFAULT_DETECT_MAX_AREA: usize = 2_500;

/// File extension of persisted frame snapshots.
pub const SNAPSHOT_EXTENSION: &str = "stsnap";
