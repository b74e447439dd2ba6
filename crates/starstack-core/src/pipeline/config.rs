use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_BRIGHTNESS_RADIUS, DEFAULT_DETECT_MAX_AREA, DEFAULT_DETECT_MIN_AREA,
    DEFAULT_DETECT_SIGMA, DEFAULT_FLAT_GRID_STEP, DEFAULT_FLAT_MARGIN, DEFAULT_MATCH_EPSILON,
    DEFAULT_STACK_TOLERANCE, MAX_STARS,
};
use crate::error::{Result, StarstackError};

/// Full configuration of a batch run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Exposures to process, in order. The first frame that solves becomes
    /// the alignment reference unless the session already holds one.
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    /// Directory receiving per-frame snapshots.
    pub workdir: PathBuf,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub flat: FlatConfig,
    #[serde(default)]
    pub matching: MatchConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub stacking: StackingConfig,
}

impl BatchConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| StarstackError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.flat.grid_step == 0 {
            return Err(StarstackError::InvalidConfig(
                "flat.grid_step must be positive".into(),
            ));
        }
        if !(self.matching.epsilon > 0.0) {
            return Err(StarstackError::InvalidConfig(
                "matching.epsilon must be positive".into(),
            ));
        }
        if self.matching.max_stars < crate::consts::ASTERISM_SIZE {
            return Err(StarstackError::InvalidConfig(format!(
                "matching.max_stars must be at least {}",
                crate::consts::ASTERISM_SIZE
            )));
        }
        if !(self.stacking.tolerance >= 0.0) {
            return Err(StarstackError::InvalidConfig(
                "stacking.tolerance must be non-negative".into(),
            ));
        }
        if let Some(scale) = self.solver.scale_arcsec {
            if !(scale > 0.0) {
                return Err(StarstackError::InvalidConfig(
                    "solver.scale_arcsec must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: PathBuf::from("stacked.tiff"),
            workdir: PathBuf::from("snapshots"),
            solver: SolverConfig::default(),
            flat: FlatConfig::default(),
            matching: MatchConfig::default(),
            registration: RegistrationConfig::default(),
            stacking: StackingConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub method: SolverMethod,
    /// Expected pixel scale in arcsec/pixel. Solutions outside 80%..120% of
    /// it are rejected.
    pub scale_arcsec: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum SolverMethod {
    /// Read `<stem>.stars.toml` next to each image.
    #[default]
    Sidecar,
    /// Run the built-in threshold detector.
    Detect(DetectConfig),
}

impl fmt::Display for SolverMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sidecar => write!(f, "Sidecar star list"),
            Self::Detect(d) => write!(f, "Detect (sigma={:.1})", d.sigma),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectConfig {
    /// Detection threshold above background, in noise units.
    pub sigma: f64,
    pub min_area: usize,
    pub max_area: usize,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_DETECT_SIGMA,
            min_area: DEFAULT_DETECT_MIN_AREA,
            max_area: DEFAULT_DETECT_MAX_AREA,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlatConfig {
    /// Border excluded from background sampling.
    pub margin: usize,
    /// Sampling grid stride in pixels.
    pub grid_step: usize,
}

impl Default for FlatConfig {
    fn default() -> Self {
        Self {
            margin: DEFAULT_FLAT_MARGIN,
            grid_step: DEFAULT_FLAT_GRID_STEP,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Acceptance threshold on the fingerprint distance.
    pub epsilon: f64,
    /// Stars kept per frame before fingerprinting.
    pub max_stars: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_MATCH_EPSILON,
            max_stars: MAX_STARS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Half-size of the window used to re-measure star brightness.
    pub brightness_radius: usize,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            brightness_radius: DEFAULT_BRIGHTNESS_RADIUS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StackingConfig {
    /// Samples further than `tolerance * stdev` from the mean are rejected.
    pub tolerance: f64,
}

impl Default for StackingConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_STACK_TOLERANCE,
        }
    }
}
