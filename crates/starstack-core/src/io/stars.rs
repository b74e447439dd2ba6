//! Star list sidecar files: `<stem>.stars.toml` next to each exposure,
//! written by an external plate solver.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StarstackError};
use crate::frame::Star;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StarSidecar {
    /// Plate scale the solver reported, arcsec per pixel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_arcsec: Option<f64>,
    #[serde(default)]
    pub stars: Vec<Star>,
}

/// `frames/light_001.tiff` -> `frames/light_001.stars.toml`
pub fn sidecar_path(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    image.with_file_name(format!("{stem}.stars.toml"))
}

pub fn load_star_sidecar(path: &Path) -> Result<StarSidecar> {
    let content = fs::read_to_string(path).map_err(|e| StarstackError::FileUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| StarstackError::DecodeFailure {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn save_star_sidecar(path: &Path, sidecar: &StarSidecar) -> Result<()> {
    let content = toml::to_string_pretty(sidecar)
        .map_err(|e| StarstackError::InvalidConfig(e.to_string()))?;
    fs::write(path, content)?;
    Ok(())
}
