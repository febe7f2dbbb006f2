//! Extractor parameters and runtime configuration.
//!
//! `ExtractorParams` carries every knob of the segmentation pipeline with
//! defaults tuned for millimetre-scale structured-light depth (e.g. Kinect-
//! class sensors at VGA resolution). For interoperability with existing tool
//! chains the parameters can also be parsed from a string-keyed dictionary
//! via [`ExtractorParams::from_key_values`].

use crate::error::ExtractorError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Parameters controlling the segmentation pipeline.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ExtractorParams {
    /// Cell edge length in pixels.
    pub patch_size: usize,
    /// Bins per spherical coordinate in the normal histogram.
    pub histogram_bins_per_coord: usize,
    /// Cosine threshold for normal agreement during growing and merging.
    pub min_cos_angle_for_merge: f64,
    /// Maximum squared plane distance for merging (also caps the per-cell
    /// growing tolerance).
    pub max_merge_dist: f64,
    /// Minimum histogram peak size required to seed a region.
    pub min_region_growing_candidate_size: usize,
    /// Minimum number of activated cells in a kept region.
    pub min_region_growing_cells_activated: usize,
    /// Minimum eigenvalue ratio (largest / smallest) for a kept region.
    pub min_region_planarity_score: f64,
    /// Run the per-pixel refinement stage.
    pub do_refinement: bool,
    /// Scales a plane's MSE into the per-pixel refinement tolerance.
    pub refinement_multiplier_coeff: f64,
    /// Quadratic coefficient of the depth-noise model.
    pub depth_sigma_coeff: f64,
    /// Additive margin of the depth-noise model.
    pub depth_sigma_margin: f64,
    /// Minimum number of valid points for a cell to be considered.
    pub min_pts_per_cell: usize,
    /// Maximum |dz| between adjacent depths along a cell's middle scan lines.
    pub depth_discontinuity_threshold: f32,
    /// Maximum tolerated discontinuities per scan line.
    pub max_number_depth_discontinuity: usize,
}

impl Default for ExtractorParams {
    fn default() -> Self {
        Self {
            patch_size: 12,
            histogram_bins_per_coord: 20,
            min_cos_angle_for_merge: 0.93,
            max_merge_dist: 500.0,
            min_region_growing_candidate_size: 5,
            min_region_growing_cells_activated: 4,
            min_region_planarity_score: 50.0,
            do_refinement: true,
            refinement_multiplier_coeff: 15.0,
            depth_sigma_coeff: 1.425e-6,
            depth_sigma_margin: 10.0,
            min_pts_per_cell: 3,
            depth_discontinuity_threshold: 160.0,
            max_number_depth_discontinuity: 1,
        }
    }
}

impl ExtractorParams {
    /// Builds parameters from the legacy string-keyed dictionary. Keys not in
    /// the dictionary keep their defaults; unknown keys and unparsable values
    /// are rejected.
    pub fn from_key_values(values: &HashMap<String, String>) -> Result<Self, ExtractorError> {
        let mut params = Self::default();
        for (key, value) in values {
            match key.as_str() {
                "patchSize" => params.patch_size = parse(key, value)?,
                "histogramBinsPerCoord" => params.histogram_bins_per_coord = parse(key, value)?,
                "minCosAngleForMerge" => params.min_cos_angle_for_merge = parse(key, value)?,
                "maxMergeDist" => params.max_merge_dist = parse(key, value)?,
                "minRegionGrowingCandidateSize" => {
                    params.min_region_growing_candidate_size = parse(key, value)?
                }
                "minRegionGrowingCellsActivated" => {
                    params.min_region_growing_cells_activated = parse(key, value)?
                }
                "minRegionPlanarityScore" => {
                    params.min_region_planarity_score = parse(key, value)?
                }
                "doRefinement" => params.do_refinement = parse(key, value)?,
                "refinementMultiplierCoeff" => {
                    params.refinement_multiplier_coeff = parse(key, value)?
                }
                "depthSigmaCoeff" => params.depth_sigma_coeff = parse(key, value)?,
                "depthSigmaMargin" => params.depth_sigma_margin = parse(key, value)?,
                "minPtsPerCell" => params.min_pts_per_cell = parse(key, value)?,
                "depthDiscontinuityThreshold" => {
                    params.depth_discontinuity_threshold = parse(key, value)?
                }
                "maxNumberDepthDiscontinuity" => {
                    params.max_number_depth_discontinuity = parse(key, value)?
                }
                other => return Err(ExtractorError::UnknownConfigKey(other.to_string())),
            }
        }
        Ok(params)
    }

    /// Checks internal consistency; called by `PlaneExtractor::new`.
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.patch_size == 0 {
            return Err(ExtractorError::InvalidConfig(
                "patch_size must be positive".into(),
            ));
        }
        if self.histogram_bins_per_coord < 2 {
            return Err(ExtractorError::InvalidConfig(
                "histogram_bins_per_coord must be at least 2".into(),
            ));
        }
        if !(self.min_cos_angle_for_merge > 0.0 && self.min_cos_angle_for_merge <= 1.0) {
            return Err(ExtractorError::InvalidConfig(
                "min_cos_angle_for_merge must lie in (0, 1]".into(),
            ));
        }
        if !(self.max_merge_dist > 0.0) {
            return Err(ExtractorError::InvalidConfig(
                "max_merge_dist must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ExtractorError> {
    value
        .trim()
        .parse()
        .map_err(|_| ExtractorError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

#[derive(Clone, Default, Deserialize)]
pub struct OutputConfig {
    pub labels_out: Option<PathBuf>,
    pub json_out: Option<PathBuf>,
    pub debug_dir: Option<PathBuf>,
}

/// Configuration file consumed by the CLI.
#[derive(Clone, Deserialize)]
pub struct RuntimeConfig {
    pub intrinsics: crate::depth::Intrinsics,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub params: ExtractorParams,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}
