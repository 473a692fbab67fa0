//! Parameter types configuring the tracker stages.
//!
//! Defaults reproduce the SIFT + brute-force reference configuration. Every
//! field is optional when loading from JSON. Missing fields of a partial
//! `sift` object take the preset values; other nested objects fall back to
//! their own type's defaults.

use crate::features::SiftParams;
use crate::homography::RansacParams;
use serde::{Deserialize, Deserializer};

/// Octave layers used by the reference SIFT configuration.
pub const PRESET_OCTAVE_LAYERS: usize = 10;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerParams {
    /// Downsampling steps applied to the reference image.
    pub model_pyramid_levels: usize,
    /// Downsampling steps applied to every frame.
    pub frame_pyramid_levels: usize,
    /// Lowe ratio: keep a match when `best < ratio * second`.
    pub ratio_threshold: f32,
    /// Minimum matches surviving the ratio test.
    pub min_matches: usize,
    /// Minimum RANSAC inliers.
    pub min_inliers: usize,
    pub ransac: RansacParams,
    /// Reject non-convex or mirrored projected quads.
    pub validate_quad: bool,
    #[serde(deserialize_with = "deserialize_preset_sift")]
    pub sift: SiftParams,
}

/// Detector settings of the SIFT + brute-force preset.
pub fn preset_sift_params() -> SiftParams {
    SiftParams {
        octave_layers: PRESET_OCTAVE_LAYERS,
        ..SiftParams::default()
    }
}

/// `SiftParams` fields as they appear in a params file; absent ones keep the
/// preset value.
#[derive(Deserialize)]
struct SiftOverrides {
    max_features: Option<usize>,
    octave_layers: Option<usize>,
    contrast_threshold: Option<f32>,
    edge_threshold: Option<f32>,
    sigma: Option<f32>,
    upsample_input: Option<bool>,
}

fn deserialize_preset_sift<'de, D>(deserializer: D) -> Result<SiftParams, D::Error>
where
    D: Deserializer<'de>,
{
    let o = SiftOverrides::deserialize(deserializer)?;
    let preset = preset_sift_params();
    Ok(SiftParams {
        max_features: o.max_features.unwrap_or(preset.max_features),
        octave_layers: o.octave_layers.unwrap_or(preset.octave_layers),
        contrast_threshold: o.contrast_threshold.unwrap_or(preset.contrast_threshold),
        edge_threshold: o.edge_threshold.unwrap_or(preset.edge_threshold),
        sigma: o.sigma.unwrap_or(preset.sigma),
        upsample_input: o.upsample_input.unwrap_or(preset.upsample_input),
    })
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            model_pyramid_levels: 1,
            frame_pyramid_levels: 0,
            ratio_threshold: 0.75,
            min_matches: 15,
            min_inliers: 15,
            ransac: RansacParams::default(),
            validate_quad: false,
            sift: preset_sift_params(),
        }
    }
}
