//! SIFT-style keypoints: difference-of-Gaussians extrema with 128-d
//! gradient-histogram descriptors.
//!
//! Pipeline
//! - [`scale_space`]: optional 2× upsampling, base blur, octaves of
//!   `layers + 3` Gaussian images and their differences.
//! - [`extrema`]: 26-neighbourhood extrema, sub-pixel refinement, contrast and
//!   edge-response rejection.
//! - [`orientation`]: one keypoint per dominant gradient direction.
//! - [`descriptor`]: 4×4×8 histogram, normalised and clamped at 0.2.
//!
//! Parameters mirror the classic detector knobs; all are fixed when the
//! extractor is constructed.

pub mod descriptor;
pub mod extrema;
pub mod orientation;
pub mod scale_space;

use super::{DescriptorSet, FeatureExtractor, Features, Keypoint};
use crate::image::ImageF32;
use extrema::Extremum;
use log::debug;
use rayon::prelude::*;
use scale_space::ScaleSpace;
use serde::Deserialize;

pub use descriptor::DESCRIPTOR_LEN;

/// Detector configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiftParams {
    /// Keep only the strongest `max_features` keypoints (0 keeps all).
    pub max_features: usize,
    /// Sampled scales per octave.
    pub octave_layers: usize,
    /// Minimum |DoG| contrast of a refined extremum (intensities in `[0, 1]`).
    pub contrast_threshold: f32,
    /// Maximum principal-curvature ratio before a point counts as an edge.
    pub edge_threshold: f32,
    /// Blur of the base layer of every octave.
    pub sigma: f32,
    /// Double the input resolution before building the scale space.
    pub upsample_input: bool,
}

impl Default for SiftParams {
    fn default() -> Self {
        Self {
            max_features: 0,
            octave_layers: 3,
            contrast_threshold: 0.04,
            edge_threshold: 10.0,
            sigma: 1.6,
            upsample_input: true,
        }
    }
}

/// Keypoint with the octave-relative data needed to describe it.
#[derive(Clone, Copy, Debug)]
struct OrientedPoint {
    extremum: Extremum,
    angle: f32,
}

/// SIFT feature extractor.
#[derive(Clone, Debug, Default)]
pub struct SiftExtractor {
    params: SiftParams,
}

impl SiftExtractor {
    pub fn new(params: SiftParams) -> Self {
        let mut params = params;
        params.octave_layers = params.octave_layers.max(1);
        Self { params }
    }

    pub fn params(&self) -> &SiftParams {
        &self.params
    }

    fn to_keypoint(&self, space: &ScaleSpace, p: &OrientedPoint) -> Keypoint {
        let e = &p.extremum;
        let scale = space.octave_scale(e.octave);
        Keypoint {
            x: e.x * scale,
            y: e.y * scale,
            size: 2.0 * e.scale_in_octave * scale,
            angle: p.angle,
            response: e.response,
            octave: e.octave as i32 - i32::from(space.upsampled),
        }
    }
}

impl FeatureExtractor for SiftExtractor {
    fn detect_and_compute(&self, gray: &ImageF32) -> Features {
        let Some(space) = ScaleSpace::build(gray, &self.params) else {
            debug!(
                "SIFT: image {}x{} too small for a scale space",
                gray.w, gray.h
            );
            return Features::empty(DESCRIPTOR_LEN);
        };

        let extrema = extrema::find_extrema(&space, &self.params);
        let mut oriented: Vec<OrientedPoint> = extrema
            .par_iter()
            .flat_map_iter(|e| {
                let img = space.gaussian(e.octave, e.layer);
                orientation::dominant_orientations(img, e)
                    .into_iter()
                    .map(move |angle| OrientedPoint {
                        extremum: *e,
                        angle,
                    })
            })
            .collect();

        if self.params.max_features > 0 && oriented.len() > self.params.max_features {
            // Stable sort keeps scan order among equal responses.
            oriented.sort_by(|a, b| b.extremum.response.total_cmp(&a.extremum.response));
            oriented.truncate(self.params.max_features);
        }

        let rows: Vec<[f32; DESCRIPTOR_LEN]> = oriented
            .par_iter()
            .map(|p| {
                let e = &p.extremum;
                descriptor::compute(space.gaussian(e.octave, e.layer), e, p.angle)
            })
            .collect();

        let mut descriptors = DescriptorSet::with_capacity(DESCRIPTOR_LEN, rows.len());
        for row in &rows {
            descriptors.push(row);
        }
        let keypoints: Vec<Keypoint> = oriented
            .iter()
            .map(|p| self.to_keypoint(&space, p))
            .collect();

        debug!(
            "SIFT: {}x{} octaves={} extrema={} keypoints={}",
            gray.w,
            gray.h,
            space.octaves.len(),
            extrema.len(),
            keypoints.len()
        );
        Features {
            keypoints,
            descriptors,
        }
    }

    fn name(&self) -> &'static str {
        "SIFT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob_image(w: usize, h: usize, centers: &[(f32, f32, f32)]) -> ImageF32 {
        let mut img = ImageF32::filled(w, h, 0.2);
        for y in 0..h {
            for x in 0..w {
                let mut v = 0.2;
                for &(cx, cy, r) in centers {
                    let d2 = (x as f32 - cx).powi(2) + (y as f32 - cy).powi(2);
                    v += 0.7 * (-d2 / (2.0 * r * r)).exp();
                }
                img.set(x, y, v.min(1.0));
            }
        }
        img
    }

    #[test]
    fn uniform_image_has_no_features() {
        let img = ImageF32::filled(64, 64, 0.5);
        let features = SiftExtractor::default().detect_and_compute(&img);
        assert!(features.is_empty());
        assert!(features.descriptors.is_empty());
    }

    #[test]
    fn tiny_image_has_no_features() {
        let img = ImageF32::filled(4, 4, 0.5);
        assert!(SiftExtractor::default().detect_and_compute(&img).is_empty());
    }

    #[test]
    fn isolated_blob_is_detected_near_its_centre() {
        let img = blob_image(64, 64, &[(32.0, 30.0, 4.0)]);
        let features = SiftExtractor::default().detect_and_compute(&img);
        assert!(!features.is_empty());
        assert_eq!(features.keypoints.len(), features.descriptors.len());
        let best = features
            .keypoints
            .iter()
            .max_by(|a, b| a.response.total_cmp(&b.response))
            .unwrap();
        assert!(
            (best.x - 32.0).abs() < 2.0 && (best.y - 30.0).abs() < 2.0,
            "strongest keypoint at ({}, {})",
            best.x,
            best.y
        );
    }

    #[test]
    fn detection_is_deterministic() {
        let img = blob_image(80, 64, &[(20.0, 20.0, 3.0), (55.0, 40.0, 5.0)]);
        let ex = SiftExtractor::default();
        assert_eq!(ex.detect_and_compute(&img), ex.detect_and_compute(&img));
    }

    #[test]
    fn feature_cap_keeps_strongest_points() {
        let img = blob_image(
            96,
            96,
            &[(20.0, 20.0, 3.0), (70.0, 25.0, 4.0), (30.0, 70.0, 2.5), (72.0, 72.0, 5.0)],
        );
        let all = SiftExtractor::default().detect_and_compute(&img);
        assert!(all.len() > 2);
        let capped = SiftExtractor::new(SiftParams {
            max_features: 2,
            ..Default::default()
        })
        .detect_and_compute(&img);
        assert_eq!(capped.len(), 2);
        let mut responses: Vec<f32> = all.keypoints.iter().map(|k| k.response).collect();
        responses.sort_by(|a, b| b.total_cmp(a));
        for kp in &capped.keypoints {
            assert!(kp.response >= responses[1] - 1e-6);
        }
    }
}
