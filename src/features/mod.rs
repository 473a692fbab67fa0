//! Keypoint detection and description.
//!
//! A [`FeatureExtractor`] turns a grayscale [`ImageF32`] into keypoints plus a
//! row-wise [`DescriptorSet`] of equal length. Any extractor whose descriptors
//! are compared with the L2 norm can be paired with the brute-force matcher in
//! [`crate::matching`]. The crate ships one implementation, [`SiftExtractor`].

pub mod sift;
pub mod types;

use crate::image::ImageF32;

pub use sift::{SiftExtractor, SiftParams};
pub use types::{DescriptorSet, Keypoint};

/// Keypoints and their descriptors (`descriptors.len() == keypoints.len()`).
#[derive(Clone, Debug, PartialEq)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: DescriptorSet,
}

impl Features {
    pub fn empty(descriptor_len: usize) -> Self {
        Self {
            keypoints: Vec::new(),
            descriptors: DescriptorSet::new(descriptor_len),
        }
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Strategy detecting keypoints and computing descriptors on a gray image.
pub trait FeatureExtractor {
    /// Run detection and description. An image without features yields an
    /// empty [`Features`], never an error.
    fn detect_and_compute(&self, gray: &ImageF32) -> Features;

    /// Short identifier used in tracker names and logs.
    fn name(&self) -> &'static str;
}
