//! Planar-object tracker: per-frame accept/reject decision against a single
//! registered reference image.
//!
//! Overview
//! - [`Tracker::reconfigure_model`] loads the reference, converts it to gray,
//!   downsamples it `model_pyramid_levels` times, extracts features and
//!   registers the descriptors with the matcher. The reference quad is the
//!   pixel-edge rectangle of the downsampled model.
//! - [`Tracker::process_frame`] runs pyramid → features → kNN (k = 2) →
//!   ratio test → RANSAC homography → corner projection, stopping at the
//!   first stage that rejects.
//! - A rejected frame reports the last accepted quad with the reject flag set.
//!
//! Modules
//! - [`params`] – configuration shared by the tracker stages.
//! - `pipeline` – the generic [`PlanarTracker`] implementation.

pub mod params;
mod pipeline;

use crate::types::{ModelError, TrackOutput};
use image::RgbImage;
use std::path::Path;

pub use params::TrackerParams;
pub use pipeline::PlanarTracker;

/// Tracker interface consumed by the driver.
pub trait Tracker {
    /// Load and register a new reference model, replacing the previous one.
    fn reconfigure_model(&mut self, path: &Path) -> Result<(), ModelError>;

    /// Record the dimensions of upcoming frames.
    fn reinit_frame_size(&mut self, width: u32, height: u32);

    fn process_frame(&mut self, frame: &RgbImage) -> TrackOutput;

    fn name(&self) -> String;
}
