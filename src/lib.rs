#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod diagnostics;
pub mod homography;
pub mod image;
pub mod tracker;
pub mod types;

// Pipeline stages, usable on their own.
pub mod features;
pub mod matching;
pub mod projector;
pub mod pyramid;

// Driver support: frames in, reference artifacts out.
pub mod config;
pub mod dewarp;
pub mod frames;
pub mod logging;
pub mod overlay;
pub mod reference;
pub mod viewer;

// --- High-level re-exports -------------------------------------------------

// Main entry points: tracker + results.
pub use crate::tracker::{PlanarTracker, Tracker, TrackerParams};
pub use crate::types::{CornerName, ModelError, Quad, RejectReason, TrackOutput};

// Per-frame diagnostics returned by the tracker.
pub use crate::diagnostics::FrameReport;

// Homography helpers that are generally useful.
pub use crate::homography::{apply_homography_points, perspective_transform};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use doc_reference::prelude::*;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut tracker = PlanarTracker::sift_bf();
/// tracker.reconfigure_model(Path::new("document.png"))?;
///
/// let frame = image::open("frame_0001.png")?.into_rgb8();
/// tracker.reinit_frame_size(frame.width(), frame.height());
/// let out = tracker.process_frame(&frame);
/// if let (false, Some(quad)) = (out.rejected, out.quad) {
///     for (name, x, y) in quad.points() {
///         println!("{name}: ({x:.1}, {y:.1})");
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::features::{FeatureExtractor, SiftExtractor, SiftParams};
    pub use crate::matching::{BruteForceMatcher, DescriptorMatcher};
    pub use crate::{PlanarTracker, Quad, RejectReason, TrackOutput, Tracker, TrackerParams};
}
