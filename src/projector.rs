//! Reference quad → full-resolution frame quad.
use crate::homography::apply_homography_points;
use crate::pyramid::LevelScaling;
use crate::types::{Quad, RejectReason};
use log::debug;
use nalgebra::Matrix3;

/// Projects the reference corners through a frame homography and lifts them
/// from the downsampled frame level back to full resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerProjector {
    pub scaling: LevelScaling,
    /// Reject non-convex or mirrored projections.
    pub validate_quad: bool,
}

impl CornerProjector {
    pub fn new(frame_pyramid_levels: usize, validate_quad: bool) -> Self {
        Self {
            scaling: LevelScaling::dyadic(frame_pyramid_levels),
            validate_quad,
        }
    }

    pub fn project(&self, h: &Matrix3<f64>, reference: &Quad) -> Result<Quad, RejectReason> {
        let Some(pts) = apply_homography_points(h, &reference.corners()) else {
            debug!("CornerProjector: corner mapped to infinity");
            return Err(RejectReason::ProjectionFailed);
        };
        let quad = Quad::from_corners([
            self.scaling.to_full(pts[0]),
            self.scaling.to_full(pts[1]),
            self.scaling.to_full(pts[2]),
            self.scaling.to_full(pts[3]),
        ]);
        if self.validate_quad && !is_plausible_view(reference, &quad) {
            debug!("CornerProjector: rejecting implausible quad {:?}", quad.corners());
            return Err(RejectReason::InvalidQuad);
        }
        Ok(quad)
    }
}

/// Convex and wound the same way as the reference (no mirror image).
fn is_plausible_view(reference: &Quad, projected: &Quad) -> bool {
    projected.is_convex() && projected.signed_area() * reference.signed_area() > 0.0
}
