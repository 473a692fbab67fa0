use serde::Serialize;
use std::path::PathBuf;

/// Corner identity of a [`Quad`] point, named after the reference corner it
/// was projected from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerName {
    TopLeft,
    BottomLeft,
    BottomRight,
    TopRight,
}

impl CornerName {
    /// Fixed output order: tl, bl, br, tr.
    pub const ALL: [CornerName; 4] = [
        CornerName::TopLeft,
        CornerName::BottomLeft,
        CornerName::BottomRight,
        CornerName::TopRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CornerName::TopLeft => "top_left",
            CornerName::BottomLeft => "bottom_left",
            CornerName::BottomRight => "bottom_right",
            CornerName::TopRight => "top_right",
        }
    }
}

impl std::fmt::Display for CornerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four named points, always stored in tl, bl, br, tr order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Quad {
    pub top_left: [f32; 2],
    pub bottom_left: [f32; 2],
    pub bottom_right: [f32; 2],
    pub top_right: [f32; 2],
}

impl Quad {
    pub fn from_corners(c: [[f32; 2]; 4]) -> Self {
        Self {
            top_left: c[0],
            bottom_left: c[1],
            bottom_right: c[2],
            top_right: c[3],
        }
    }

    /// Pixel-edge corners of a `w × h` image.
    pub fn from_size(w: usize, h: usize) -> Self {
        let (w, h) = (w as f32, h as f32);
        Self::from_corners([[0.0, 0.0], [0.0, h], [w, h], [w, 0.0]])
    }

    pub fn corners(&self) -> [[f32; 2]; 4] {
        [
            self.top_left,
            self.bottom_left,
            self.bottom_right,
            self.top_right,
        ]
    }

    pub fn get(&self, name: CornerName) -> [f32; 2] {
        match name {
            CornerName::TopLeft => self.top_left,
            CornerName::BottomLeft => self.bottom_left,
            CornerName::BottomRight => self.bottom_right,
            CornerName::TopRight => self.top_right,
        }
    }

    /// `(name, x, y)` triples in tl, bl, br, tr order.
    pub fn points(&self) -> [(CornerName, f32, f32); 4] {
        CornerName::ALL.map(|name| {
            let [x, y] = self.get(name);
            (name, x, y)
        })
    }

    pub fn scaled(&self, s: f32) -> Self {
        Self::from_corners(self.corners().map(|[x, y]| [x * s, y * s]))
    }

    /// Shoelace area; positive for tl→bl→br→tr in image axes (y down).
    pub fn signed_area(&self) -> f32 {
        let c = self.corners();
        let mut acc = 0.0;
        for i in 0..4 {
            let [x0, y0] = c[i];
            let [x1, y1] = c[(i + 1) % 4];
            acc += x0 * y1 - x1 * y0;
        }
        -0.5 * acc
    }

    /// Strictly convex (all turns share one sign, none degenerate).
    pub fn is_convex(&self) -> bool {
        let c = self.corners();
        let mut sign = 0.0f32;
        for i in 0..4 {
            let [ax, ay] = c[i];
            let [bx, by] = c[(i + 1) % 4];
            let [cx, cy] = c[(i + 2) % 4];
            let cross = (bx - ax) * (cy - by) - (by - ay) * (cx - bx);
            if !cross.is_finite() || cross == 0.0 {
                return false;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }
}

/// Why a frame produced no new quad.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RejectReason {
    NoModel,
    NoDescriptors,
    InsufficientMatches {
        found: usize,
        required: usize,
    },
    InsufficientInliers {
        inliers: usize,
        required: usize,
        matches: usize,
    },
    ProjectionFailed,
    InvalidQuad,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NoModel => write!(f, "no reference model registered"),
            RejectReason::NoDescriptors => write!(f, "no descriptors in frame"),
            RejectReason::InsufficientMatches { found, required } => {
                write!(f, "insufficient matches ({found} < {required})")
            }
            RejectReason::InsufficientInliers {
                inliers,
                required,
                matches,
            } => write!(
                f,
                "insufficient inliers ({inliers} < {required}, {matches} matches)"
            ),
            RejectReason::ProjectionFailed => write!(f, "corner projection failed"),
            RejectReason::InvalidQuad => write!(f, "projected quad is not a valid view"),
        }
    }
}

/// Result of one `process_frame` call.
///
/// On reject, `quad` still holds the last accepted quad (if any).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackOutput {
    pub rejected: bool,
    pub quad: Option<Quad>,
    pub reason: Option<RejectReason>,
}

impl TrackOutput {
    pub fn accepted(quad: Quad) -> Self {
        Self {
            rejected: false,
            quad: Some(quad),
            reason: None,
        }
    }

    pub fn rejected(last: Option<Quad>, reason: RejectReason) -> Self {
        Self {
            rejected: true,
            quad: last,
            reason: Some(reason),
        }
    }

    pub fn is_accepted(&self) -> bool {
        !self.rejected
    }
}

/// Failure to (re)configure the reference model.
#[derive(Debug)]
pub enum ModelError {
    Unreadable { path: PathBuf, reason: String },
    EmptyImage { width: u32, height: u32 },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Unreadable { path, reason } => {
                write!(f, "Failed to read reference image {}: {reason}", path.display())
            }
            ModelError::EmptyImage { width, height } => {
                write!(f, "reference image is empty ({width}x{height})")
            }
        }
    }
}

impl std::error::Error for ModelError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_points_keep_corner_order() {
        let q = Quad::from_size(4, 3);
        let names: Vec<_> = q.points().iter().map(|p| p.0).collect();
        assert_eq!(names, CornerName::ALL.to_vec());
        assert_eq!(q.points()[2], (CornerName::BottomRight, 4.0, 3.0));
    }

    #[test]
    fn reference_quad_is_convex_with_positive_area() {
        let q = Quad::from_size(10, 5);
        assert!(q.is_convex());
        assert!((q.signed_area() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn bow_tie_is_not_convex() {
        let q = Quad::from_corners([[0.0, 0.0], [10.0, 10.0], [0.0, 10.0], [10.0, 0.0]]);
        assert!(!q.is_convex());
    }

    #[test]
    fn mirrored_quad_flips_area_sign() {
        let q = Quad::from_corners([[10.0, 0.0], [10.0, 5.0], [0.0, 5.0], [0.0, 0.0]]);
        assert!(q.is_convex());
        assert!(q.signed_area() < 0.0);
    }
}
