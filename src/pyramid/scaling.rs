//! Coordinate mapping between a dyadic pyramid level and full resolution.

/// Scale factor between pyramid level `levels` and level 0 (`2^levels`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelScaling {
    pub levels: usize,
    pub scale_to_full: f32,
}

impl LevelScaling {
    pub fn dyadic(levels: usize) -> Self {
        Self {
            levels,
            scale_to_full: (1u64 << levels.min(63)) as f32,
        }
    }

    /// Lift a coordinate measured on the downsampled level to level 0.
    #[inline]
    pub fn to_full(&self, p: [f32; 2]) -> [f32; 2] {
        [p[0] * self.scale_to_full, p[1] * self.scale_to_full]
    }

    /// Map a full-resolution coordinate onto the downsampled level.
    #[inline]
    pub fn from_full(&self, p: [f32; 2]) -> [f32; 2] {
        [p[0] / self.scale_to_full, p[1] / self.scale_to_full]
    }
}
