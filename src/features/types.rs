use serde::Serialize;

/// Interest point located on one image.
///
/// Coordinates are in pixels of the image handed to the extractor, `size` is
/// the diameter of the meaningful neighbourhood and `angle` the dominant
/// gradient orientation in radians within `[0, 2π)` (image axes, y down).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub angle: f32,
    pub response: f32,
    pub octave: i32,
}

impl Keypoint {
    #[inline]
    pub fn pt(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}

/// Fixed-length descriptor vectors stored contiguously, one row per keypoint.
#[derive(Clone, Debug, PartialEq)]
pub struct DescriptorSet {
    dim: usize,
    data: Vec<f32>,
}

impl DescriptorSet {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    pub fn with_capacity(dim: usize, rows: usize) -> Self {
        Self {
            dim,
            data: Vec::with_capacity(dim * rows),
        }
    }

    /// Build from rows that must all have length `dim`.
    pub fn from_rows(dim: usize, rows: &[Vec<f32>]) -> Option<Self> {
        let mut set = Self::with_capacity(dim, rows.len());
        for row in rows {
            if row.len() != dim {
                return None;
            }
            set.data.extend_from_slice(row);
        }
        Some(set)
    }

    /// Append one descriptor. Returns `false` (and stores nothing) on a length mismatch.
    pub fn push(&mut self, row: &[f32]) -> bool {
        if row.len() != self.dim {
            return false;
        }
        self.data.extend_from_slice(row);
        true
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(self.dim.max(1))
    }
}

/// Euclidean distance between two descriptor rows.
#[inline]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}
