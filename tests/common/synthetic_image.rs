use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Gray level around the document in generated frames.
pub const BACKGROUND: u8 = 40;

struct Blob {
    cx: f32,
    cy: f32,
    sigma: f32,
    amp: f32,
}

/// Analytic document texture: Gaussian blobs of mixed size and polarity on a
/// mid-gray paper, so it can be rendered at any scale without resampling.
pub struct SyntheticDocument {
    size: u32,
    blobs: Vec<Blob>,
}

impl SyntheticDocument {
    pub fn new(seed: u64, size: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let s = size as f32;
        let count = (size * size / 160).max(8) as usize;
        let blobs = (0..count)
            .map(|_| {
                let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                Blob {
                    cx: rng.gen_range(4.0..s - 4.0),
                    cy: rng.gen_range(4.0..s - 4.0),
                    sigma: rng.gen_range(1.8..5.0),
                    amp: sign * rng.gen_range(60.0..110.0),
                }
            })
            .collect();
        Self { size, blobs }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Intensity at continuous document coordinates (pixel `i` spans `[i, i+1)`).
    fn intensity(&self, u: f32, v: f32) -> f32 {
        let mut value = 128.0;
        for b in &self.blobs {
            let d2 = (u - b.cx).powi(2) + (v - b.cy).powi(2);
            value += b.amp * (-d2 / (2.0 * b.sigma * b.sigma)).exp();
        }
        value.clamp(0.0, 255.0)
    }

    fn shade(value: f32) -> Rgb<u8> {
        Rgb([
            value as u8,
            (value * 0.9 + 12.0) as u8,
            (value * 0.8 + 25.0) as u8,
        ])
    }

    pub fn reference(&self) -> RgbImage {
        RgbImage::from_fn(self.size, self.size, |x, y| {
            Self::shade(self.intensity(x as f32 + 0.5, y as f32 + 0.5))
        })
    }

    /// Frame showing the document scaled by `scale` with its top-left corner
    /// at `offset`; everything else is [`BACKGROUND`].
    pub fn frame(&self, width: u32, height: u32, scale: f32, offset: (f32, f32)) -> RgbImage {
        let s = self.size as f32;
        RgbImage::from_fn(width, height, |x, y| {
            let u = (x as f32 + 0.5 - offset.0) / scale;
            let v = (y as f32 + 0.5 - offset.1) / scale;
            if (0.0..s).contains(&u) && (0.0..s).contains(&v) {
                Self::shade(self.intensity(u, v))
            } else {
                Rgb([BACKGROUND; 3])
            }
        })
    }
}

pub fn uniform_frame(width: u32, height: u32, value: u8) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([value; 3]))
}
