//! Separable 1D filters applied along rows then columns.
//!
//! Borders replicate the outermost sample. The same machinery serves the
//! binomial `pyrDown` kernel and the Gaussian kernels of the SIFT scale space.
use crate::image::{ImageF32, ImageView, ImageViewMut};

/// Trait implemented by separable 1D filters.
pub trait SeparableFilter {
    /// Return the 1D taps (in left-to-right order). The kernel is assumed to be
    /// symmetric around its centre, but the implementation does not rely on it.
    fn taps(&self) -> &[f32];
}

/// Simple wrapper around a static filter kernel.
#[derive(Clone, Copy, Debug)]
pub struct StaticSeparableFilter {
    taps: &'static [f32],
}

impl Default for StaticSeparableFilter {
    fn default() -> Self {
        GAUSSIAN_5TAP
    }
}

impl StaticSeparableFilter {
    pub const fn new(taps: &'static [f32]) -> Self {
        Self { taps }
    }
}

impl SeparableFilter for StaticSeparableFilter {
    #[inline]
    fn taps(&self) -> &[f32] {
        self.taps
    }
}

/// Normalised 5-tap Gaussian filter `[1, 4, 6, 4, 1] / 16`.
pub const GAUSSIAN_5TAP: StaticSeparableFilter =
    StaticSeparableFilter::new(&[0.0625, 0.25, 0.375, 0.25, 0.0625]);

/// Sampled Gaussian kernel of arbitrary sigma, normalised to unit sum.
#[derive(Clone, Debug)]
pub struct GaussianKernel {
    sigma: f32,
    taps: Vec<f32>,
}

impl GaussianKernel {
    /// Kernel with radius `ceil(4σ)` (at least one tap on each side).
    pub fn new(sigma: f32) -> Self {
        let sigma = sigma.max(1e-3);
        let radius = ((4.0 * sigma).ceil() as usize).max(1);
        let denom = 2.0 * sigma * sigma;
        let mut taps: Vec<f32> = (0..=2 * radius)
            .map(|i| {
                let d = i as f32 - radius as f32;
                (-d * d / denom).exp()
            })
            .collect();
        let sum: f32 = taps.iter().sum();
        for t in &mut taps {
            *t /= sum;
        }
        Self { sigma, taps }
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }
}

impl SeparableFilter for GaussianKernel {
    #[inline]
    fn taps(&self) -> &[f32] {
        &self.taps
    }
}

/// Convolve `inp` with `filter` horizontally then vertically.
pub fn apply(filter: &dyn SeparableFilter, inp: &ImageF32) -> ImageF32 {
    let taps = filter.taps();
    let (w, h) = (inp.w, inp.h);
    if taps.is_empty() || inp.is_empty() {
        return inp.clone();
    }
    let half = (taps.len() / 2) as isize;

    let mut tmp = ImageF32::new(w, h);
    for y in 0..h {
        let src = inp.row(y);
        let dst = tmp.row_mut(y);
        for (x, out) in dst.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &t) in taps.iter().enumerate() {
                let sx = (x as isize + k as isize - half).clamp(0, w as isize - 1) as usize;
                acc += t * src[sx];
            }
            *out = acc;
        }
    }

    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        let dst = out.row_mut(y);
        for (k, &t) in taps.iter().enumerate() {
            let sy = (y as isize + k as isize - half).clamp(0, h as isize - 1) as usize;
            let src = tmp.row(sy);
            for (o, &s) in dst.iter_mut().zip(src) {
                *o += t * s;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_kernel_is_normalised_and_symmetric() {
        let k = GaussianKernel::new(1.6);
        let taps = k.taps();
        assert_eq!(taps.len() % 2, 1);
        let sum: f32 = taps.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..taps.len() / 2 {
            assert!((taps[i] - taps[taps.len() - 1 - i]).abs() < 1e-7);
        }
    }

    #[test]
    fn filtering_preserves_constant_images() {
        let img = ImageF32::filled(9, 7, 0.4);
        let out = apply(&GaussianKernel::new(2.0), &img);
        assert!(out.data.iter().all(|&v| (v - 0.4).abs() < 1e-5));
    }
}
