//! Gaussian scale space and difference-of-Gaussians octaves.
use super::SiftParams;
use crate::image::{ImageF32, ImageView, ImageViewMut};
use crate::pyramid::filters::{apply as apply_filter, GaussianKernel};
use rayon::prelude::*;

/// Blur assumed to be present in the input image.
const INPUT_SIGMA: f32 = 0.5;
/// Octaves stop once the shorter side would drop below this many pixels.
const MIN_OCTAVE_SIDE: usize = 16;

#[derive(Clone, Debug)]
pub struct Octave {
    /// `layers + 3` progressively blurred images.
    pub gaussians: Vec<ImageF32>,
    /// `layers + 2` differences of adjacent Gaussian images.
    pub dogs: Vec<ImageF32>,
}

#[derive(Clone, Debug)]
pub struct ScaleSpace {
    pub octaves: Vec<Octave>,
    pub layers: usize,
    pub sigma: f32,
    pub upsampled: bool,
}

impl ScaleSpace {
    /// Build the scale space, or `None` when the image is too small for one octave.
    pub fn build(gray: &ImageF32, params: &SiftParams) -> Option<Self> {
        if gray.is_empty() {
            return None;
        }
        let layers = params.octave_layers.max(1);
        let sigma = params.sigma.max(1e-3);
        let base = base_image(gray, sigma, params.upsample_input);
        let n_octaves = octave_count(base.w, base.h);
        if n_octaves == 0 {
            return None;
        }

        let kernels = layer_kernels(sigma, layers);
        let mut octaves: Vec<Octave> = Vec::with_capacity(n_octaves);
        let mut seed = base;
        for o in 0..n_octaves {
            if o > 0 {
                let prev = &octaves[o - 1].gaussians[layers];
                seed = decimate(prev);
            }
            let mut gaussians = Vec::with_capacity(layers + 3);
            gaussians.push(seed.clone());
            for kernel in &kernels {
                let Some(prev) = gaussians.last() else { break };
                let next = apply_filter(kernel, prev);
                gaussians.push(next);
            }
            let dogs = (0..gaussians.len() - 1)
                .into_par_iter()
                .map(|i| difference(&gaussians[i + 1], &gaussians[i]))
                .collect();
            octaves.push(Octave { gaussians, dogs });
        }

        Some(Self {
            octaves,
            layers,
            sigma,
            upsampled: params.upsample_input,
        })
    }

    #[inline]
    pub fn gaussian(&self, octave: usize, layer: usize) -> &ImageF32 {
        &self.octaves[octave].gaussians[layer]
    }

    /// Factor mapping octave coordinates back to input-image pixels.
    pub fn octave_scale(&self, octave: usize) -> f32 {
        let s = (1u64 << octave.min(63)) as f32;
        if self.upsampled {
            s * 0.5
        } else {
            s
        }
    }
}

/// Incremental blur kernels taking layer `i-1` to layer `i` (`i = 1..layers+3`).
fn layer_kernels(sigma: f32, layers: usize) -> Vec<GaussianKernel> {
    let k = 2f32.powf(1.0 / layers as f32);
    (1..layers + 3)
        .map(|i| {
            let sig_prev = sigma * k.powi(i as i32 - 1);
            let sig_total = sig_prev * k;
            GaussianKernel::new((sig_total * sig_total - sig_prev * sig_prev).sqrt())
        })
        .collect()
}

fn octave_count(w: usize, h: usize) -> usize {
    let mut side = w.min(h);
    let mut n = 0;
    while side >= MIN_OCTAVE_SIDE {
        n += 1;
        side /= 2;
    }
    n
}

fn base_image(gray: &ImageF32, sigma: f32, upsample: bool) -> ImageF32 {
    let (src, present) = if upsample {
        (upsample_2x(gray), 2.0 * INPUT_SIGMA)
    } else {
        (gray.clone(), INPUT_SIGMA)
    };
    let sig_diff = (sigma * sigma - present * present).max(0.01).sqrt();
    apply_filter(&GaussianKernel::new(sig_diff), &src)
}

/// Bilinear 2× upsampling with pixel-centre alignment.
fn upsample_2x(img: &ImageF32) -> ImageF32 {
    let (w, h) = (img.w * 2, img.h * 2);
    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        let sy = (y as f32 + 0.5) * 0.5 - 0.5;
        let y0 = sy.floor();
        let fy = sy - y0;
        let y0 = y0 as isize;
        let row = out.row_mut(y);
        for (x, px) in row.iter_mut().enumerate() {
            let sx = (x as f32 + 0.5) * 0.5 - 0.5;
            let x0 = sx.floor();
            let fx = sx - x0;
            let x0 = x0 as isize;
            let top = img.get_clamped(x0, y0) * (1.0 - fx) + img.get_clamped(x0 + 1, y0) * fx;
            let bot =
                img.get_clamped(x0, y0 + 1) * (1.0 - fx) + img.get_clamped(x0 + 1, y0 + 1) * fx;
            *px = top * (1.0 - fy) + bot * fy;
        }
    }
    out
}

/// Keep every other pixel (the input is already blurred by 2σ).
fn decimate(img: &ImageF32) -> ImageF32 {
    let (w, h) = ((img.w / 2).max(1), (img.h / 2).max(1));
    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        let src = img.row((2 * y).min(img.h - 1));
        let dst = out.row_mut(y);
        for (x, px) in dst.iter_mut().enumerate() {
            *px = src[(2 * x).min(img.w - 1)];
        }
    }
    out
}

fn difference(a: &ImageF32, b: &ImageF32) -> ImageF32 {
    let data = a.data.iter().zip(&b.data).map(|(x, y)| x - y).collect();
    ImageF32 {
        w: a.w,
        h: a.h,
        stride: a.stride,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octaves_have_expected_layer_counts() {
        let img = ImageF32::filled(64, 48, 0.5);
        let params = SiftParams::default();
        let space = ScaleSpace::build(&img, &params).unwrap();
        // 96 px shorter side after upsampling: 96, 48, 24 → 3 octaves.
        assert_eq!(space.octaves.len(), 3);
        for octave in &space.octaves {
            assert_eq!(octave.gaussians.len(), params.octave_layers + 3);
            assert_eq!(octave.dogs.len(), params.octave_layers + 2);
        }
        assert_eq!(space.octaves[1].gaussians[0].w, 64);
        assert_eq!(space.octave_scale(0), 0.5);
        assert_eq!(space.octave_scale(2), 2.0);
    }

    #[test]
    fn small_images_have_no_scale_space() {
        let img = ImageF32::filled(6, 6, 0.5);
        let params = SiftParams {
            upsample_input: false,
            ..Default::default()
        };
        assert!(ScaleSpace::build(&img, &params).is_none());
    }

    #[test]
    fn upsampling_preserves_constant_intensity() {
        let img = ImageF32::filled(5, 3, 0.7);
        let up = upsample_2x(&img);
        assert_eq!((up.w, up.h), (10, 6));
        assert!(up.data.iter().all(|&v| (v - 0.7).abs() < 1e-6));
    }
}
