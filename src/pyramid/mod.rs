//! Gaussian pyramid downsampling (`pyrDown` semantics).
//!
//! Each step applies the separable 5-tap binomial kernel `[1,4,6,4,1]/16` and
//! keeps every other pixel, producing a `ceil(w/2) × ceil(h/2)` image. The
//! tracker downsamples the reference model and every frame with independently
//! configured step counts; [`LevelScaling`] maps coordinates back to full
//! resolution.

pub mod filters;
pub mod scaling;

use crate::image::{ImageF32, ImageView, ImageViewMut};
use filters::{apply as apply_filter, SeparableFilter, GAUSSIAN_5TAP};

pub use scaling::LevelScaling;

/// Halve `image` once after binomial smoothing.
pub fn pyr_down(image: &ImageF32) -> ImageF32 {
    pyr_down_with(image, &GAUSSIAN_5TAP)
}

/// Downsample `image` `count` times; `count == 0` returns a copy of the input.
pub fn multi_pyr_down(image: &ImageF32, count: usize) -> ImageF32 {
    if count == 0 {
        return image.clone();
    }
    let mut current = pyr_down(image);
    for _ in 1..count {
        current = pyr_down(&current);
    }
    current
}

fn pyr_down_with(image: &ImageF32, filter: &dyn SeparableFilter) -> ImageF32 {
    if image.is_empty() {
        return image.clone();
    }
    let smoothed = apply_filter(filter, image);
    let (nw, nh) = (image.w.div_ceil(2), image.h.div_ceil(2));
    let mut down = ImageF32::new(nw, nh);
    for y in 0..nh {
        let src_row = smoothed.row((y * 2).min(smoothed.h - 1));
        let dst_row = down.row_mut(y);
        for (x, dst_px) in dst_row.iter_mut().enumerate() {
            *dst_px = src_row[(x * 2).min(smoothed.w - 1)];
        }
    }
    down
}
