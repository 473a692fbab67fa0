//! Dominant gradient orientations around a keypoint.
use super::extrema::Extremum;
use crate::image::ImageF32;
use std::f32::consts::TAU;

const ORI_HIST_BINS: usize = 36;
const ORI_SIG_FCTR: f32 = 1.5;
const ORI_RADIUS: f32 = 3.0 * ORI_SIG_FCTR;
/// Secondary peaks at or above this fraction of the maximum spawn extra keypoints.
const ORI_PEAK_RATIO: f32 = 0.8;

/// Angles (radians in `[0, 2π)`) of every dominant histogram peak.
pub fn dominant_orientations(img: &ImageF32, e: &Extremum) -> Vec<f32> {
    let hist = orientation_histogram(img, e);
    let max = hist.iter().cloned().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Vec::new();
    }
    let threshold = max * ORI_PEAK_RATIO;
    let n = ORI_HIST_BINS;
    let mut angles = Vec::new();
    for j in 0..n {
        let l = hist[(j + n - 1) % n];
        let r = hist[(j + 1) % n];
        let c = hist[j];
        if c > l && c > r && c >= threshold {
            let denom = l - 2.0 * c + r;
            let shift = if denom.abs() > f32::EPSILON {
                0.5 * (l - r) / denom
            } else {
                0.0
            };
            let bin = (j as f32 + shift).rem_euclid(n as f32);
            angles.push((bin * TAU / n as f32).rem_euclid(TAU));
        }
    }
    angles
}

fn orientation_histogram(img: &ImageF32, e: &Extremum) -> [f32; ORI_HIST_BINS] {
    let n = ORI_HIST_BINS;
    let sigma = ORI_SIG_FCTR * e.scale_in_octave;
    let radius = (ORI_RADIUS * e.scale_in_octave).round() as isize;
    let exp_scale = -1.0 / (2.0 * sigma * sigma);
    let (px, py) = (e.x.round() as isize, e.y.round() as isize);
    let (w, h) = (img.w as isize, img.h as isize);

    let mut raw = [0.0f32; ORI_HIST_BINS];
    for i in -radius..=radius {
        let y = py + i;
        if y <= 0 || y >= h - 1 {
            continue;
        }
        for j in -radius..=radius {
            let x = px + j;
            if x <= 0 || x >= w - 1 {
                continue;
            }
            let (xu, yu) = (x as usize, y as usize);
            let dx = img.get(xu + 1, yu) - img.get(xu - 1, yu);
            let dy = img.get(xu, yu + 1) - img.get(xu, yu - 1);
            let weight = (((i * i + j * j) as f32) * exp_scale).exp();
            let angle = dy.atan2(dx).rem_euclid(TAU);
            let bin = ((angle * n as f32 / TAU).round() as usize) % n;
            raw[bin] += weight * (dx * dx + dy * dy).sqrt();
        }
    }

    let mut hist = [0.0f32; ORI_HIST_BINS];
    for (k, out) in hist.iter_mut().enumerate() {
        let at = |d: isize| raw[(k as isize + d).rem_euclid(n as isize) as usize];
        *out = (at(-2) + at(2)) * (1.0 / 16.0) + (at(-1) + at(1)) * (4.0 / 16.0) + at(0) * (6.0 / 16.0);
    }
    hist
}
