//! 4×4 spatial × 8 orientation gradient histograms (128 values).
use super::extrema::Extremum;
use crate::image::ImageF32;
use std::f32::consts::TAU;

const DESCR_WIDTH: usize = 4;
const DESCR_HIST_BINS: usize = 8;
const DESCR_SCL_FCTR: f32 = 3.0;
const DESCR_MAG_THR: f32 = 0.2;

pub const DESCRIPTOR_LEN: usize = DESCR_WIDTH * DESCR_WIDTH * DESCR_HIST_BINS;

/// Describe the neighbourhood of `e` rotated by `angle` on Gaussian layer `img`.
pub fn compute(img: &ImageF32, e: &Extremum, angle: f32) -> [f32; DESCRIPTOR_LEN] {
    let d = DESCR_WIDTH;
    let n = DESCR_HIST_BINS;
    let df = d as f32;
    let hist_width = DESCR_SCL_FCTR * e.scale_in_octave;
    let diag = ((img.w * img.w + img.h * img.h) as f32).sqrt();
    let radius = (hist_width * std::f32::consts::SQRT_2 * (df + 1.0) * 0.5)
        .round()
        .min(diag) as isize;
    let cos_t = angle.cos() / hist_width;
    let sin_t = angle.sin() / hist_width;
    let bins_per_rad = n as f32 / TAU;
    let exp_scale = -1.0 / (df * df * 0.5);
    let (px, py) = (e.x.round() as isize, e.y.round() as isize);
    let (w, h) = (img.w as isize, img.h as isize);

    // Padded by one bin on every side so interpolation never needs bounds checks.
    let row_stride = (d + 2) * (n + 2);
    let col_stride = n + 2;
    let mut hist = vec![0.0f32; (d + 2) * row_stride];

    for i in -radius..=radius {
        for j in -radius..=radius {
            // Offset expressed in the keypoint frame, in histogram-cell units.
            let (jf, if_) = (j as f32, i as f32);
            let c_rot = jf * cos_t + if_ * sin_t;
            let r_rot = -jf * sin_t + if_ * cos_t;
            let rbin = r_rot + df / 2.0 - 0.5;
            let cbin = c_rot + df / 2.0 - 0.5;
            let (r, c) = (py + i, px + j);
            if !(rbin > -1.0 && rbin < df && cbin > -1.0 && cbin < df) {
                continue;
            }
            if r <= 0 || r >= h - 1 || c <= 0 || c >= w - 1 {
                continue;
            }
            let (cu, ru) = (c as usize, r as usize);
            let dx = img.get(cu + 1, ru) - img.get(cu - 1, ru);
            let dy = img.get(cu, ru + 1) - img.get(cu, ru - 1);
            let weight = ((c_rot * c_rot + r_rot * r_rot) * exp_scale).exp();
            let mag = (dx * dx + dy * dy).sqrt() * weight;
            let ori = (dy.atan2(dx) - angle).rem_euclid(TAU);
            let obin = ori * bins_per_rad;

            let (r0, c0, o0) = (rbin.floor(), cbin.floor(), obin.floor());
            let (fr, fc, fo) = (rbin - r0, cbin - c0, obin - o0);
            let o0 = (o0 as isize).rem_euclid(n as isize) as usize;
            let (r0, c0) = ((r0 as isize + 1) as usize, (c0 as isize + 1) as usize);

            let v_r1 = mag * fr;
            let v_r0 = mag - v_r1;
            let v_rc11 = v_r1 * fc;
            let v_rc10 = v_r1 - v_rc11;
            let v_rc01 = v_r0 * fc;
            let v_rc00 = v_r0 - v_rc01;
            let v_rco111 = v_rc11 * fo;
            let v_rco110 = v_rc11 - v_rco111;
            let v_rco101 = v_rc10 * fo;
            let v_rco100 = v_rc10 - v_rco101;
            let v_rco011 = v_rc01 * fo;
            let v_rco010 = v_rc01 - v_rco011;
            let v_rco001 = v_rc00 * fo;
            let v_rco000 = v_rc00 - v_rco001;

            let idx = r0 * row_stride + c0 * col_stride + o0;
            hist[idx] += v_rco000;
            hist[idx + 1] += v_rco001;
            hist[idx + col_stride] += v_rco010;
            hist[idx + col_stride + 1] += v_rco011;
            hist[idx + row_stride] += v_rco100;
            hist[idx + row_stride + 1] += v_rco101;
            hist[idx + row_stride + col_stride] += v_rco110;
            hist[idx + row_stride + col_stride + 1] += v_rco111;
        }
    }

    let mut out = [0.0f32; DESCRIPTOR_LEN];
    for i in 0..d {
        for j in 0..d {
            let idx = (i + 1) * row_stride + (j + 1) * col_stride;
            // Fold the wrapped orientation bins back onto the circle.
            hist[idx] += hist[idx + n];
            hist[idx + 1] += hist[idx + n + 1];
            let dst = (i * d + j) * n;
            out[dst..dst + n].copy_from_slice(&hist[idx..idx + n]);
        }
    }
    normalize(&mut out);
    out
}

/// Unit L2 norm with large components clamped, then renormalised.
fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    let thr = norm * DESCR_MAG_THR;
    for x in v.iter_mut() {
        *x = x.min(thr);
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured(w: usize, h: usize) -> ImageF32 {
        let mut img = ImageF32::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let v = ((x * 13 + y * 7) % 17) as f32 / 17.0 + 0.1 * ((x / 4 + y / 3) % 2) as f32;
                img.set(x, y, v);
            }
        }
        img
    }

    fn extremum_at(x: f32, y: f32) -> Extremum {
        Extremum {
            octave: 0,
            layer: 1,
            x,
            y,
            scale_in_octave: 1.6,
            response: 1.0,
        }
    }

    #[test]
    fn descriptor_is_unit_length_and_clamped() {
        let img = textured(48, 48);
        let desc = compute(&img, &extremum_at(24.0, 24.0), 0.3);
        let norm = desc.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert!(desc.iter().all(|&x| x >= 0.0));
        assert!(desc.iter().filter(|&&x| x > 0.0).count() > 16);
    }

    #[test]
    fn flat_patch_gives_zero_descriptor() {
        let img = ImageF32::filled(32, 32, 0.5);
        let desc = compute(&img, &extremum_at(16.0, 16.0), 0.0);
        assert!(desc.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn rotating_image_and_keypoint_together_preserves_descriptor() {
        // A quarter turn maps (x, y) to (h-1-y, x); gradients turn by +π/2.
        let img = textured(41, 41);
        let mut rot = ImageF32::new(41, 41);
        for y in 0..41 {
            for x in 0..41 {
                rot.set(40 - y, x, img.get(x, y));
            }
        }
        let a = compute(&img, &extremum_at(20.0, 20.0), 0.4);
        let b = compute(&rot, &extremum_at(20.0, 20.0), 0.4 + std::f32::consts::FRAC_PI_2);
        let dist = crate::features::types::l2_distance(&a, &b);
        assert!(dist < 0.15, "descriptor distance after rotation {dist}");
    }
}
