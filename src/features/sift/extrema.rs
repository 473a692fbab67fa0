//! Scale-space extrema detection and sub-pixel localisation.
use super::scale_space::ScaleSpace;
use super::SiftParams;
use crate::image::ImageF32;
use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;

/// Pixels closer than this to the border are never keypoint candidates.
pub const IMG_BORDER: usize = 5;
const MAX_INTERP_STEPS: usize = 5;

/// Refined extremum in octave coordinates.
#[derive(Clone, Copy, Debug)]
pub struct Extremum {
    pub octave: usize,
    /// Integer DoG layer the refinement converged on (`1..=layers`).
    pub layer: usize,
    pub x: f32,
    pub y: f32,
    /// Blur of the refined scale relative to the octave base.
    pub scale_in_octave: f32,
    /// Absolute interpolated DoG contrast.
    pub response: f32,
}

/// Find and refine all extrema, ordered by octave, layer and raster position.
pub fn find_extrema(space: &ScaleSpace, params: &SiftParams) -> Vec<Extremum> {
    let jobs: Vec<(usize, usize)> = (0..space.octaves.len())
        .flat_map(|o| (1..=space.layers).map(move |l| (o, l)))
        .collect();
    jobs.into_par_iter()
        .flat_map_iter(|(o, l)| scan_layer(space, params, o, l))
        .collect()
}

fn scan_layer(space: &ScaleSpace, params: &SiftParams, octave: usize, layer: usize) -> Vec<Extremum> {
    let dogs = &space.octaves[octave].dogs;
    let (prev, cur, next) = (&dogs[layer - 1], &dogs[layer], &dogs[layer + 1]);
    let mut out = Vec::new();
    if cur.w <= 2 * IMG_BORDER || cur.h <= 2 * IMG_BORDER {
        return out;
    }
    let threshold = 0.5 * params.contrast_threshold / space.layers as f32;
    for y in IMG_BORDER..cur.h - IMG_BORDER {
        for x in IMG_BORDER..cur.w - IMG_BORDER {
            let v = cur.get(x, y);
            if v.abs() <= threshold || !is_local_extremum(prev, cur, next, x, y, v) {
                continue;
            }
            if let Some(e) = refine(space, params, octave, layer, x, y) {
                out.push(e);
            }
        }
    }
    out
}

fn is_local_extremum(
    prev: &ImageF32,
    cur: &ImageF32,
    next: &ImageF32,
    x: usize,
    y: usize,
    v: f32,
) -> bool {
    for img in [prev, cur, next] {
        for yy in y - 1..=y + 1 {
            for xx in x - 1..=x + 1 {
                let n = img.get(xx, yy);
                if (v > 0.0 && n > v) || (v <= 0.0 && n < v) {
                    return false;
                }
            }
        }
    }
    true
}

struct LocalFit {
    value: f32,
    gradient: Vector3<f32>,
    hessian: Matrix3<f32>,
}

fn local_fit(prev: &ImageF32, cur: &ImageF32, next: &ImageF32, x: usize, y: usize) -> LocalFit {
    let v = cur.get(x, y);
    let gradient = Vector3::new(
        (cur.get(x + 1, y) - cur.get(x - 1, y)) * 0.5,
        (cur.get(x, y + 1) - cur.get(x, y - 1)) * 0.5,
        (next.get(x, y) - prev.get(x, y)) * 0.5,
    );
    let v2 = 2.0 * v;
    let dxx = cur.get(x + 1, y) + cur.get(x - 1, y) - v2;
    let dyy = cur.get(x, y + 1) + cur.get(x, y - 1) - v2;
    let dss = next.get(x, y) + prev.get(x, y) - v2;
    let dxy = (cur.get(x + 1, y + 1) - cur.get(x - 1, y + 1) - cur.get(x + 1, y - 1)
        + cur.get(x - 1, y - 1))
        * 0.25;
    let dxs = (next.get(x + 1, y) - next.get(x - 1, y) - prev.get(x + 1, y) + prev.get(x - 1, y))
        * 0.25;
    let dys = (next.get(x, y + 1) - next.get(x, y - 1) - prev.get(x, y + 1) + prev.get(x, y - 1))
        * 0.25;
    LocalFit {
        value: v,
        gradient,
        hessian: Matrix3::new(dxx, dxy, dxs, dxy, dyy, dys, dxs, dys, dss),
    }
}

fn refine(
    space: &ScaleSpace,
    params: &SiftParams,
    octave: usize,
    layer: usize,
    x: usize,
    y: usize,
) -> Option<Extremum> {
    let dogs = &space.octaves[octave].dogs;
    let (w, h) = (dogs[0].w as isize, dogs[0].h as isize);
    let border = IMG_BORDER as isize;
    let layers = space.layers as isize;
    let (mut xi, mut yi, mut li) = (x as isize, y as isize, layer as isize);

    let mut converged = None;
    for _ in 0..MAX_INTERP_STEPS {
        let l = li as usize;
        let fit = local_fit(&dogs[l - 1], &dogs[l], &dogs[l + 1], xi as usize, yi as usize);
        let step = fit.hessian.lu().solve(&fit.gradient)?;
        let offset = -step;
        if offset.iter().all(|o| o.abs() < 0.5) {
            converged = Some((fit, offset));
            break;
        }
        if offset.iter().any(|o| !o.is_finite() || o.abs() > 1e6) {
            return None;
        }
        xi += offset.x.round() as isize;
        yi += offset.y.round() as isize;
        li += offset.z.round() as isize;
        if li < 1 || li > layers || xi < border || xi >= w - border || yi < border || yi >= h - border
        {
            return None;
        }
    }
    let (fit, offset) = converged?;

    let contrast = fit.value + 0.5 * fit.gradient.dot(&offset);
    if contrast.abs() * (space.layers as f32) < params.contrast_threshold {
        return None;
    }

    let (dxx, dyy, dxy) = (fit.hessian[(0, 0)], fit.hessian[(1, 1)], fit.hessian[(0, 1)]);
    let tr = dxx + dyy;
    let det = dxx * dyy - dxy * dxy;
    let edge = params.edge_threshold;
    if det <= 0.0 || tr * tr * edge >= (edge + 1.0) * (edge + 1.0) * det {
        return None;
    }

    Some(Extremum {
        octave,
        layer: li as usize,
        x: xi as f32 + offset.x,
        y: yi as f32 + offset.y,
        scale_in_octave: space.sigma * 2f32.powf((li as f32 + offset.z) / space.layers as f32),
        response: contrast.abs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plateau_counts_as_extremum_only_when_not_exceeded() {
        let flat = ImageF32::filled(5, 5, 0.1);
        assert!(is_local_extremum(&flat, &flat, &flat, 2, 2, 0.1));
        let mut bumped = flat.clone();
        bumped.set(1, 1, 0.2);
        assert!(!is_local_extremum(&flat, &flat, &bumped, 2, 2, 0.1));
    }

    #[test]
    fn negative_minimum_is_detected() {
        let mut cur = ImageF32::filled(5, 5, -0.05);
        cur.set(2, 2, -0.3);
        let other = ImageF32::filled(5, 5, -0.1);
        assert!(is_local_extremum(&other, &cur, &other, 2, 2, -0.3));
    }
}
