//! Plane-to-plane projective transforms.
//!
//! `H` maps reference-model points to frame points: `x' ~ H x`. Estimation
//! uses the normalized DLT (Hartley normalization, SVD of the design matrix);
//! [`ransac`] wraps it for correspondences contaminated by outliers.

pub mod ransac;

use nalgebra::{DMatrix, Matrix3, Vector3};

pub use ransac::{HomographyEstimator, HomographyFit, RansacParams};

const EPS: f64 = 1e-12;

/// Point pair from a surviving match: reference-model point and frame point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correspondence {
    pub reference: [f32; 2],
    pub frame: [f32; 2],
}

/// Similarity moving the centroid to the origin with mean distance √2.
fn normalization(pts: &[[f64; 2]]) -> Option<Matrix3<f64>> {
    let n = pts.len() as f64;
    let (cx, cy) = pts
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    let (cx, cy) = (cx / n, cy / n);
    let mean = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if !mean.is_finite() || mean < EPS {
        return None;
    }
    let s = std::f64::consts::SQRT_2 / mean;
    Some(Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0))
}

fn transform(t: &Matrix3<f64>, p: [f64; 2]) -> [f64; 2] {
    let v = t * Vector3::new(p[0], p[1], 1.0);
    [v[0] / v[2], v[1] / v[2]]
}

/// Least-squares homography from ≥ 4 point pairs, scaled so `H[2,2] == 1`
/// when possible. `None` for degenerate input.
pub fn dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Option<Matrix3<f64>> {
    let n = src.len();
    if n < 4 || dst.len() != n {
        return None;
    }
    let t_src = normalization(src)?;
    let t_dst = normalization(dst)?;

    let rows = (2 * n).max(9);
    let mut a = DMatrix::<f64>::zeros(rows, 9);
    for (i, (&ps, &pd)) in src.iter().zip(dst).enumerate() {
        let [x, y] = transform(&t_src, ps);
        let [u, v] = transform(&t_dst, pd);
        let (r0, r1) = (2 * i, 2 * i + 1);
        a[(r0, 0)] = -x;
        a[(r0, 1)] = -y;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = u * x;
        a[(r0, 7)] = u * y;
        a[(r0, 8)] = u;
        a[(r1, 3)] = -x;
        a[(r1, 4)] = -y;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = v * x;
        a[(r1, 7)] = v * y;
        a[(r1, 8)] = v;
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t?;
    let (min_idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    let h = v_t.row(min_idx);
    let hn = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let mut hm = t_dst.try_inverse()? * hn * t_src;
    let scale = hm[(2, 2)];
    if scale.abs() > EPS {
        hm /= scale;
    }
    if hm.iter().all(|v| v.is_finite()) {
        Some(hm)
    } else {
        None
    }
}

/// Exact homography taking four `src` points onto four `dst` points.
pub fn perspective_transform(src: &[[f32; 2]; 4], dst: &[[f32; 2]; 4]) -> Option<Matrix3<f64>> {
    let s = src.map(|p| [p[0] as f64, p[1] as f64]);
    let d = dst.map(|p| [p[0] as f64, p[1] as f64]);
    dlt(&s, &d)
}

/// Map one point; `None` when it lands at infinity.
#[inline]
pub fn project_point(h: &Matrix3<f64>, p: [f64; 2]) -> Option<[f64; 2]> {
    let v = h * Vector3::new(p[0], p[1], 1.0);
    let w = v[2];
    if !w.is_finite() || w.abs() <= EPS || !v[0].is_finite() || !v[1].is_finite() {
        return None;
    }
    Some([v[0] / w, v[1] / w])
}

pub fn apply_homography_points(h: &Matrix3<f64>, pts: &[[f32; 2]]) -> Option<Vec<[f32; 2]>> {
    pts.iter()
        .map(|&p| project_point(h, [p[0] as f64, p[1] as f64]).map(|q| [q[0] as f32, q[1] as f32]))
        .collect()
}

/// Twice the signed area of the triangle `abc`.
#[inline]
pub(crate) fn triangle_area2(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_h() -> Matrix3<f64> {
        Matrix3::new(1.2, 0.1, 30.0, -0.05, 0.9, 12.0, 1e-4, 2e-4, 1.0)
    }

    #[test]
    fn dlt_recovers_exact_homography() {
        let h = sample_h();
        let src: Vec<[f64; 2]> = (0..5)
            .flat_map(|i| (0..4).map(move |j| [i as f64 * 20.0, j as f64 * 25.0]))
            .collect();
        let dst: Vec<[f64; 2]> = src.iter().filter_map(|&p| project_point(&h, p)).collect();
        let est = dlt(&src, &dst).unwrap();
        for (a, b) in est.iter().zip(h.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6, max_relative = 1e-6);
        }
    }

    #[test]
    fn four_point_transform_maps_corners() {
        let src = [[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]];
        let dst = [[5.0, 3.0], [4.0, 20.0], [22.0, 25.0], [18.0, 1.0]];
        let h = perspective_transform(&src, &dst).unwrap();
        let out = apply_homography_points(&h, &src).unwrap();
        for (p, q) in out.iter().zip(dst.iter()) {
            assert_relative_eq!(p[0], q[0], epsilon = 1e-3);
            assert_relative_eq!(p[1], q[1], epsilon = 1e-3);
        }
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let src = [[1.0, 1.0]; 4];
        let dst = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];
        assert!(dlt(&src, &dst).is_none());
    }
}
