use super::{dlt, project_point, triangle_area2, Correspondence};
use crate::types::RejectReason;
use log::debug;
use nalgebra::Matrix3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

const SAMPLE_SIZE: usize = 4;
const COLLINEAR_EPS: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Maximum reprojection error (pixels) for a correspondence to count as inlier.
    pub reproj_threshold: f64,
    pub max_iterations: usize,
    /// Desired probability of drawing at least one outlier-free sample.
    pub confidence: f64,
    /// Sampler seed; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            reproj_threshold: 3.0,
            max_iterations: 2000,
            confidence: 0.995,
            seed: Some(0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HomographyFit {
    pub h: Matrix3<f64>,
    /// Parallel to the input correspondences.
    pub inliers: Vec<bool>,
    pub inlier_count: usize,
    pub iterations: usize,
}

/// RANSAC homography fit with a minimum inlier requirement.
#[derive(Clone, Debug, PartialEq)]
pub struct HomographyEstimator {
    pub params: RansacParams,
    pub min_inliers: usize,
}

impl Default for HomographyEstimator {
    fn default() -> Self {
        Self {
            params: RansacParams::default(),
            min_inliers: 15,
        }
    }
}

/// Iterations needed so a clean sample is drawn with probability `confidence`.
fn update_num_iters(confidence: f64, outlier_ratio: f64, max_iters: usize) -> usize {
    let ep = outlier_ratio.clamp(0.0, 1.0);
    let num = (1.0 - confidence).max(f64::MIN_POSITIVE);
    let denom = 1.0 - (1.0 - ep).powi(SAMPLE_SIZE as i32);
    if denom < f64::MIN_POSITIVE {
        return 0;
    }
    let (num, denom) = (num.ln(), denom.ln());
    if denom >= 0.0 || -num >= max_iters as f64 * -denom {
        max_iters
    } else {
        (num / denom).round() as usize
    }
}

fn has_collinear_triple(pts: &[[f64; 2]; SAMPLE_SIZE]) -> bool {
    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];
    TRIPLES
        .iter()
        .any(|&(i, j, k)| triangle_area2(pts[i], pts[j], pts[k]).abs() < COLLINEAR_EPS)
}

struct Scored {
    h: Matrix3<f64>,
    inliers: Vec<bool>,
    count: usize,
}

impl HomographyEstimator {
    pub fn new(params: RansacParams, min_inliers: usize) -> Self {
        Self {
            params,
            min_inliers,
        }
    }

    fn score(&self, h: Matrix3<f64>, src: &[[f64; 2]], dst: &[[f64; 2]]) -> Scored {
        let thr2 = self.params.reproj_threshold * self.params.reproj_threshold;
        let inliers: Vec<bool> = src
            .iter()
            .zip(dst)
            .map(|(&s, d)| match project_point(&h, s) {
                Some(p) => (p[0] - d[0]).powi(2) + (p[1] - d[1]).powi(2) <= thr2,
                None => false,
            })
            .collect();
        let count = inliers.iter().filter(|&&b| b).count();
        Scored { h, inliers, count }
    }

    /// Fit `H` (reference → frame) to the correspondences.
    pub fn estimate(&self, corr: &[Correspondence]) -> Result<HomographyFit, RejectReason> {
        let n = corr.len();
        let reject = |inliers: usize| RejectReason::InsufficientInliers {
            inliers,
            required: self.min_inliers,
            matches: n,
        };
        if n < SAMPLE_SIZE {
            debug!("Homography: {n} correspondences, need at least {SAMPLE_SIZE}");
            return Err(reject(0));
        }

        let src: Vec<[f64; 2]> = corr
            .iter()
            .map(|c| [c.reference[0] as f64, c.reference[1] as f64])
            .collect();
        let dst: Vec<[f64; 2]> = corr
            .iter()
            .map(|c| [c.frame[0] as f64, c.frame[1] as f64])
            .collect();

        let mut rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let max_iters = self.params.max_iterations.max(1);
        let mut niters = max_iters;
        let mut best: Option<Scored> = None;
        let mut iter = 0;
        while iter < niters {
            iter += 1;
            let idx = rand::seq::index::sample(&mut rng, n, SAMPLE_SIZE);
            let mut s = [[0.0; 2]; SAMPLE_SIZE];
            let mut d = [[0.0; 2]; SAMPLE_SIZE];
            for (k, i) in idx.iter().enumerate() {
                s[k] = src[i];
                d[k] = dst[i];
            }
            if has_collinear_triple(&s) || has_collinear_triple(&d) {
                continue;
            }
            let Some(h) = dlt(&s, &d) else { continue };
            let scored = self.score(h, &src, &dst);
            if best.as_ref().map_or(true, |b| scored.count > b.count) {
                let outliers = (n - scored.count) as f64 / n as f64;
                niters = update_num_iters(self.params.confidence, outliers, max_iters).max(iter);
                best = Some(scored);
            }
        }

        let Some(mut best) = best else {
            debug!("Homography: no non-degenerate sample in {iter} iterations");
            return Err(reject(0));
        };

        if best.count >= SAMPLE_SIZE {
            let (s, d): (Vec<[f64; 2]>, Vec<[f64; 2]>) = best
                .inliers
                .iter()
                .enumerate()
                .filter(|(_, &ok)| ok)
                .map(|(i, _)| (src[i], dst[i]))
                .unzip();
            if let Some(h) = dlt(&s, &d) {
                let refit = self.score(h, &src, &dst);
                if refit.count >= best.count {
                    best = refit;
                }
            }
        }

        debug!(
            "Homography: {} / {} inliers after {} iterations",
            best.count, n, iter
        );
        if best.count < self.min_inliers {
            return Err(reject(best.count));
        }
        Ok(HomographyFit {
            h: best.h,
            inliers: best.inliers,
            inlier_count: best.count,
            iterations: iter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn grid_correspondences(h: &Matrix3<f64>) -> Vec<Correspondence> {
        let mut out = Vec::new();
        for i in 0..6 {
            for j in 0..5 {
                let p = [i as f64 * 17.0 + 3.0, j as f64 * 19.0 + 5.0];
                let q = project_point(h, p).unwrap();
                out.push(Correspondence {
                    reference: [p[0] as f32, p[1] as f32],
                    frame: [q[0] as f32, q[1] as f32],
                });
            }
        }
        out
    }

    fn sample_h() -> Matrix3<f64> {
        Matrix3::new(1.1, 0.05, 20.0, -0.08, 0.95, 7.0, 2e-4, -1e-4, 1.0)
    }

    #[test]
    fn too_few_correspondences_reject() {
        let est = HomographyEstimator::default();
        let corr = grid_correspondences(&sample_h());
        let err = est.estimate(&corr[..3]).unwrap_err();
        assert_eq!(
            err,
            RejectReason::InsufficientInliers {
                inliers: 0,
                required: 15,
                matches: 3
            }
        );
    }

    #[test]
    fn gross_outliers_are_excluded() {
        let h = sample_h();
        let mut corr = grid_correspondences(&h);
        let mut rng = StdRng::seed_from_u64(7);
        for c in corr.iter_mut().step_by(5) {
            c.frame[0] += rng.gen_range(40.0..80.0);
            c.frame[1] -= rng.gen_range(40.0..80.0);
        }
        let fit = HomographyEstimator::default().estimate(&corr).unwrap();
        assert_eq!(fit.inlier_count, corr.len() - 6);
        for (k, ok) in fit.inliers.iter().enumerate() {
            assert_eq!(*ok, k % 5 != 0);
        }
    }

    #[test]
    fn inlier_minimum_is_enforced() {
        let corr = grid_correspondences(&sample_h());
        let est = HomographyEstimator::new(RansacParams::default(), corr.len() + 1);
        assert!(matches!(
            est.estimate(&corr),
            Err(RejectReason::InsufficientInliers { inliers, .. }) if inliers == corr.len()
        ));
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let mut corr = grid_correspondences(&sample_h());
        corr[3].frame = [0.0, 0.0];
        let est = HomographyEstimator::default();
        assert_eq!(est.estimate(&corr), est.estimate(&corr));
    }

    #[test]
    fn clean_data_stops_early() {
        let corr = grid_correspondences(&sample_h());
        let fit = HomographyEstimator::default().estimate(&corr).unwrap();
        assert!(fit.iterations < 10);
    }

    #[test]
    fn iteration_bound_follows_outlier_ratio() {
        assert_eq!(update_num_iters(0.995, 0.0, 2000), 0);
        let half = update_num_iters(0.995, 0.5, 2000);
        assert!(half > 50 && half < 100, "{half}");
        assert_eq!(update_num_iters(0.995, 0.99, 2000), 2000);
    }
}
