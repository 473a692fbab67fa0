use super::Match;
use crate::types::RejectReason;
use log::debug;

/// Best match of every query whose two nearest candidates are far enough
/// apart: `best.distance < ratio * second.distance`. Queries with fewer than
/// two candidates are dropped.
pub fn ratio_test(knn: &[Vec<Match>], ratio: f32) -> Vec<Match> {
    knn.iter()
        .filter_map(|cands| match cands.as_slice() {
            [best, second, ..] if best.distance < ratio * second.distance => Some(*best),
            _ => None,
        })
        .collect()
}

/// Ratio test followed by a minimum surviving-match count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchFilter {
    pub ratio: f32,
    pub min_matches: usize,
}

impl MatchFilter {
    pub fn new(ratio: f32, min_matches: usize) -> Self {
        Self { ratio, min_matches }
    }

    pub fn filter(&self, knn: &[Vec<Match>]) -> Result<Vec<Match>, RejectReason> {
        let good = ratio_test(knn, self.ratio);
        if good.len() < self.min_matches {
            debug!(
                "MatchFilter: {} of {} queries passed ratio {:.2}, need {}",
                good.len(),
                knn.len(),
                self.ratio,
                self.min_matches
            );
            return Err(RejectReason::InsufficientMatches {
                found: good.len(),
                required: self.min_matches,
            });
        }
        Ok(good)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(q: usize, d0: f32, d1: f32) -> Vec<Match> {
        vec![
            Match {
                query_idx: q,
                train_idx: 0,
                distance: d0,
            },
            Match {
                query_idx: q,
                train_idx: 1,
                distance: d1,
            },
        ]
    }

    fn candidates(n: usize) -> Vec<Vec<Match>> {
        (0..n).map(|q| pair(q, 0.1 + q as f32 * 0.05, 1.0)).collect()
    }

    #[test]
    fn ratio_is_strict_and_drops_single_candidates() {
        let knn = vec![
            pair(0, 0.5, 1.0),
            pair(1, 0.75, 1.0),
            vec![Match {
                query_idx: 2,
                train_idx: 0,
                distance: 0.0,
            }],
            Vec::new(),
        ];
        let kept = ratio_test(&knn, 0.75);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].query_idx, 0);
    }

    #[test]
    fn raising_ratio_never_shrinks_survivors() {
        let knn = candidates(20);
        let mut prev = 0;
        for r in [0.1, 0.3, 0.5, 0.75, 0.9, 1.0] {
            let n = ratio_test(&knn, r).len();
            assert!(n >= prev, "ratio {r}: {n} < {prev}");
            prev = n;
        }
    }

    #[test]
    fn minimum_count_boundary() {
        let filter = MatchFilter::new(0.99, 15);
        assert_eq!(
            filter.filter(&candidates(14)),
            Err(RejectReason::InsufficientMatches {
                found: 14,
                required: 15
            })
        );
        assert_eq!(filter.filter(&candidates(15)).map(|m| m.len()), Ok(15));
    }
}
