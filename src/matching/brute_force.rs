use super::{DescriptorMatcher, Match};
use crate::features::types::l2_distance;
use crate::features::DescriptorSet;
use rayon::prelude::*;

/// Exhaustive L2 matcher.
#[derive(Clone, Debug, Default)]
pub struct BruteForceMatcher {
    reference: Option<DescriptorSet>,
}

impl BruteForceMatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Keep the `k` smallest distances of one query row, ascending. Ties keep
/// the lower reference index first.
fn best_k(query_idx: usize, row: &[f32], reference: &DescriptorSet, k: usize) -> Vec<Match> {
    let mut best: Vec<Match> = Vec::with_capacity(k + 1);
    for (train_idx, candidate) in reference.rows().enumerate() {
        let distance = l2_distance(row, candidate);
        if best.len() == k && best.last().is_some_and(|m| distance >= m.distance) {
            continue;
        }
        let pos = best.partition_point(|m| m.distance <= distance);
        best.insert(
            pos,
            Match {
                query_idx,
                train_idx,
                distance,
            },
        );
        best.truncate(k);
    }
    best
}

impl DescriptorMatcher for BruteForceMatcher {
    fn clear(&mut self) {
        self.reference = None;
    }

    fn register(&mut self, reference: DescriptorSet) {
        self.clear();
        self.reference = Some(reference);
    }

    fn registered(&self) -> Option<&DescriptorSet> {
        self.reference.as_ref()
    }

    fn knn_match(&self, query: &DescriptorSet, k: usize) -> Vec<Vec<Match>> {
        let Some(reference) = self.reference.as_ref() else {
            return Vec::new();
        };
        if query.is_empty() || k == 0 {
            return Vec::new();
        }
        if query.dim() != reference.dim() {
            log::warn!(
                "BruteForce: descriptor size mismatch (query {}, reference {})",
                query.dim(),
                reference.dim()
            );
            return Vec::new();
        }
        let rows: Vec<&[f32]> = query.rows().collect();
        rows.par_iter()
            .enumerate()
            .map(|(qi, row)| best_k(qi, row, reference, k))
            .collect()
    }

    fn name(&self) -> &'static str {
        "BF"
    }
}
