//! Descriptor matching against one registered reference set, followed by the
//! ratio-test filter.
//!
//! The matcher owns the reference descriptors; `register` always replaces the
//! previous set so at most one model is matched against at any time.

pub mod brute_force;
pub mod filter;

use crate::features::DescriptorSet;
use serde::Serialize;

pub use brute_force::BruteForceMatcher;
pub use filter::{ratio_test, MatchFilter};

/// One candidate pairing of a query descriptor with a reference descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

/// Strategy matching query descriptors against a registered reference set.
pub trait DescriptorMatcher {
    /// Drop the registered reference set.
    fn clear(&mut self);

    /// Replace the reference set.
    fn register(&mut self, reference: DescriptorSet);

    fn registered(&self) -> Option<&DescriptorSet>;

    /// Up to `k` matches per query row, nearest first. Rows of an empty query
    /// (or with nothing registered) produce an empty result.
    fn knn_match(&self, query: &DescriptorSet, k: usize) -> Vec<Vec<Match>>;

    fn name(&self) -> &'static str;
}
