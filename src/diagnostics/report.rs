use super::TimingBreakdown;
use crate::types::{Quad, RejectReason};
use serde::Serialize;

/// Number of items surviving each stage; zero for stages never reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCounts {
    pub frame_keypoints: usize,
    pub model_keypoints: usize,
    pub knn_queries: usize,
    pub good_matches: usize,
    pub inliers: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    /// Size of the frame as handed to the tracker.
    pub frame_size: [usize; 2],
    /// Size after pyramid downsampling.
    pub working_size: [usize; 2],
    pub counts: StageCounts,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<RejectReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quad: Option<Quad>,
    /// Row-major reference → working-frame homography.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homography: Option<[[f64; 3]; 3]>,
    pub timings: TimingBreakdown,
}

impl FrameReport {
    pub fn new(frame_size: [usize; 2]) -> Self {
        Self {
            frame_size,
            working_size: frame_size,
            counts: StageCounts::default(),
            accepted: false,
            reject_reason: None,
            quad: None,
            homography: None,
            timings: TimingBreakdown::default(),
        }
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let c = &self.counts;
        let outcome = match &self.reject_reason {
            None => "accepted".to_string(),
            Some(reason) => format!("rejected: {reason}"),
        };
        format!(
            "kp={} knn={} good={} inliers={} {:.1}ms {}",
            c.frame_keypoints, c.knn_queries, c.good_matches, c.inliers, self.timings.total_ms, outcome
        )
    }
}
