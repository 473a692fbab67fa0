//! Per-frame diagnostics returned by
//! [`PlanarTracker::process_frame_with_diagnostics`](crate::PlanarTracker).
//!
//! A [`FrameReport`] records how far a frame got through the pipeline (stage
//! counts, the reject reason if any) together with a [`TimingBreakdown`]. All
//! structures serialize to camelCase JSON.

pub mod report;
pub mod timing;

pub use report::{FrameReport, StageCounts};
pub use timing::{StageTiming, TimingBreakdown};
