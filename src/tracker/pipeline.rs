use super::{Tracker, TrackerParams};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::FrameReport;
use crate::features::{FeatureExtractor, Keypoint, SiftExtractor};
use crate::homography::{Correspondence, HomographyEstimator};
use crate::image::io::load_rgb_image;
use crate::image::ImageF32;
use crate::matching::{BruteForceMatcher, DescriptorMatcher, MatchFilter};
use crate::projector::CornerProjector;
use crate::pyramid::multi_pyr_down;
use crate::types::{ModelError, Quad, RejectReason, TrackOutput};
use image::RgbImage;
use log::{debug, warn};
use std::path::Path;
use std::time::Instant;

const KNN_K: usize = 2;

/// Registered reference: keypoints on the downsampled model and its corners.
#[derive(Clone, Debug)]
struct ReferenceModel {
    keypoints: Vec<Keypoint>,
    quad: Quad,
    size: [usize; 2],
}

/// Tracker composed from a feature extractor and a descriptor matcher.
pub struct PlanarTracker<E: FeatureExtractor, M: DescriptorMatcher> {
    params: TrackerParams,
    extractor: E,
    matcher: M,
    filter: MatchFilter,
    estimator: HomographyEstimator,
    projector: CornerProjector,
    model: Option<ReferenceModel>,
    frame_size: Option<[u32; 2]>,
    /// Last accepted quad, reported again on reject.
    last: Option<Quad>,
}

impl PlanarTracker<SiftExtractor, BruteForceMatcher> {
    /// SIFT features with brute-force L2 matching, using the default
    /// [`TrackerParams`].
    pub fn sift_bf() -> Self {
        Self::sift_bf_with(TrackerParams::default())
    }

    pub fn sift_bf_with(params: TrackerParams) -> Self {
        let extractor = SiftExtractor::new(params.sift.clone());
        Self::new(params, extractor, BruteForceMatcher::new())
    }
}

impl<E: FeatureExtractor, M: DescriptorMatcher> PlanarTracker<E, M> {
    pub fn new(params: TrackerParams, extractor: E, matcher: M) -> Self {
        let filter = MatchFilter::new(params.ratio_threshold, params.min_matches);
        let estimator = HomographyEstimator::new(params.ransac.clone(), params.min_inliers);
        let projector = CornerProjector::new(params.frame_pyramid_levels, params.validate_quad);
        Self {
            params,
            extractor,
            matcher,
            filter,
            estimator,
            projector,
            model: None,
            frame_size: None,
            last: None,
        }
    }

    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    /// Reference quad on the downsampled model, once a model is registered.
    pub fn model_quad(&self) -> Option<Quad> {
        self.model.as_ref().map(|m| m.quad)
    }

    pub fn model_keypoints(&self) -> &[Keypoint] {
        self.model
            .as_ref()
            .map(|m| m.keypoints.as_slice())
            .unwrap_or(&[])
    }

    /// Size of the downsampled model in pixels.
    pub fn model_size(&self) -> Option<[usize; 2]> {
        self.model.as_ref().map(|m| m.size)
    }

    pub fn frame_size(&self) -> Option<[u32; 2]> {
        self.frame_size
    }

    /// Last accepted quad.
    pub fn last_quad(&self) -> Option<Quad> {
        self.last
    }

    fn to_gray_level(&self, rgb: &RgbImage, levels: usize) -> ImageF32 {
        multi_pyr_down(&ImageF32::from_rgb(rgb), levels)
    }

    /// Register `reference` as the model, discarding any previous one.
    ///
    /// The last accepted quad is kept and still reported on reject.
    pub fn reconfigure_model_image(&mut self, reference: &RgbImage) -> Result<(), ModelError> {
        let (width, height) = reference.dimensions();
        if width == 0 || height == 0 {
            return Err(ModelError::EmptyImage { width, height });
        }
        let start = Instant::now();
        let gray = self.to_gray_level(reference, self.params.model_pyramid_levels);
        let features = self.extractor.detect_and_compute(&gray);
        if features.is_empty() {
            warn!(
                "{}: reference {}x{} produced no features; every frame will be rejected",
                self.name(),
                width,
                height
            );
        }
        self.matcher.clear();
        let keypoints = features.keypoints;
        self.matcher.register(features.descriptors);
        self.model = Some(ReferenceModel {
            keypoints,
            quad: Quad::from_size(gray.w, gray.h),
            size: [gray.w, gray.h],
        });
        debug!(
            "{}: model {}x{} -> {}x{} keypoints={} in {:.1}ms",
            self.name(),
            width,
            height,
            gray.w,
            gray.h,
            self.model_keypoints().len(),
            elapsed_ms(start)
        );
        Ok(())
    }

    /// Same as [`Tracker::process_frame`], plus a per-stage report.
    pub fn process_frame_with_diagnostics(&mut self, frame: &RgbImage) -> (TrackOutput, FrameReport) {
        let total_start = Instant::now();
        let mut report = FrameReport::new([frame.width() as usize, frame.height() as usize]);
        let result = self.run_stages(frame, &mut report);
        report.timings.total_ms = elapsed_ms(total_start);

        let output = match result {
            Ok(quad) => {
                self.last = Some(quad);
                report.accepted = true;
                report.quad = Some(quad);
                TrackOutput::accepted(quad)
            }
            Err(reason) => {
                debug!("{}: frame rejected: {reason}", self.name());
                report.reject_reason = Some(reason.clone());
                TrackOutput::rejected(self.last, reason)
            }
        };
        (output, report)
    }

    fn run_stages(&self, frame: &RgbImage, report: &mut FrameReport) -> Result<Quad, RejectReason> {
        let model = self.model.as_ref().ok_or(RejectReason::NoModel)?;
        report.counts.model_keypoints = model.keypoints.len();

        let stage = Instant::now();
        let gray = self.to_gray_level(frame, self.params.frame_pyramid_levels);
        report.working_size = [gray.w, gray.h];
        report.timings.record("pyramid", stage);

        let stage = Instant::now();
        let features = self.extractor.detect_and_compute(&gray);
        report.counts.frame_keypoints = features.len();
        report.timings.record("features", stage);
        if features.descriptors.is_empty() {
            return Err(RejectReason::NoDescriptors);
        }

        let stage = Instant::now();
        let knn = self.matcher.knn_match(&features.descriptors, KNN_K);
        report.counts.knn_queries = knn.len();
        report.timings.record("knn", stage);

        let good = self.filter.filter(&knn)?;
        report.counts.good_matches = good.len();

        let correspondences: Vec<Correspondence> = good
            .iter()
            .map(|m| Correspondence {
                reference: model.keypoints[m.train_idx].pt(),
                frame: features.keypoints[m.query_idx].pt(),
            })
            .collect();

        let stage = Instant::now();
        let fit = self.estimator.estimate(&correspondences);
        report.timings.record("homography", stage);
        let fit = fit?;
        report.counts.inliers = fit.inlier_count;
        report.homography = Some([
            [fit.h[(0, 0)], fit.h[(0, 1)], fit.h[(0, 2)]],
            [fit.h[(1, 0)], fit.h[(1, 1)], fit.h[(1, 2)]],
            [fit.h[(2, 0)], fit.h[(2, 1)], fit.h[(2, 2)]],
        ]);

        self.projector.project(&fit.h, &model.quad)
    }
}

impl<E: FeatureExtractor, M: DescriptorMatcher> Tracker for PlanarTracker<E, M> {
    fn reconfigure_model(&mut self, path: &Path) -> Result<(), ModelError> {
        let reference = load_rgb_image(path).map_err(|reason| ModelError::Unreadable {
            path: path.to_path_buf(),
            reason,
        })?;
        self.reconfigure_model_image(&reference)
    }

    fn reinit_frame_size(&mut self, width: u32, height: u32) {
        debug!("{}: frame size {}x{}", self.name(), width, height);
        self.frame_size = Some([width, height]);
    }

    fn process_frame(&mut self, frame: &RgbImage) -> TrackOutput {
        self.process_frame_with_diagnostics(frame).0
    }

    fn name(&self) -> String {
        format!("{}_{}Tracker", self.extractor.name(), self.matcher.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn uniform(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([128, 128, 128]))
    }

    #[test]
    fn preset_name_and_defaults() {
        let tracker = PlanarTracker::sift_bf();
        assert_eq!(tracker.name(), "SIFT_BFTracker");
        assert_eq!(tracker.params().model_pyramid_levels, 1);
        assert!(tracker.model_quad().is_none());
    }

    #[test]
    fn processing_without_model_rejects() {
        let mut tracker = PlanarTracker::sift_bf();
        let out = tracker.process_frame(&uniform(32, 32));
        assert!(out.rejected);
        assert_eq!(out.reason, Some(RejectReason::NoModel));
        assert!(out.quad.is_none());
    }

    #[test]
    fn empty_reference_is_a_configuration_error() {
        let mut tracker = PlanarTracker::sift_bf();
        let err = tracker.reconfigure_model_image(&RgbImage::new(0, 0)).unwrap_err();
        assert!(matches!(err, ModelError::EmptyImage { .. }));
    }

    #[test]
    fn missing_reference_file_is_a_configuration_error() {
        let mut tracker = PlanarTracker::sift_bf();
        let err = tracker
            .reconfigure_model(Path::new("/nonexistent/reference.png"))
            .unwrap_err();
        assert!(matches!(err, ModelError::Unreadable { .. }));
    }

    #[test]
    fn model_quad_uses_downsampled_size() {
        let mut tracker = PlanarTracker::sift_bf();
        tracker.reconfigure_model_image(&uniform(40, 30)).unwrap();
        assert_eq!(tracker.model_size(), Some([20, 15]));
        assert_eq!(tracker.model_quad(), Some(Quad::from_size(20, 15)));
        assert!(tracker.matcher().registered().is_some());
    }
}
