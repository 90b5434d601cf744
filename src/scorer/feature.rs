use super::{MetricKind, MetricScore, PreparedImage, Scorer};
use crate::features::{match_descriptors, FeatureConfig, FeatureMatch};
use crate::geometry::{ransac_homography, RansacConfig};
use crate::trace::{trace_event, trace_span};
use crate::util::Result;

/// Keypoint correspondence ratio, optionally restricted to RANSAC inliers.
#[derive(Clone, Debug, Default)]
pub struct FeatureScorer {
    features: FeatureConfig,
    ransac: RansacConfig,
    verify: bool,
}

impl FeatureScorer {
    pub fn new(features: FeatureConfig, ransac: RansacConfig, verify: bool) -> Self {
        Self {
            features,
            ransac,
            verify,
        }
    }

    /// Returns a copy with geometric verification switched on or off.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Returns `true` when only RANSAC inliers are counted.
    pub fn verifies(&self) -> bool {
        self.verify
    }

    fn verified_count(
        &self,
        reference: &PreparedImage,
        candidate: &PreparedImage,
        matches: &[FeatureMatch],
    ) -> usize {
        if matches.len() < self.ransac.min_inliers {
            return 0;
        }
        let ref_features = reference.features().as_slice();
        let cand_features = candidate.features().as_slice();
        let (src, dst): (Vec<(f64, f64)>, Vec<(f64, f64)>) = matches
            .iter()
            .map(|m| {
                let a = &ref_features[m.reference_idx].keypoint;
                let b = &cand_features[m.candidate_idx].keypoint;
                (
                    (f64::from(a.x), f64::from(a.y)),
                    (f64::from(b.x), f64::from(b.y)),
                )
            })
            .unzip();

        match ransac_homography(&src, &dst, &self.ransac) {
            Some(outcome) if outcome.inlier_count >= self.ransac.min_inliers => {
                outcome.inlier_count
            }
            _ => 0,
        }
    }
}

impl Scorer for FeatureScorer {
    fn kind(&self) -> MetricKind {
        MetricKind::Feature
    }

    fn score(&self, reference: &PreparedImage, candidate: &PreparedImage) -> Result<MetricScore> {
        let _span = trace_span!("feature_score", verify = self.verify).entered();
        let ref_count = reference.features().len();
        let cand_count = candidate.features().len();
        let min_count = ref_count.min(cand_count);
        if min_count < self.features.min_keypoints {
            trace_event!("metric", kind = "feature", value = 0.0f32);
            return Ok(MetricScore::new(MetricKind::Feature, 0.0));
        }

        let matches = match_descriptors(
            reference.features().as_slice(),
            candidate.features().as_slice(),
            self.features.ratio,
            self.features.max_distance,
        );
        let count = if self.verify {
            self.verified_count(reference, candidate, &matches)
        } else {
            matches.len()
        };

        let value = (count as f32 / min_count as f32 * 100.0).min(100.0);
        trace_event!(
            "metric",
            kind = "feature",
            value = value,
            matches = matches.len(),
            counted = count
        );
        Ok(MetricScore::new(MetricKind::Feature, value))
    }
}
