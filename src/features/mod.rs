//! Oriented FAST keypoints with rotated BRIEF descriptors.
//!
//! Keypoints are detected on every octave of the grayscale pyramid, which
//! gives tolerance to moderate scale changes; the intensity-centroid angle
//! steers the descriptor pattern for rotation tolerance. Coordinates are
//! reported in level-0 pixels.

mod brief;
mod fast;
pub mod matcher;

pub use matcher::{match_descriptors, FeatureMatch};

use crate::image::pyramid::ImagePyramid;
use crate::trace::{trace_event, trace_span};
use crate::util::ConfigError;
use std::cmp::Ordering;

/// Keypoint detection and description parameters.
#[derive(Clone, Debug)]
pub struct FeatureConfig {
    /// FAST intensity threshold.
    pub fast_threshold: u8,
    /// Keypoints kept per image, strongest first.
    pub max_keypoints: usize,
    /// Pyramid octaves searched for keypoints.
    pub octaves: usize,
    /// Lowe ratio for the nearest-neighbour test.
    pub ratio: f32,
    /// Largest accepted Hamming distance.
    pub max_distance: u32,
    /// Images with fewer keypoints score 0 on this metric.
    pub min_keypoints: usize,
    /// Box blur radius applied before sampling descriptors.
    pub blur_radius: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            max_keypoints: 500,
            octaves: 3,
            ratio: 0.75,
            max_distance: 64,
            min_keypoints: 8,
            blur_radius: 2,
        }
    }
}

impl FeatureConfig {
    /// Rejects ratios outside `(0, 1]` and zero counts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ratio > 0.0 && self.ratio <= 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "features.ratio",
                reason: "must lie in (0, 1]",
            });
        }
        if self.max_keypoints == 0 || self.octaves == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "features.max_keypoints",
                reason: "max_keypoints and octaves must be at least 1",
            });
        }
        if self.min_keypoints == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "features.min_keypoints",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// A keypoint in level-0 coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    /// Column in level-0 pixels.
    pub x: f32,
    /// Row in level-0 pixels.
    pub y: f32,
    /// Pyramid octave the keypoint was detected on.
    pub level: usize,
    /// Orientation in radians.
    pub angle: f32,
    /// FAST score.
    pub response: f32,
}

/// A keypoint with its binary descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub keypoint: Keypoint,
    pub descriptor: [u8; 32],
}

/// Features of one image, strongest first.
#[derive(Clone, Debug, Default)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    /// Returns the features as a slice.
    pub fn as_slice(&self) -> &[Feature] {
        &self.features
    }

    /// Returns the number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` when no keypoint was found.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn keypoint_cmp(a: &Feature, b: &Feature) -> Ordering {
    b.keypoint
        .response
        .total_cmp(&a.keypoint.response)
        .then_with(|| a.keypoint.level.cmp(&b.keypoint.level))
        .then_with(|| a.keypoint.y.total_cmp(&b.keypoint.y))
        .then_with(|| a.keypoint.x.total_cmp(&b.keypoint.x))
}

/// Detects and describes keypoints over the first `cfg.octaves` pyramid levels.
pub fn detect_features(pyramid: &ImagePyramid, cfg: &FeatureConfig) -> FeatureSet {
    let _span = trace_span!("detect_features", octaves = cfg.octaves).entered();

    let mut features = Vec::new();
    for (level, image) in pyramid.levels().iter().enumerate().take(cfg.octaves.max(1)) {
        let view = image.view();
        let corners = fast::detect(view, cfg.fast_threshold, brief::DESCRIPTOR_BORDER);
        if corners.is_empty() {
            continue;
        }
        let blurred = brief::box_blur(view, cfg.blur_radius);
        let factor = (1usize << level) as f32;
        for corner in corners {
            let angle = brief::orientation(view, corner.x, corner.y);
            let descriptor = brief::describe(
                &blurred,
                image.width(),
                image.height(),
                corner.x,
                corner.y,
                angle,
            );
            features.push(Feature {
                keypoint: Keypoint {
                    x: (corner.x as f32 + 0.5) * factor - 0.5,
                    y: (corner.y as f32 + 0.5) * factor - 0.5,
                    level,
                    angle,
                    response: corner.score,
                },
                descriptor,
            });
        }
    }

    features.sort_by(keypoint_cmp);
    features.truncate(cfg.max_keypoints);
    trace_event!("keypoints", count = features.len());
    FeatureSet { features }
}
