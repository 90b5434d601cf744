//! The four similarity scorers and the per-image data they share.
//!
//! An image is prepared once (working buffers, pyramid, scaled templates,
//! keypoints, colour histogram) and then compared any number of times. Every
//! scorer maps a reference/candidate pair to a value in `[0, 100]`.

mod feature;
mod histogram;
mod structural;
mod template;

pub use feature::FeatureScorer;
pub use histogram::{ColorHistogram, HistogramConfig, HistogramScorer};
pub use structural::{mean_ssim, SsimConfig, StructuralScorer};
pub use template::{TemplateConfig, TemplateScorer};

use crate::features::{detect_features, FeatureConfig, FeatureSet};
use crate::image::pyramid::ImagePyramid;
use crate::normalize::NormalizedImage;
use crate::template::ScaledTemplate;
use crate::trace::trace_span;
use crate::util::math::clamp_percent;
use crate::util::{MatchError, Result};
use std::fmt;

/// Smallest pyramid side kept for the working image.
const PYRAMID_MIN_SIDE: usize = 16;

/// Smallest pyramid side kept for scaled templates.
const TEMPLATE_MIN_SIDE: usize = 8;

/// Identifies one of the four similarity signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    /// Zero-mean normalized cross-correlation over scales.
    Template,
    /// Matched keypoint descriptors.
    Feature,
    /// Mean structural similarity.
    Structural,
    /// Hue/saturation histogram correlation.
    Histogram,
}

impl MetricKind {
    /// All metrics in fusion order.
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Template,
        MetricKind::Feature,
        MetricKind::Structural,
        MetricKind::Histogram,
    ];

    /// Lower-case name used in logs and reports.
    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Template => "template",
            MetricKind::Feature => "feature",
            MetricKind::Structural => "structural",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single metric value in `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricScore {
    pub kind: MetricKind,
    pub value: f32,
}

impl MetricScore {
    /// Builds a score, clamping `value` to `[0, 100]` (NaN becomes 0).
    pub fn new(kind: MetricKind, value: f32) -> Self {
        Self {
            kind,
            value: clamp_percent(value),
        }
    }
}

/// A similarity signal between two prepared images.
pub trait Scorer: Send + Sync {
    /// Which metric this scorer produces.
    fn kind(&self) -> MetricKind;

    /// Scores `candidate` against `reference`.
    fn score(&self, reference: &PreparedImage, candidate: &PreparedImage) -> Result<MetricScore>;
}

/// Everything the scorers need from one normalized image.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    normalized: NormalizedImage,
    pyramid: ImagePyramid,
    templates: Vec<ScaledTemplate>,
    features: FeatureSet,
    histogram: ColorHistogram,
}

impl PreparedImage {
    /// Builds the shared pyramid, scaled templates, keypoints and histogram.
    ///
    /// Scales at which the image is flat produce no template; such an image
    /// simply scores 0 on the template metric.
    pub fn new(
        normalized: NormalizedImage,
        template: &TemplateConfig,
        features: &FeatureConfig,
        histogram: &HistogramConfig,
    ) -> Result<Self> {
        let _span = trace_span!("prepare", id = normalized.id()).entered();
        let levels = template.search.max_levels.max(features.octaves).max(1);
        let gray = normalized.gray().view();
        let pyramid = ImagePyramid::build_u8(gray, levels, PYRAMID_MIN_SIDE)?;

        let mut templates = Vec::with_capacity(template.scales.len());
        for &scale in &template.scales {
            match ScaledTemplate::compile(gray, scale, template.search.max_levels, TEMPLATE_MIN_SIDE)
            {
                Ok(tpl) => templates.push(tpl),
                Err(MatchError::DegenerateTemplate { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        let features = detect_features(&pyramid, features);
        let histogram = ColorHistogram::from_rgb(normalized.rgb(), histogram);
        Ok(Self {
            normalized,
            pyramid,
            templates,
            features,
            histogram,
        })
    }

    /// Returns the source identifier.
    pub fn id(&self) -> &str {
        self.normalized.id()
    }

    /// Returns the working-resolution buffers.
    pub fn normalized(&self) -> &NormalizedImage {
        &self.normalized
    }

    /// Returns the grayscale pyramid (level 0 is the working resolution).
    pub fn pyramid(&self) -> &ImagePyramid {
        &self.pyramid
    }

    /// Returns the non-degenerate scaled templates.
    pub fn templates(&self) -> &[ScaledTemplate] {
        &self.templates
    }

    /// Returns the detected keypoints and descriptors.
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Returns the hue/saturation histogram.
    pub fn histogram(&self) -> &ColorHistogram {
        &self.histogram
    }
}
