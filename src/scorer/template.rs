use super::{MetricKind, MetricScore, PreparedImage, Scorer};
use crate::search::{locate, SearchConfig};
use crate::trace::{trace_event, trace_span};
use crate::util::math::unit_to_percent;
use crate::util::{ConfigError, Result};

/// Template scorer parameters.
#[derive(Clone, Debug)]
pub struct TemplateConfig {
    /// Scale factors applied to each image before it is searched in the
    /// other, each in `(0, 1]`.
    pub scales: Vec<f32>,
    /// Coarse-to-fine search parameters.
    pub search: SearchConfig,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            scales: vec![1.0, 0.9, 0.8, 0.7],
            search: SearchConfig::default(),
        }
    }
}

impl TemplateConfig {
    /// Requires at least one scale, all inside `(0, 1]`.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.scales.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "template.scales",
                reason: "at least one scale is required",
            });
        }
        if self.scales.iter().any(|&s| !(s > 0.0 && s <= 1.0)) {
            return Err(ConfigError::InvalidParameter {
                name: "template.scales",
                reason: "scale must lie in (0, 1]",
            });
        }
        if self.search.beam_width == 0 || self.search.coarse_topk == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "template.search",
                reason: "beam_width and coarse_topk must be at least 1",
            });
        }
        Ok(())
    }
}

/// Multi-scale ZNCC between the reference and the candidate.
///
/// Scaled copies of each image are searched in the other. The score is the
/// best correlation over both directions, all scales and placements, with
/// negative correlation mapped to 0.
#[derive(Clone, Debug, Default)]
pub struct TemplateScorer {
    cfg: TemplateConfig,
}

impl TemplateScorer {
    pub fn new(cfg: TemplateConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.cfg
    }
}

impl Scorer for TemplateScorer {
    fn kind(&self) -> MetricKind {
        MetricKind::Template
    }

    fn score(&self, reference: &PreparedImage, candidate: &PreparedImage) -> Result<MetricScore> {
        let _span = trace_span!("template_score").entered();
        // Reference templates cover a candidate with extra margin, candidate
        // templates cover a crop or zoom of the reference.
        let directions = [(reference, candidate), (candidate, reference)];
        let mut best = 0.0f32;
        for (source, target) in directions {
            for template in source.templates() {
                if let Some(placement) = locate(target.pyramid(), template, &self.cfg.search)? {
                    best = best.max(placement.score);
                }
            }
        }
        let value = unit_to_percent(f64::from(best));
        trace_event!("metric", kind = "template", value = value);
        Ok(MetricScore::new(MetricKind::Template, value))
    }
}
