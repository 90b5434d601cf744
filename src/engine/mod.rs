//! The matching engine: normalization, scoring, fusion and selection.
//!
//! [`Engine`] owns one immutable [`EngineConfig`]. The free functions
//! [`compare`] and [`find_best_match`] build an engine with default settings
//! and the supplied weights.

use crate::features::FeatureConfig;
use crate::fusion::{fuse, BonusLevel, FusionConfig, FusionWeights};
use crate::geometry::RansacConfig;
use crate::image::Image;
use crate::normalize::{normalize, NormalizeConfig};
use crate::scorer::{
    FeatureScorer, HistogramConfig, HistogramScorer, MetricKind, MetricScore, PreparedImage,
    Scorer, SsimConfig, StructuralScorer, TemplateConfig, TemplateScorer,
};
use crate::select::{select_best, CancellationToken, MatchResult, SelectorConfig};
use crate::trace::{trace_event, trace_span};
use crate::util::{ConfigError, Result};

/// Complete engine configuration.
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    pub normalize: NormalizeConfig,
    pub template: TemplateConfig,
    pub features: FeatureConfig,
    pub ransac: RansacConfig,
    pub ssim: SsimConfig,
    pub histogram: HistogramConfig,
    pub fusion: FusionConfig,
    pub selector: SelectorConfig,
    /// Count only RANSAC-consistent keypoint matches.
    pub geometric_verification: bool,
}

impl EngineConfig {
    /// Validates every section.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.normalize.validate()?;
        self.template.validate()?;
        self.features.validate()?;
        self.ransac.validate()?;
        self.ssim.validate()?;
        self.histogram.validate()?;
        Ok(())
    }
}

/// The four metric scores of one comparison and their fusion.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonReport {
    /// Scores in [`MetricKind::ALL`] order.
    pub metrics: [MetricScore; 4],
    /// Weighted sum before the consistency bonus.
    pub weighted: f32,
    /// Final score in `[0, 100]`.
    pub fused: f32,
    /// Metrics strictly above the high-confidence threshold.
    pub high_count: usize,
    pub bonus: BonusLevel,
}

impl ComparisonReport {
    /// Returns the value of one metric.
    pub fn metric(&self, kind: MetricKind) -> f32 {
        self.metrics
            .iter()
            .find(|m| m.kind == kind)
            .map_or(0.0, |m| m.value)
    }
}

/// A configured matching engine.
///
/// ```no_run
/// use prodmatch::{CancellationToken, Engine, EngineConfig, Image};
///
/// let engine = Engine::new(EngineConfig::default())?;
/// let reference = Image::from_gray("ref", vec![0; 64 * 64], 64, 64);
/// let pool = vec![Image::from_gray("a", vec![0; 64 * 64], 64, 64)];
/// let result = engine.find_best_match(&reference, &pool, &CancellationToken::new())?;
/// println!("{:?} {}", result.candidate_id, result.score);
/// # Ok::<(), prodmatch::MatchError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Engine {
    cfg: EngineConfig,
    template: TemplateScorer,
    feature: FeatureScorer,
    structural: StructuralScorer,
    histogram: HistogramScorer,
}

impl Engine {
    /// Validates `cfg` and builds the scorers.
    pub fn new(cfg: EngineConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            template: TemplateScorer::new(cfg.template.clone()),
            feature: FeatureScorer::new(
                cfg.features.clone(),
                cfg.ransac.clone(),
                cfg.geometric_verification,
            ),
            structural: StructuralScorer::new(cfg.ssim.clone()),
            histogram: HistogramScorer,
            cfg,
        })
    }

    /// Returns a copy using different fusion weights.
    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.cfg.fusion = self.cfg.fusion.with_weights(weights);
        self
    }

    /// Returns a copy with geometric verification switched on or off.
    pub fn with_geometric_verification(mut self, enabled: bool) -> Self {
        self.cfg.geometric_verification = enabled;
        self.feature = self.feature.with_verification(enabled);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    fn scorers(&self) -> [&dyn Scorer; 4] {
        [
            &self.template as &dyn Scorer,
            &self.feature,
            &self.structural,
            &self.histogram,
        ]
    }

    /// Normalizes an image and extracts everything the scorers reuse.
    pub fn prepare(&self, image: &Image) -> Result<PreparedImage> {
        let normalized = normalize(image, &self.cfg.normalize)?;
        PreparedImage::new(
            normalized,
            &self.cfg.template,
            &self.cfg.features,
            &self.cfg.histogram,
        )
    }

    /// Scores and fuses two prepared images.
    pub fn compare_prepared(
        &self,
        reference: &PreparedImage,
        candidate: &PreparedImage,
    ) -> Result<ComparisonReport> {
        let _span = trace_span!("compare", reference = reference.id(), candidate = candidate.id())
            .entered();
        let mut metrics = MetricKind::ALL.map(|kind| MetricScore::new(kind, 0.0));
        for (slot, scorer) in metrics.iter_mut().zip(self.scorers()) {
            *slot = scorer.score(reference, candidate)?;
        }

        let fused = fuse(&metrics, &self.cfg.fusion);
        trace_event!(
            "fused",
            weighted = fused.weighted,
            fused = fused.fused,
            high = fused.high_count
        );
        Ok(ComparisonReport {
            metrics,
            weighted: fused.weighted,
            fused: fused.fused,
            high_count: fused.high_count,
            bonus: fused.bonus,
        })
    }

    /// Compares a candidate against a reference.
    pub fn compare(&self, reference: &Image, candidate: &Image) -> Result<ComparisonReport> {
        let reference = self.prepare(reference)?;
        let candidate = self.prepare(candidate)?;
        self.compare_prepared(&reference, &candidate)
    }

    /// Selects the candidate most similar to `reference`.
    ///
    /// The reference is prepared once. Returns [`MatchError::EmptyPool`] for
    /// an empty pool and [`MatchError::Decode`] when the reference itself
    /// cannot be decoded; per-candidate failures are collected in the result.
    ///
    /// [`MatchError::EmptyPool`]: crate::MatchError::EmptyPool
    /// [`MatchError::Decode`]: crate::MatchError::Decode
    pub fn find_best_match(
        &self,
        reference: &Image,
        candidates: &[Image],
        cancel: &CancellationToken,
    ) -> Result<MatchResult> {
        let _span = trace_span!(
            "find_best_match",
            reference = reference.id(),
            candidates = candidates.len()
        )
        .entered();
        if candidates.is_empty() {
            return Err(crate::MatchError::EmptyPool);
        }
        let prepared = self.prepare(reference)?;
        select_best(
            reference.id(),
            candidates,
            &self.cfg.selector,
            cancel,
            |candidate| {
                let candidate = self.prepare(candidate)?;
                self.compare_prepared(&prepared, &candidate)
            },
        )
    }
}

/// Compares two images with default settings and the given weights.
pub fn compare(
    reference: &Image,
    candidate: &Image,
    weights: &FusionWeights,
    use_geometric_verification: bool,
) -> Result<ComparisonReport> {
    Engine::new(EngineConfig::default())?
        .with_weights(*weights)
        .with_geometric_verification(use_geometric_verification)
        .compare(reference, candidate)
}

/// Finds the best candidate with default settings and the given weights.
pub fn find_best_match(
    reference: &Image,
    candidates: &[Image],
    weights: &FusionWeights,
    use_geometric_verification: bool,
    cancel: &CancellationToken,
) -> Result<MatchResult> {
    Engine::new(EngineConfig::default())?
        .with_weights(*weights)
        .with_geometric_verification(use_geometric_verification)
        .find_best_match(reference, candidates, cancel)
}
