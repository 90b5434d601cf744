//! Weighted score fusion with a consistency bonus.
//!
//! `weighted = Σ weight_i * score_i / 100`, then multiplied by a tiered bonus
//! when several metrics independently exceed the high-confidence threshold,
//! then clamped to `[0, 100]`.

use crate::scorer::{MetricKind, MetricScore};
use crate::util::math::clamp_percent;
use crate::util::ConfigError;

/// Allowed deviation of the weight sum from 100.
pub const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

/// Per-metric fusion weights; always non-negative and summing to 100.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FusionWeights {
    template: f32,
    feature: f32,
    structural: f32,
    histogram: f32,
}

impl FusionWeights {
    /// Validates and builds a weight set.
    pub fn new(
        template: f32,
        feature: f32,
        structural: f32,
        histogram: f32,
    ) -> Result<Self, ConfigError> {
        let weights = Self {
            template,
            feature,
            structural,
            histogram,
        };
        let mut sum = 0.0f32;
        for kind in MetricKind::ALL {
            let value = weights.get(kind);
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteWeight {
                    metric: kind.name(),
                });
            }
            if value < 0.0 {
                return Err(ConfigError::NegativeWeight {
                    metric: kind.name(),
                    value,
                });
            }
            sum += value;
        }
        if (sum - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightsSum { sum });
        }
        Ok(weights)
    }

    /// Returns the weight of one metric.
    pub fn get(&self, kind: MetricKind) -> f32 {
        match kind {
            MetricKind::Template => self.template,
            MetricKind::Feature => self.feature,
            MetricKind::Structural => self.structural,
            MetricKind::Histogram => self.histogram,
        }
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            template: 60.0,
            feature: 25.0,
            structural: 10.0,
            histogram: 5.0,
        }
    }
}

/// How agreement between metrics raises the fused score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConsistencyBonus {
    /// No multiplier is applied.
    Disabled,
    /// `two` when exactly two metrics are high, `three` when three or more are.
    Tiered { two: f32, three: f32 },
}

impl Default for ConsistencyBonus {
    fn default() -> Self {
        ConsistencyBonus::Tiered {
            two: 1.15,
            three: 1.25,
        }
    }
}

/// Which bonus tier was applied to a fused score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BonusLevel {
    /// Fewer than two high metrics, or the bonus is disabled.
    None,
    /// Exactly two high metrics.
    Pair,
    /// Three or more high metrics.
    Majority,
}

impl BonusLevel {
    pub fn name(self) -> &'static str {
        match self {
            BonusLevel::None => "none",
            BonusLevel::Pair => "pair",
            BonusLevel::Majority => "majority",
        }
    }
}

/// Immutable fusion parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct FusionConfig {
    weights: FusionWeights,
    threshold: f32,
    bonus: ConsistencyBonus,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            threshold: 70.0,
            bonus: ConsistencyBonus::default(),
        }
    }
}

impl FusionConfig {
    /// Builds a configuration, rejecting thresholds outside `[0, 100]` and
    /// multipliers that are non-finite or below 1.
    pub fn new(
        weights: FusionWeights,
        threshold: f32,
        bonus: ConsistencyBonus,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ConfigError::Threshold(threshold));
        }
        if let ConsistencyBonus::Tiered { two, three } = bonus {
            for m in [two, three] {
                if !(m.is_finite() && m >= 1.0) {
                    return Err(ConfigError::BonusMultiplier(m));
                }
            }
        }
        Ok(Self {
            weights,
            threshold,
            bonus,
        })
    }

    /// Returns a copy using `weights`.
    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    /// Scores strictly above this count as high confidence.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn bonus(&self) -> ConsistencyBonus {
        self.bonus
    }
}

/// Result of fusing four metric scores.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fused {
    /// Weighted sum before the bonus.
    pub weighted: f32,
    /// Final score in `[0, 100]`.
    pub fused: f32,
    /// Metrics strictly above the threshold.
    pub high_count: usize,
    /// Applied bonus tier.
    pub bonus: BonusLevel,
}

/// Fuses metric scores. Metrics absent from `scores` contribute 0.
pub fn fuse(scores: &[MetricScore], cfg: &FusionConfig) -> Fused {
    let weighted: f32 = scores
        .iter()
        .map(|s| cfg.weights.get(s.kind) * clamp_percent(s.value))
        .sum::<f32>()
        / 100.0;
    let high_count = scores
        .iter()
        .filter(|s| clamp_percent(s.value) > cfg.threshold)
        .count();

    let (multiplier, bonus) = match cfg.bonus {
        ConsistencyBonus::Disabled => (1.0, BonusLevel::None),
        ConsistencyBonus::Tiered { three, .. } if high_count >= 3 => (three, BonusLevel::Majority),
        ConsistencyBonus::Tiered { two, .. } if high_count == 2 => (two, BonusLevel::Pair),
        ConsistencyBonus::Tiered { .. } => (1.0, BonusLevel::None),
    };

    Fused {
        weighted: clamp_percent(weighted),
        fused: clamp_percent(weighted * multiplier),
        high_count,
        bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::{fuse, BonusLevel, ConsistencyBonus, FusionConfig, FusionWeights};
    use crate::scorer::{MetricKind, MetricScore};
    use crate::util::ConfigError;

    fn scores(values: [f32; 4]) -> Vec<MetricScore> {
        MetricKind::ALL
            .iter()
            .zip(values)
            .map(|(&kind, v)| MetricScore::new(kind, v))
            .collect()
    }

    #[test]
    fn weights_must_sum_to_100() {
        assert!(FusionWeights::new(60.0, 25.0, 10.0, 5.0).is_ok());
        assert!(matches!(
            FusionWeights::new(60.0, 25.0, 10.0, 6.0),
            Err(ConfigError::WeightsSum { .. })
        ));
        assert!(matches!(
            FusionWeights::new(110.0, -10.0, 0.0, 0.0),
            Err(ConfigError::NegativeWeight { metric: "feature", .. })
        ));
        assert!(matches!(
            FusionWeights::new(f32::NAN, 25.0, 10.0, 5.0),
            Err(ConfigError::NonFiniteWeight { .. })
        ));
    }

    #[test]
    fn no_bonus_below_two_high_metrics() {
        let f = fuse(&scores([80.0, 50.0, 50.0, 50.0]), &FusionConfig::default());
        assert!((f.weighted - 68.0).abs() < 1e-4);
        assert_eq!(f.fused, f.weighted);
        assert_eq!(f.bonus, BonusLevel::None);
    }

    #[test]
    fn pair_bonus() {
        let f = fuse(&scores([80.0, 80.0, 50.0, 50.0]), &FusionConfig::default());
        assert_eq!(f.high_count, 2);
        assert_eq!(f.bonus, BonusLevel::Pair);
        assert!((f.weighted - 75.5).abs() < 1e-4);
        assert!((f.fused - 75.5 * 1.15).abs() < 1e-3);
    }

    #[test]
    fn majority_bonus_is_clamped() {
        let f = fuse(&scores([95.0, 90.0, 90.0, 10.0]), &FusionConfig::default());
        assert_eq!(f.bonus, BonusLevel::Majority);
        assert_eq!(f.fused, 100.0);
    }

    #[test]
    fn threshold_is_exclusive() {
        let f = fuse(&scores([70.0, 70.0, 70.0, 70.0]), &FusionConfig::default());
        assert_eq!(f.high_count, 0);
        assert!((f.fused - 70.0).abs() < 1e-4);
    }

    #[test]
    fn disabled_bonus_keeps_weighted_score() {
        let cfg = FusionConfig::new(FusionWeights::default(), 70.0, ConsistencyBonus::Disabled)
            .unwrap();
        let f = fuse(&scores([90.0, 90.0, 90.0, 90.0]), &cfg);
        assert_eq!(f.high_count, 4);
        assert_eq!(f.bonus, BonusLevel::None);
        assert!((f.fused - 90.0).abs() < 1e-4);
    }

    #[test]
    fn config_rejects_bad_threshold_and_multipliers() {
        let w = FusionWeights::default();
        assert_eq!(
            FusionConfig::new(w, 120.0, ConsistencyBonus::default()),
            Err(ConfigError::Threshold(120.0))
        );
        assert_eq!(
            FusionConfig::new(w, 70.0, ConsistencyBonus::Tiered { two: 0.9, three: 1.2 }),
            Err(ConfigError::BonusMultiplier(0.9))
        );
    }
}
