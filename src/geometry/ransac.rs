//! Seeded RANSAC over four-point homography hypotheses.

use super::Homography;
use crate::trace::{trace_event, trace_span};
use crate::util::ConfigError;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;

/// RANSAC parameters for geometric verification.
#[derive(Clone, Debug)]
pub struct RansacConfig {
    /// Maximum reprojection error, in working-resolution pixels, for an inlier.
    pub reprojection_threshold: f32,
    /// Number of random four-point hypotheses.
    pub iterations: usize,
    /// Verified correspondences below this count are all rejected.
    pub min_inliers: usize,
    /// Seed for hypothesis sampling.
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            reprojection_threshold: 3.0,
            iterations: 500,
            min_inliers: 8,
            seed: 0x5EED_CAFE,
        }
    }
}

impl RansacConfig {
    /// Rejects non-positive thresholds and zero iteration counts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.reprojection_threshold.is_finite() && self.reprojection_threshold > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "ransac.reprojection_threshold",
                reason: "must be finite and positive",
            });
        }
        if self.iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "ransac.iterations",
                reason: "must be at least 1",
            });
        }
        if self.min_inliers < 4 {
            return Err(ConfigError::InvalidParameter {
                name: "ransac.min_inliers",
                reason: "must be at least 4",
            });
        }
        Ok(())
    }
}

/// Best hypothesis found by [`ransac_homography`].
#[derive(Clone, Debug)]
pub struct RansacOutcome {
    /// The homography with the largest consensus set.
    pub model: Homography,
    /// One flag per input correspondence.
    pub inliers: Vec<bool>,
    /// Number of `true` flags in `inliers`.
    pub inlier_count: usize,
}

fn triangle_area2(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    ((b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)).abs()
}

/// Any three of the four points spanning less than one square pixel.
fn has_collinear_triple(pts: &[(f64, f64); 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES
        .iter()
        .any(|t| triangle_area2(pts[t[0]], pts[t[1]], pts[t[2]]) < 2.0)
}

fn count_inliers(
    model: &Homography,
    src: &[(f64, f64)],
    dst: &[(f64, f64)],
    threshold_sq: f64,
    flags: &mut [bool],
) -> usize {
    let mut count = 0;
    for ((s, d), flag) in src.iter().zip(dst.iter()).zip(flags.iter_mut()) {
        *flag = match model.apply(s.0, s.1) {
            Some((x, y)) => (x - d.0).powi(2) + (y - d.1).powi(2) <= threshold_sq,
            None => false,
        };
        count += usize::from(*flag);
    }
    count
}

/// Fits a homography mapping `src` onto `dst` with RANSAC.
///
/// Returns `None` when fewer than four correspondences are given or no
/// non-degenerate hypothesis was drawn. The sampler is seeded from `cfg.seed`,
/// so the outcome is a pure function of the inputs.
pub fn ransac_homography(
    src: &[(f64, f64)],
    dst: &[(f64, f64)],
    cfg: &RansacConfig,
) -> Option<RansacOutcome> {
    let n = src.len().min(dst.len());
    if n < 4 {
        return None;
    }
    let _span = trace_span!("ransac", correspondences = n).entered();

    let src = &src[..n];
    let dst = &dst[..n];
    let threshold_sq = f64::from(cfg.reprojection_threshold).powi(2);
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut best: Option<RansacOutcome> = None;
    let mut flags = vec![false; n];

    for _ in 0..cfg.iterations {
        let picked = sample(&mut rng, n, 4);
        let idx = [
            picked.index(0),
            picked.index(1),
            picked.index(2),
            picked.index(3),
        ];
        let s = idx.map(|i| src[i]);
        let d = idx.map(|i| dst[i]);
        if has_collinear_triple(&s) || has_collinear_triple(&d) {
            continue;
        }
        let Some(model) = Homography::from_four_points(&s, &d) else {
            continue;
        };

        let count = count_inliers(&model, src, dst, threshold_sq, &mut flags);
        if best.as_ref().map_or(true, |b| count > b.inlier_count) {
            best = Some(RansacOutcome {
                model,
                inliers: flags.clone(),
                inlier_count: count,
            });
            if count == n {
                break;
            }
        }
    }

    if let Some(outcome) = &best {
        trace_event!("ransac_result", inliers = outcome.inlier_count, total = n);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::{ransac_homography, RansacConfig};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn separates_outliers_from_a_translation() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut src = Vec::new();
        let mut dst = Vec::new();
        for _ in 0..40 {
            let p = (rng.random_range(0.0..200.0), rng.random_range(0.0..200.0));
            src.push(p);
            dst.push((p.0 + 5.0, p.1 - 7.0));
        }
        for _ in 0..20 {
            src.push((rng.random_range(0.0..200.0), rng.random_range(0.0..200.0)));
            dst.push((rng.random_range(0.0..200.0), rng.random_range(0.0..200.0)));
        }

        let outcome = ransac_homography(&src, &dst, &RansacConfig::default()).unwrap();
        assert!(outcome.inlier_count >= 40);
        assert!(outcome.inliers[..40].iter().all(|&f| f));
        let (x, y) = outcome.model.apply(100.0, 100.0).unwrap();
        assert!((x - 105.0).abs() < 1e-3 && (y - 93.0).abs() < 1e-3);
    }

    #[test]
    fn is_deterministic_for_a_seed() {
        let mut rng = StdRng::seed_from_u64(3);
        let src: Vec<(f64, f64)> = (0..30)
            .map(|_| (rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)))
            .collect();
        let dst: Vec<(f64, f64)> = (0..30)
            .map(|_| (rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)))
            .collect();
        let cfg = RansacConfig::default();
        let a = ransac_homography(&src, &dst, &cfg).unwrap();
        let b = ransac_homography(&src, &dst, &cfg).unwrap();
        assert_eq!(a.inliers, b.inliers);
        assert_eq!(a.model, b.model);
    }

    #[test]
    fn too_few_points() {
        let pts = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        assert!(ransac_homography(&pts, &pts, &RansacConfig::default()).is_none());
    }

    #[test]
    fn rejects_bad_config() {
        let cfg = RansacConfig {
            iterations: 0,
            ..RansacConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
