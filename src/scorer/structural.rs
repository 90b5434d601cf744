use super::{MetricKind, MetricScore, PreparedImage, Scorer};
use crate::image::ImageView;
use crate::trace::{trace_event, trace_span};
use crate::util::math::unit_to_percent;
use crate::util::{ConfigError, MatchError, Result};

const C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
const C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

/// SSIM window parameters.
#[derive(Clone, Debug)]
pub struct SsimConfig {
    /// Side of the square window in pixels.
    pub window: usize,
    /// Step between consecutive windows.
    pub stride: usize,
}

impl Default for SsimConfig {
    fn default() -> Self {
        Self {
            window: 7,
            stride: 1,
        }
    }
}

impl SsimConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.window < 2 {
            return Err(ConfigError::InvalidParameter {
                name: "ssim.window",
                reason: "must be at least 2",
            });
        }
        if self.stride == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "ssim.stride",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Summed-area table with one extra leading row and column of zeros.
struct Integral {
    sums: Vec<u64>,
    stride: usize,
}

impl Integral {
    fn build(width: usize, height: usize, value: impl Fn(usize, usize) -> u64) -> Self {
        let stride = width + 1;
        let mut sums = vec![0u64; stride * (height + 1)];
        for y in 0..height {
            let mut row_sum = 0u64;
            for x in 0..width {
                row_sum += value(x, y);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }
        Self { sums, stride }
    }

    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        let s = self.stride;
        let a = self.sums[y * s + x];
        let b = self.sums[y * s + x + w];
        let c = self.sums[(y + h) * s + x];
        let d = self.sums[(y + h) * s + x + w];
        (d + a - b - c) as f64
    }
}

/// Mean SSIM of two equally sized grayscale images.
///
/// Windows larger than the image shrink to the full frame.
pub fn mean_ssim(a: ImageView<'_, u8>, b: ImageView<'_, u8>, cfg: &SsimConfig) -> Result<f64> {
    if a.width() != b.width() || a.height() != b.height() {
        return Err(MatchError::InvalidDimensions {
            width: b.width(),
            height: b.height(),
        });
    }
    let (width, height) = (a.width(), a.height());
    let px = |img: &ImageView<'_, u8>, x: usize, y: usize| -> u64 {
        img.get(x, y).map_or(0, |&v| u64::from(v))
    };

    let sum_a = Integral::build(width, height, |x, y| px(&a, x, y));
    let sum_b = Integral::build(width, height, |x, y| px(&b, x, y));
    let sq_a = Integral::build(width, height, |x, y| px(&a, x, y).pow(2));
    let sq_b = Integral::build(width, height, |x, y| px(&b, x, y).pow(2));
    let cross = Integral::build(width, height, |x, y| px(&a, x, y) * px(&b, x, y));

    let win_w = cfg.window.min(width);
    let win_h = cfg.window.min(height);
    let n = (win_w * win_h) as f64;
    let stride = cfg.stride.max(1);

    let mut total = 0.0f64;
    let mut count = 0usize;
    for y in (0..=height - win_h).step_by(stride) {
        for x in (0..=width - win_w).step_by(stride) {
            let mu_a = sum_a.window(x, y, win_w, win_h) / n;
            let mu_b = sum_b.window(x, y, win_w, win_h) / n;
            let var_a = (sq_a.window(x, y, win_w, win_h) / n - mu_a * mu_a).max(0.0);
            let var_b = (sq_b.window(x, y, win_w, win_h) / n - mu_b * mu_b).max(0.0);
            let cov = cross.window(x, y, win_w, win_h) / n - mu_a * mu_b;

            let num = (2.0 * mu_a * mu_b + C1) * (2.0 * cov + C2);
            let den = (mu_a * mu_a + mu_b * mu_b + C1) * (var_a + var_b + C2);
            total += num / den;
            count += 1;
        }
    }

    Ok(if count == 0 { 0.0 } else { total / count as f64 })
}

/// Mean SSIM between the working grayscale buffers.
#[derive(Clone, Debug, Default)]
pub struct StructuralScorer {
    cfg: SsimConfig,
}

impl StructuralScorer {
    pub fn new(cfg: SsimConfig) -> Self {
        Self { cfg }
    }
}

impl Scorer for StructuralScorer {
    fn kind(&self) -> MetricKind {
        MetricKind::Structural
    }

    fn score(&self, reference: &PreparedImage, candidate: &PreparedImage) -> Result<MetricScore> {
        let _span = trace_span!("structural_score").entered();
        let ssim = mean_ssim(
            reference.normalized().gray().view(),
            candidate.normalized().gray().view(),
            &self.cfg,
        )?;
        let value = unit_to_percent(ssim);
        trace_event!("metric", kind = "structural", value = value);
        Ok(MetricScore::new(MetricKind::Structural, value))
    }
}
