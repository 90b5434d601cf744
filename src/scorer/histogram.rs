use super::{MetricKind, MetricScore, PreparedImage, Scorer};
use crate::image::color::hsv;
use crate::image::RgbBuffer;
use crate::trace::{trace_event, trace_span};
use crate::util::math::unit_to_percent;
use crate::util::{ConfigError, Result};

/// Hue/saturation binning plus a value row for achromatic pixels.
#[derive(Clone, Debug)]
pub struct HistogramConfig {
    /// Bins over hue `[0, 360)`.
    pub hue_bins: usize,
    /// Bins over saturation `[0, 1]`.
    pub saturation_bins: usize,
    /// Bins over value `[0, 1]` for pixels in the lowest saturation bin.
    pub value_bins: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            hue_bins: 30,
            saturation_bins: 32,
            value_bins: 16,
        }
    }
}

impl HistogramConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.hue_bins == 0 || self.saturation_bins == 0 || self.value_bins == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "histogram.bins",
                reason: "hue, saturation and value bin counts must be at least 1",
            });
        }
        Ok(())
    }
}

/// A hue x saturation histogram of pixel counts followed by a gray row.
///
/// Pixels whose saturation falls in the lowest bin carry no usable hue; they
/// are counted by value in the trailing `value_bins` entries instead, so two
/// black-and-white images still differ by their tones.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorHistogram {
    bins: Vec<u32>,
    hue_bins: usize,
    saturation_bins: usize,
    value_bins: usize,
}

impl ColorHistogram {
    /// Bins every pixel of `rgb`.
    pub fn from_rgb(rgb: &RgbBuffer, cfg: &HistogramConfig) -> Self {
        let hue_bins = cfg.hue_bins.max(1);
        let saturation_bins = cfg.saturation_bins.max(1);
        let value_bins = cfg.value_bins.max(1);
        let chromatic = hue_bins * saturation_bins;
        let mut bins = vec![0u32; chromatic + value_bins];
        for [r, g, b] in rgb.pixels() {
            let (hue, sat, value) = hsv(r, g, b);
            let s = ((sat * saturation_bins as f32) as usize).min(saturation_bins - 1);
            let idx = if s == 0 {
                chromatic + ((value * value_bins as f32) as usize).min(value_bins - 1)
            } else {
                let h = ((hue / 360.0 * hue_bins as f32) as usize).min(hue_bins - 1);
                h * saturation_bins + s
            };
            bins[idx] += 1;
        }
        Self {
            bins,
            hue_bins,
            saturation_bins,
            value_bins,
        }
    }

    /// Returns the counts: hue-major chromatic bins, then the gray row.
    pub fn bins(&self) -> &[u32] {
        &self.bins
    }

    /// Returns the gray row.
    pub fn gray_bins(&self) -> &[u32] {
        &self.bins[self.hue_bins * self.saturation_bins..]
    }

    /// Returns `(hue_bins, saturation_bins, value_bins)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.hue_bins, self.saturation_bins, self.value_bins)
    }

    /// Pearson correlation of the bin counts.
    ///
    /// Histograms of different shape correlate at 0. Two constant histograms
    /// correlate at 1 when equal and 0 otherwise.
    pub fn correlation(&self, other: &ColorHistogram) -> f64 {
        if self.shape() != other.shape() || self.bins.is_empty() {
            return 0.0;
        }
        let n = self.bins.len() as f64;
        let mean_a = self.bins.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let mean_b = other.bins.iter().map(|&v| f64::from(v)).sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;
        for (&a, &b) in self.bins.iter().zip(other.bins.iter()) {
            let da = f64::from(a) - mean_a;
            let db = f64::from(b) - mean_b;
            cov += da * db;
            var_a += da * da;
            var_b += db * db;
        }

        if var_a == 0.0 || var_b == 0.0 {
            return if var_a == 0.0 && var_b == 0.0 && self.bins == other.bins {
                1.0
            } else {
                0.0
            };
        }
        cov / (var_a * var_b).sqrt()
    }
}

/// Colour-distribution similarity, robust to geometry.
#[derive(Clone, Debug, Default)]
pub struct HistogramScorer;

impl Scorer for HistogramScorer {
    fn kind(&self) -> MetricKind {
        MetricKind::Histogram
    }

    fn score(&self, reference: &PreparedImage, candidate: &PreparedImage) -> Result<MetricScore> {
        let _span = trace_span!("histogram_score").entered();
        let value = unit_to_percent(reference.histogram().correlation(candidate.histogram()));
        trace_event!("metric", kind = "histogram", value = value);
        Ok(MetricScore::new(MetricKind::Histogram, value))
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorHistogram, HistogramConfig};
    use crate::image::RgbBuffer;
    use crate::util::math::unit_to_percent;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn solid(rgb: [u8; 3], n: usize) -> RgbBuffer {
        RgbBuffer::new(rgb.repeat(n), n, 1).unwrap()
    }

    fn two_tone(a: [u8; 3], b: [u8; 3], n: usize) -> RgbBuffer {
        let mut data = a.repeat(n);
        data.extend(b.repeat(n));
        RgbBuffer::new(data, n, 2).unwrap()
    }

    #[test]
    fn identical_distributions_correlate_fully() {
        let cfg = HistogramConfig::default();
        let a = ColorHistogram::from_rgb(&two_tone([200, 30, 30], [30, 30, 200], 16), &cfg);
        let b = ColorHistogram::from_rgb(&two_tone([30, 30, 200], [200, 30, 30], 16), &cfg);
        assert!((a.correlation(&b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn disjoint_colours_correlate_below_zero() {
        let cfg = HistogramConfig::default();
        let red = ColorHistogram::from_rgb(&solid([220, 20, 20], 32), &cfg);
        let blue = ColorHistogram::from_rgb(&solid([20, 20, 220], 32), &cfg);
        assert!(red.correlation(&blue) < 0.0);
    }

    #[test]
    fn correlation_ignores_pixel_count() {
        let cfg = HistogramConfig {
            hue_bins: 1,
            saturation_bins: 2,
            value_bins: 1,
        };
        let a = ColorHistogram::from_rgb(&solid([10, 200, 10], 8), &cfg);
        let b = ColorHistogram::from_rgb(&solid([200, 10, 10], 9), &cfg);
        assert_eq!(a.bins(), &[0, 8, 0]);
        assert!((a.correlation(&b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bins_cover_every_pixel() {
        let cfg = HistogramConfig::default();
        let h = ColorHistogram::from_rgb(&two_tone([255, 255, 255], [0, 0, 0], 10), &cfg);
        assert_eq!(h.bins().iter().sum::<u32>(), 20);
        assert_eq!(h.shape(), (30, 32, 16));
        assert_eq!(h.gray_bins()[0], 10);
        assert_eq!(h.gray_bins()[15], 10);
    }

    #[test]
    fn gray_texture_and_black_frame_differ() {
        let cfg = HistogramConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let side = 64;
        let texture: Vec<u8> = (0..side * side)
            .flat_map(|_| {
                let v = rng.random_range(40..=220u8);
                [v, v, v]
            })
            .collect();
        let gray = ColorHistogram::from_rgb(&RgbBuffer::new(texture, side, side).unwrap(), &cfg);
        let black = ColorHistogram::from_rgb(&solid([0, 0, 0], side * side), &cfg);

        let score = unit_to_percent(gray.correlation(&black));
        assert!(score < 100.0, "{score}");
        assert!(score < 50.0, "{score}");
        assert!((gray.correlation(&gray) - 1.0).abs() < 1e-12);
    }
}
