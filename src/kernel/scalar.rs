//! Scalar reference kernel for ZNCC evaluation.

use crate::kernel::Kernel;
use crate::template::TemplatePlan;
use crate::ImageView;

/// Scalar ZNCC kernel with `f64` accumulation.
pub struct ZnccScalar;

impl Kernel for ZnccScalar {
    fn score_at(
        image: ImageView<'_, u8>,
        tpl: &TemplatePlan,
        x: usize,
        y: usize,
        min_var_i: f64,
    ) -> f32 {
        let tpl_width = tpl.width();
        let tpl_height = tpl.height();
        if image.width() < tpl_width || image.height() < tpl_height {
            return f32::NEG_INFINITY;
        }
        if x > image.width() - tpl_width || y > image.height() - tpl_height {
            return f32::NEG_INFINITY;
        }

        let t_prime = tpl.zero_mean();
        let mut dot = 0.0f64;
        let mut sum_i = 0.0f64;
        let mut sum_i2 = 0.0f64;

        for ty in 0..tpl_height {
            let Some(img_row) = image.row(y + ty) else {
                return f32::NEG_INFINITY;
            };
            let window = &img_row[x..x + tpl_width];
            let t_row = &t_prime[ty * tpl_width..(ty + 1) * tpl_width];
            for (&t, &value) in t_row.iter().zip(window) {
                let v = f64::from(value);
                dot += f64::from(t) * v;
                sum_i += v;
                sum_i2 += v * v;
            }
        }

        let n = (tpl_width * tpl_height) as f64;
        let var_i = sum_i2 - (sum_i * sum_i) / n;
        if var_i <= min_var_i {
            return f32::NEG_INFINITY;
        }

        let score = dot / (tpl.var_t() * var_i).sqrt();
        if score.is_finite() {
            score as f32
        } else {
            f32::NEG_INFINITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ZnccScalar;
    use crate::kernel::{Kernel, ScanParams};
    use crate::template::TemplatePlan;
    use crate::ImageView;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pattern(width: usize, height: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(7);
        (0..width * height).map(|_| rng.random_range(0..=255)).collect()
    }

    #[test]
    fn self_correlation_is_one() {
        let data = pattern(16, 12);
        let view = ImageView::from_slice(&data, 16, 12).unwrap();
        let plan = TemplatePlan::from_view(view).unwrap();
        let score = ZnccScalar::score_at(view, &plan, 0, 0, 1e-8);
        assert!((score - 1.0).abs() < 1e-5, "{score}");
    }

    #[test]
    fn inverted_window_scores_minus_one() {
        let data = pattern(8, 8);
        let inverted: Vec<u8> = data.iter().map(|&v| 255 - v).collect();
        let tpl = ImageView::from_slice(&data, 8, 8).unwrap();
        let img = ImageView::from_slice(&inverted, 8, 8).unwrap();
        let plan = TemplatePlan::from_view(tpl).unwrap();
        let score = ZnccScalar::score_at(img, &plan, 0, 0, 1e-8);
        assert!((score + 1.0).abs() < 1e-5, "{score}");
    }

    #[test]
    fn scan_finds_embedded_patch() {
        let (w, h) = (40, 30);
        let image = pattern(w, h);
        let (x0, y0, tw, th) = (11, 7, 12, 10);
        let mut tpl = Vec::with_capacity(tw * th);
        for y in 0..th {
            tpl.extend_from_slice(&image[(y0 + y) * w + x0..(y0 + y) * w + x0 + tw]);
        }
        let view = ImageView::from_slice(&image, w, h).unwrap();
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, tw, th).unwrap()).unwrap();
        let params = ScanParams {
            topk: 3,
            min_var_i: 1e-8,
            min_score: f32::NEG_INFINITY,
        };
        let peaks = ZnccScalar::scan_full(view, &plan, params).unwrap();
        assert_eq!((peaks[0].x, peaks[0].y), (x0, y0));
        assert!(peaks[0].score > 0.999);
    }
}
