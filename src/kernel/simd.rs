//! SIMD-accelerated ZNCC kernel using the `wide` crate.
//!
//! The inner template row loop is vectorized to process 8 pixels at a time
//! using `f32x8`; per-row partial sums are folded into `f64` so that full
//! working-resolution windows keep the precision of the scalar kernel.

use crate::kernel::Kernel;
use crate::template::TemplatePlan;
use crate::ImageView;
use wide::f32x8;

const LANES: usize = 8;

#[inline]
fn load_u8x8_as_f32x8(slice: &[u8]) -> f32x8 {
    f32x8::from([
        slice[0] as f32,
        slice[1] as f32,
        slice[2] as f32,
        slice[3] as f32,
        slice[4] as f32,
        slice[5] as f32,
        slice[6] as f32,
        slice[7] as f32,
    ])
}

#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

#[inline]
fn hsum(v: f32x8) -> f64 {
    v.to_array().iter().map(|&x| f64::from(x)).sum()
}

/// SIMD-accelerated ZNCC kernel.
pub struct ZnccSimd;

impl Kernel for ZnccSimd {
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
        let simd_end = tpl_width / LANES * LANES;

        let mut dot = 0.0f64;
        let mut sum_i = 0.0f64;
        let mut sum_i2 = 0.0f64;

        for ty in 0..tpl_height {
            let Some(img_row) = image.row(y + ty) else {
                return f32::NEG_INFINITY;
            };
            let base = ty * tpl_width;

            let mut dot_vec = f32x8::ZERO;
            let mut sum_i_vec = f32x8::ZERO;
            let mut sum_i2_vec = f32x8::ZERO;
            let mut tx = 0;
            while tx < simd_end {
                let img_vals = load_u8x8_as_f32x8(&img_row[x + tx..]);
                let tpl_vals = load_f32x8(&t_prime[base + tx..]);
                dot_vec += tpl_vals * img_vals;
                sum_i_vec += img_vals;
                sum_i2_vec += img_vals * img_vals;
                tx += LANES;
            }
            dot += hsum(dot_vec);
            sum_i += hsum(sum_i_vec);
            sum_i2 += hsum(sum_i2_vec);

            while tx < tpl_width {
                let value = f64::from(img_row[x + tx]);
                dot += f64::from(t_prime[base + tx]) * value;
                sum_i += value;
                sum_i2 += value * value;
                tx += 1;
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
