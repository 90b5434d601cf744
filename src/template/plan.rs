//! Template plan precomputation for ZNCC.

use crate::image::ImageView;
use crate::util::{MatchError, Result};

/// Precomputed statistics and zero-mean buffer for ZNCC scoring.
///
/// With `t' = t - mean(t)` and `var_t = sum(t'^2)`, the correlation at a
/// placement is `sum(t' * i) / sqrt(var_t * var_i)` where
/// `var_i = sum(i^2) - sum(i)^2 / n` over the covered image window.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f32,
    var_t: f64,
    zero_mean: Vec<f32>,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    ///
    /// Returns `DegenerateTemplate` when the template is flat, since ZNCC is
    /// undefined for a zero-variance template.
    pub fn from_view(tpl: ImageView<'_, u8>) -> Result<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(MatchError::InvalidDimensions { width, height })?;

        let mut sum = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(MatchError::BufferTooSmall {
                needed: (y + 1) * tpl.stride(),
                got: tpl.as_slice().len(),
            })?;
            sum += row.iter().map(|&v| f64::from(v)).sum::<f64>();
        }
        let mean = sum / count as f64;

        let mut zero_mean = Vec::with_capacity(count);
        let mut var_t = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(MatchError::BufferTooSmall {
                needed: (y + 1) * tpl.stride(),
                got: tpl.as_slice().len(),
            })?;
            for &value in row {
                let centered = f64::from(value) - mean;
                var_t += centered * centered;
                zero_mean.push(centered as f32);
            }
        }

        if var_t / (count as f64) <= 1e-8 {
            return Err(MatchError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        Ok(Self {
            width,
            height,
            mean: mean as f32,
            var_t,
            zero_mean,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the mean intensity of the template.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Returns `sum((t - mean)^2)`.
    pub fn var_t(&self) -> f64 {
        self.var_t
    }

    /// Returns the zero-mean template buffer in row-major order.
    pub fn zero_mean(&self) -> &[f32] {
        &self.zero_mean
    }
}
