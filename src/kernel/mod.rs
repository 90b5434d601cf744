//! ZNCC kernel implementations.

use crate::candidate::topk::Peak;
use crate::template::TemplatePlan;
use crate::util::{MatchError, Result};
use crate::ImageView;

/// Scan configuration for kernel evaluations.
#[derive(Clone, Copy, Debug)]
pub struct ScanParams {
    /// Maximum number of peaks to retain.
    pub topk: usize,
    /// Minimum variance of the image window; flatter windows are skipped.
    pub min_var_i: f64,
    /// Minimum score threshold (discard below this value).
    pub min_score: f32,
}

/// Kernel trait for scoring and scan operations.
pub trait Kernel {
    /// Computes the ZNCC score at a single placement (top-left coordinates).
    ///
    /// Returns `f32::NEG_INFINITY` for out-of-range placements and windows
    /// whose variance is at or below `min_var_i`.
    fn score_at(image: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize, min_var_i: f64)
        -> f32;

    /// Scans the full valid placement range and returns top-K peaks.
    fn scan_full(
        image: ImageView<'_, u8>,
        plan: &TemplatePlan,
        params: ScanParams,
    ) -> Result<Vec<Peak>> {
        let (max_x, max_y) = placement_range(image, plan)?;
        Self::scan_roi(image, plan, 0, 0, max_x, max_y, params)
    }

    /// Scans an inclusive ROI of placement coordinates and returns top-K peaks.
    #[allow(clippy::too_many_arguments)]
    fn scan_roi(
        image: ImageView<'_, u8>,
        plan: &TemplatePlan,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        params: ScanParams,
    ) -> Result<Vec<Peak>> {
        let (max_x, max_y) = placement_range(image, plan)?;
        if params.topk == 0 || x0 > max_x || y0 > max_y {
            return Ok(Vec::new());
        }
        let x1 = x1.min(max_x);
        let y1 = y1.min(max_y);
        if x0 > x1 || y0 > y1 {
            return Ok(Vec::new());
        }

        let mut topk = crate::candidate::topk::TopK::new(params.topk);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let score = Self::score_at(image, plan, x, y, params.min_var_i);
                if score.is_finite() && score >= params.min_score {
                    topk.push(Peak { x, y, score });
                }
            }
        }
        Ok(topk.into_sorted_desc())
    }
}

/// Returns the largest valid top-left placement for `plan` inside `image`.
pub(crate) fn placement_range(image: ImageView<'_, u8>, plan: &TemplatePlan) -> Result<(usize, usize)> {
    let img_width = image.width();
    let img_height = image.height();
    if img_width < plan.width() || img_height < plan.height() {
        return Err(MatchError::RoiOutOfBounds {
            x: 0,
            y: 0,
            width: plan.width(),
            height: plan.height(),
            img_width,
            img_height,
        });
    }
    Ok((img_width - plan.width(), img_height - plan.height()))
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;
