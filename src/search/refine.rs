//! Refinement of coarse candidates at finer pyramid levels.

use crate::candidate::topk::{sort_peaks_desc, Peak};
use crate::image::pyramid::ImagePyramid;
#[cfg(not(feature = "simd"))]
use crate::kernel::scalar::ZnccScalar as Zncc;
#[cfg(feature = "simd")]
use crate::kernel::simd::ZnccSimd as Zncc;
use crate::kernel::{placement_range, Kernel, ScanParams};
use crate::search::SearchConfig;
use crate::template::ScaledTemplate;
use crate::util::{MatchError, Result};

fn roi_bounds(
    x: usize,
    y: usize,
    radius: usize,
    max_x: usize,
    max_y: usize,
) -> Option<(usize, usize, usize, usize)> {
    let x0 = x.saturating_sub(radius).min(max_x);
    let y0 = y.saturating_sub(radius).min(max_y);
    let x1 = x.saturating_add(radius).min(max_x);
    let y1 = y.saturating_add(radius).min(max_y);
    (x0 <= x1 && y0 <= y1).then_some((x0, y0, x1, y1))
}

/// Upscales each candidate to `level` and keeps the best placement near it.
pub(crate) fn refine_to_finer_level(
    image: &ImagePyramid,
    template: &ScaledTemplate,
    level: usize,
    candidates: &[Peak],
    cfg: &SearchConfig,
) -> Result<Vec<Peak>> {
    let view = image.level(level).ok_or(MatchError::IndexOutOfBounds {
        index: level,
        len: image.len(),
        context: "image level",
    })?;
    let plan = template.plan(level).ok_or(MatchError::IndexOutOfBounds {
        index: level,
        len: template.num_levels(),
        context: "template level",
    })?;
    let (max_x, max_y) = placement_range(view, plan)?;
    let params = ScanParams {
        topk: 1,
        min_var_i: cfg.min_var_i,
        min_score: f32::NEG_INFINITY,
    };

    let mut refined: Vec<Peak> = Vec::with_capacity(candidates.len());
    for cand in candidates {
        let (ux, uy) = (cand.x.saturating_mul(2), cand.y.saturating_mul(2));
        let Some((x0, y0, x1, y1)) = roi_bounds(ux, uy, cfg.roi_radius, max_x, max_y) else {
            continue;
        };
        let peaks = <Zncc as Kernel>::scan_roi(view, plan, x0, y0, x1, y1, params)?;
        if let Some(best) = peaks.first() {
            if !refined.iter().any(|p| p.x == best.x && p.y == best.y) {
                refined.push(*best);
            }
        }
    }

    sort_peaks_desc(&mut refined);
    Ok(refined)
}
