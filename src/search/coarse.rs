//! Exhaustive scan at the coarsest search level.

use crate::candidate::nms::nms_2d;
use crate::candidate::topk::Peak;
use crate::image::pyramid::ImagePyramid;
#[cfg(not(feature = "simd"))]
use crate::kernel::scalar::ZnccScalar as Zncc;
#[cfg(feature = "simd")]
use crate::kernel::simd::ZnccSimd as Zncc;
use crate::kernel::{Kernel, ScanParams};
use crate::search::SearchConfig;
use crate::template::ScaledTemplate;
use crate::trace::{trace_event, trace_span};
use crate::util::{MatchError, Result};

pub(crate) fn coarse_search_level(
    image: &ImagePyramid,
    template: &ScaledTemplate,
    level: usize,
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
    let _span = trace_span!("coarse_search", level = level).entered();

    let params = ScanParams {
        topk: cfg.coarse_topk.max(1),
        min_var_i: cfg.min_var_i,
        min_score: f32::NEG_INFINITY,
    };
    let mut peaks = scan_full(view, plan, params, cfg.parallel)?;
    if peaks.is_empty() {
        return Ok(Vec::new());
    }

    let mut kept = nms_2d(&mut peaks, cfg.nms_radius);
    kept.truncate(cfg.beam_width.max(1));
    trace_event!("coarse_candidates", count = kept.len());
    Ok(kept)
}

#[cfg(feature = "rayon")]
fn scan_full(
    view: crate::ImageView<'_, u8>,
    plan: &crate::template::TemplatePlan,
    params: ScanParams,
    parallel: bool,
) -> Result<Vec<Peak>> {
    if parallel {
        crate::kernel::rayon::zncc_scan_full_par::<Zncc>(view, plan, params)
    } else {
        <Zncc as Kernel>::scan_full(view, plan, params)
    }
}

#[cfg(not(feature = "rayon"))]
fn scan_full(
    view: crate::ImageView<'_, u8>,
    plan: &crate::template::TemplatePlan,
    params: ScanParams,
    _parallel: bool,
) -> Result<Vec<Peak>> {
    <Zncc as Kernel>::scan_full(view, plan, params)
}
