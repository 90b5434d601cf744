//! Rayon-parallel scans (feature-gated).
//!
//! Rows of placements are distributed over the rayon pool; each row keeps
//! its own Top-K and the partial collectors are merged afterwards. Because
//! `TopK` orders by (score, y, x), the merged result does not depend on the
//! order in which rows finish.

use crate::candidate::topk::{Peak, TopK};
use crate::kernel::{placement_range, Kernel, ScanParams};
use crate::template::TemplatePlan;
use crate::util::Result;
use crate::ImageView;
use rayon::prelude::*;

/// Row-parallel full scan for any ZNCC kernel.
pub fn zncc_scan_full_par<K: Kernel>(
    image: ImageView<'_, u8>,
    tpl: &TemplatePlan,
    params: ScanParams,
) -> Result<Vec<Peak>> {
    if params.topk == 0 {
        return Ok(Vec::new());
    }
    let (max_x, max_y) = placement_range(image, tpl)?;

    let merged = (0..=max_y)
        .into_par_iter()
        .map(|y| {
            let mut row_topk = TopK::new(params.topk);
            for x in 0..=max_x {
                let score = K::score_at(image, tpl, x, y, params.min_var_i);
                if score.is_finite() && score >= params.min_score {
                    row_topk.push(Peak { x, y, score });
                }
            }
            row_topk
        })
        .reduce(
            || TopK::new(params.topk),
            |mut acc, row| {
                acc.merge(row);
                acc
            },
        );

    Ok(merged.into_sorted_desc())
}
